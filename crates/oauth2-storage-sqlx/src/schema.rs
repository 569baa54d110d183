use std::fmt;

use oauth2_core::{StoreError, StoreResult};

/// PostgreSQL namespace the store tables live in.
///
/// The name is interpolated into statements, so it must be a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema(String);

impl Schema {
    pub const DEFAULT: &'static str = "public";

    // NAMEDATALEN - 1
    const MAX_IDENTIFIER_LEN: usize = 63;

    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(StoreError::configuration("schema name should not be blank"));
        }
        if name.len() > Self::MAX_IDENTIFIER_LEN {
            return Err(StoreError::configuration(format!(
                "schema name must not exceed {} characters",
                Self::MAX_IDENTIFIER_LEN
            )));
        }

        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !(valid_start && valid_rest) {
            return Err(StoreError::configuration(format!(
                "schema name '{name}' is not a plain identifier"
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Schema-qualified table name.
    pub fn table(&self, table: &str) -> String {
        format!("{}.{}", self.0, table)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Schema {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
