use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScopeType {
    Identity,
    #[default]
    Resource,
}

/// A claim emitted when the owning scope is granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeClaim {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub always_include_in_id_token: bool,
}

impl ScopeClaim {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            always_include_in_id_token: false,
        }
    }
}

/// A named permission or resource grouping requestable by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scope {
    pub name: String,
    pub enabled: bool,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub emphasize: bool,
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub claims: Vec<ScopeClaim>,
    pub include_all_claims_for_user: bool,
    pub claims_rule: Option<String>,
    /// Listed in the discovery document; persisted as the `is_public` column.
    pub show_in_discovery_document: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            display_name: None,
            description: None,
            required: false,
            emphasize: false,
            scope_type: ScopeType::default(),
            claims: Vec::new(),
            include_all_claims_for_user: false,
            claims_rule: None,
            show_in_discovery_document: true,
        }
    }
}

impl Scope {
    pub fn new(name: impl Into<String>, scope_type: ScopeType) -> Self {
        Self {
            name: name.into(),
            scope_type,
            ..Self::default()
        }
    }

    pub fn with_claims(mut self, claims: Vec<ScopeClaim>) -> Self {
        self.claims = claims;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show_in_discovery_document = false;
        self
    }
}
