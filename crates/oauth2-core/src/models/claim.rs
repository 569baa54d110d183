use serde::{Deserialize, Serialize};

/// Value type used when a claim does not declare one.
pub const CLAIM_VALUE_TYPE_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Claim type carrying the subject identifier.
pub const SUBJECT_CLAIM_TYPE: &str = "sub";

fn default_value_type() -> String {
    CLAIM_VALUE_TYPE_STRING.to_string()
}

/// A typed name/value assertion about a subject or client.
///
/// Serialized as `{"type", "value", "valueType"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
    #[serde(default = "default_value_type")]
    pub value_type: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: default_value_type(),
        }
    }
}

/// An authenticated identity: the authentication type plus its claims.
///
/// Serialized as `{"authenticationType", "claims"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsPrincipal {
    #[serde(default)]
    pub authentication_type: Option<String>,
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    pub fn new(authentication_type: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            claims,
        }
    }

    /// First claim value of the given type.
    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// Value of the `sub` claim, or an empty string when absent.
    pub fn subject_id(&self) -> &str {
        self.find_first(SUBJECT_CLAIM_TYPE).unwrap_or_default()
    }
}
