use serde::{Deserialize, Serialize};

/// A subject's standing approval for a client to use a set of scopes.
///
/// At most one consent exists per `(subject, client_id)`; scope order is
/// irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    pub subject: String,
    pub client_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Consent {
    pub fn new(
        subject: impl Into<String>,
        client_id: impl Into<String>,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            client_id: client_id.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}
