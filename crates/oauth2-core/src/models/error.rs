/// Errors surfaced by every store operation.
///
/// "Not found" is never an error: lookups return `None` or an empty `Vec`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An argument failed a precondition; raised before any I/O.
    #[error("Invalid argument `{name}`: {message}")]
    Validation { name: String, message: String },

    /// Driver or constraint error, passed through untranslated.
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document references a client or scope that no longer exists.
    #[error("Dangling {kind} reference: {id}")]
    DanglingReference { kind: ReferenceKind, id: String },

    /// Invalid store configuration (schema name, connection settings).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// What an embedded reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Client,
    Scope,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Scope => f.write_str("scope"),
        }
    }
}

impl StoreError {
    #[must_use]
    pub fn validation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn dangling(kind: ReferenceKind, id: impl Into<String>) -> Self {
        Self::DanglingReference {
            kind,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub fn is_dangling_reference(&self) -> bool {
        matches!(self, Self::DanglingReference { .. })
    }

    /// Returns `true` for a primary-key / unique-constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            // Postgres unique violation: 23505
            #[cfg(feature = "sqlx")]
            Self::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_unique_violation()
                    || db_err.code().as_deref() == Some("23505")
                    || db_err.message().contains("duplicate key")
            }
            _ => false,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
