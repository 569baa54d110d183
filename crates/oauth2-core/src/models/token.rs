use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Claim, ClaimsPrincipal, Client, Scope, SUBJECT_CLAIM_TYPE};

/// Claim type listing a granted scope inside an access token.
pub const SCOPE_CLAIM_TYPE: &str = "scope";

/// Token kinds sharing the `tokens` table, discriminated by `token_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum TokenType {
    AuthorizationCode = 1,
    TokenHandle = 2,
    RefreshToken = 3,
}

/// How a token kind writes its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Every store is a fresh key; a duplicate key is an error.
    InsertOnly,
    /// The key is reused across renewals; an existing row only has its expiry moved.
    RenewExpiry,
}

impl TokenType {
    pub const fn as_i16(self) -> i16 {
        self as i16
    }

    pub const fn write_policy(self) -> WritePolicy {
        match self {
            Self::AuthorizationCode | Self::TokenHandle => WritePolicy::InsertOnly,
            Self::RefreshToken => WritePolicy::RenewExpiry,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::TokenHandle => "token_handle",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl TryFrom<i16> for TokenType {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::AuthorizationCode),
            2 => Ok(Self::TokenHandle),
            3 => Ok(Self::RefreshToken),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing view shared by every persisted token payload.
pub trait TokenMetadata {
    fn subject_id(&self) -> &str;
    fn client_id(&self) -> &str;
    fn client(&self) -> &Client;
    fn scopes(&self) -> Vec<String>;
}

/// A short-lived, single-use credential exchanged for tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub creation_time: DateTime<Utc>,
    pub client: Client,
    pub subject: ClaimsPrincipal,
    pub is_open_id: bool,
    pub requested_scopes: Vec<Scope>,
    pub redirect_uri: String,
    pub nonce: Option<String>,
    pub was_consent_shown: bool,
    pub session_id: Option<String>,
}

impl AuthorizationCode {
    pub fn new(
        client: Client,
        subject: ClaimsPrincipal,
        requested_scopes: Vec<Scope>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            creation_time: Utc::now(),
            client,
            subject,
            is_open_id: false,
            requested_scopes,
            redirect_uri: redirect_uri.into(),
            nonce: None,
            was_consent_shown: false,
            session_id: None,
        }
    }
}

impl TokenMetadata for AuthorizationCode {
    fn subject_id(&self) -> &str {
        self.subject.subject_id()
    }

    fn client_id(&self) -> &str {
        &self.client.client_id
    }

    fn client(&self) -> &Client {
        &self.client
    }

    fn scopes(&self) -> Vec<String> {
        self.requested_scopes.iter().map(|s| s.name.clone()).collect()
    }
}

/// A server-held access token, persisted by the token-handle store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub audience: String,
    pub issuer: String,
    pub creation_time: DateTime<Utc>,
    /// Seconds.
    pub lifetime: i32,
    pub token_type: String,
    pub client: Client,
    pub claims: Vec<Claim>,
    pub version: i32,
}

impl AccessToken {
    pub fn new(client: Client, claims: Vec<Claim>, lifetime: i32) -> Self {
        Self {
            audience: String::new(),
            issuer: String::new(),
            creation_time: Utc::now(),
            lifetime,
            token_type: "access_token".to_string(),
            client,
            claims,
            version: 1,
        }
    }
}

impl TokenMetadata for AccessToken {
    fn subject_id(&self) -> &str {
        self.claims
            .iter()
            .find(|c| c.claim_type == SUBJECT_CLAIM_TYPE)
            .map(|c| c.value.as_str())
            .unwrap_or_default()
    }

    fn client_id(&self) -> &str {
        &self.client.client_id
    }

    fn client(&self) -> &Client {
        &self.client
    }

    fn scopes(&self) -> Vec<String> {
        self.claims
            .iter()
            .filter(|c| c.claim_type == SCOPE_CLAIM_TYPE)
            .map(|c| c.value.clone())
            .collect()
    }
}

/// A long-lived credential tied to the access token it was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub creation_time: DateTime<Utc>,
    /// Seconds.
    pub lifetime: i32,
    pub access_token: AccessToken,
    pub version: i32,
}

impl RefreshToken {
    pub fn new(access_token: AccessToken, lifetime: i32) -> Self {
        Self {
            creation_time: Utc::now(),
            lifetime,
            access_token,
            version: 1,
        }
    }
}

impl TokenMetadata for RefreshToken {
    fn subject_id(&self) -> &str {
        self.access_token.subject_id()
    }

    fn client_id(&self) -> &str {
        self.access_token.client_id()
    }

    fn client(&self) -> &Client {
        self.access_token.client()
    }

    fn scopes(&self) -> Vec<String> {
        self.access_token.scopes()
    }
}
