use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Claim;

/// Protocol flow a client is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Flow {
    AuthorizationCode,
    #[default]
    Implicit,
    Hybrid,
    ClientCredentials,
    ResourceOwner,
    Custom,
}

/// Whether a refresh token handle stays the same when it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenUsage {
    ReUse,
    #[default]
    OneTimeOnly,
}

/// How the lifetime of a refresh token is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenExpiration {
    Sliding,
    #[default]
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessTokenType {
    #[default]
    Jwt,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecret {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub secret_type: Option<String>,
}

impl ClientSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
            expiration: None,
            secret_type: None,
        }
    }
}

/// A registered relying party and its full configuration.
///
/// Lifetimes are expressed in seconds. `client_id` is the storage key and is
/// never changed once the client has been added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    pub client_id: String,
    pub enabled: bool,
    pub client_secrets: Vec<ClientSecret>,
    pub client_name: Option<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub require_consent: bool,
    pub allow_remember_consent: bool,
    pub flow: Flow,
    pub allow_client_credentials_only: bool,
    pub redirect_uris: Vec<String>,
    pub post_logout_redirect_uris: Vec<String>,
    pub scope_restrictions: Vec<String>,
    pub identity_token_lifetime: i32,
    pub access_token_lifetime: i32,
    pub authorization_code_lifetime: i32,
    pub absolute_refresh_token_lifetime: i32,
    pub sliding_refresh_token_lifetime: i32,
    pub refresh_token_usage: TokenUsage,
    pub update_access_token_claims_on_refresh: bool,
    pub refresh_token_expiration: TokenExpiration,
    pub access_token_type: AccessTokenType,
    pub enable_local_login: bool,
    pub identity_provider_restrictions: Vec<String>,
    pub include_jwt_id: bool,
    pub claims: Vec<Claim>,
    pub always_send_client_claims: bool,
    pub prefix_client_claims: bool,
    pub custom_grant_type_restrictions: Vec<String>,
    pub allowed_cors_origins: Vec<String>,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            enabled: true,
            client_secrets: Vec::new(),
            client_name: None,
            client_uri: None,
            logo_uri: None,
            require_consent: true,
            allow_remember_consent: true,
            flow: Flow::default(),
            allow_client_credentials_only: false,
            redirect_uris: Vec::new(),
            post_logout_redirect_uris: Vec::new(),
            scope_restrictions: Vec::new(),
            identity_token_lifetime: 300,
            access_token_lifetime: 3600,
            authorization_code_lifetime: 300,
            absolute_refresh_token_lifetime: 2_592_000,
            sliding_refresh_token_lifetime: 1_296_000,
            refresh_token_usage: TokenUsage::default(),
            update_access_token_claims_on_refresh: false,
            refresh_token_expiration: TokenExpiration::default(),
            access_token_type: AccessTokenType::default(),
            enable_local_login: true,
            identity_provider_restrictions: Vec::new(),
            include_jwt_id: false,
            claims: Vec::new(),
            always_send_client_claims: false,
            prefix_client_claims: true,
            custom_grant_type_restrictions: Vec::new(),
            allowed_cors_origins: Vec::new(),
        }
    }
}

impl Client {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }
}
