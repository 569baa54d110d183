//! Stored document shapes for each token payload.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use oauth2_core::{
    AccessToken, AuthorizationCode, Claim, ClaimsPrincipal, Client, RefreshToken, Scope,
    StoreResult, TokenType,
};

use super::{References, Resolved, TokenPayload};

/// Stored stand-in for an embedded [`Client`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRef {
    pub client_id: String,
}

impl From<&Client> for ClientRef {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id.clone(),
        }
    }
}

/// Stored stand-in for an embedded [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRef {
    pub name: String,
}

impl From<&Scope> for ScopeRef {
    fn from(scope: &Scope) -> Self {
        Self {
            name: scope.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodeDocument {
    pub creation_time: DateTime<Utc>,
    pub client: ClientRef,
    pub subject: ClaimsPrincipal,
    #[serde(default)]
    pub is_open_id: bool,
    #[serde(default)]
    pub requested_scopes: Vec<ScopeRef>,
    pub redirect_uri: String,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub was_consent_shown: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenDocument {
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub issuer: String,
    pub creation_time: DateTime<Utc>,
    pub lifetime: i32,
    #[serde(rename = "type")]
    pub token_type: String,
    pub client: ClientRef,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenDocument {
    pub creation_time: DateTime<Utc>,
    pub lifetime: i32,
    pub access_token: AccessTokenDocument,
    #[serde(default)]
    pub version: i32,
}

impl TokenPayload for AuthorizationCode {
    const KIND: TokenType = TokenType::AuthorizationCode;
    type Document = AuthorizationCodeDocument;

    // Codes live as long as the issuing client allows.
    fn lifetime(&self) -> Duration {
        Duration::seconds(i64::from(self.client.authorization_code_lifetime))
    }

    fn to_document(&self) -> Self::Document {
        AuthorizationCodeDocument {
            creation_time: self.creation_time,
            client: ClientRef::from(&self.client),
            subject: self.subject.clone(),
            is_open_id: self.is_open_id,
            requested_scopes: self.requested_scopes.iter().map(ScopeRef::from).collect(),
            redirect_uri: self.redirect_uri.clone(),
            nonce: self.nonce.clone(),
            was_consent_shown: self.was_consent_shown,
            session_id: self.session_id.clone(),
        }
    }

    fn collect_references(document: &Self::Document, references: &mut References) {
        references.client(&document.client);
        for scope in &document.requested_scopes {
            references.scope(scope);
        }
    }

    fn from_document(document: Self::Document, resolved: &Resolved) -> StoreResult<Self> {
        let requested_scopes = document
            .requested_scopes
            .iter()
            .map(|scope| resolved.scope(scope))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self {
            creation_time: document.creation_time,
            client: resolved.client(&document.client)?,
            subject: document.subject,
            is_open_id: document.is_open_id,
            requested_scopes,
            redirect_uri: document.redirect_uri,
            nonce: document.nonce,
            was_consent_shown: document.was_consent_shown,
            session_id: document.session_id,
        })
    }
}

impl TokenPayload for AccessToken {
    const KIND: TokenType = TokenType::TokenHandle;
    type Document = AccessTokenDocument;

    fn lifetime(&self) -> Duration {
        Duration::seconds(i64::from(self.lifetime))
    }

    fn to_document(&self) -> Self::Document {
        AccessTokenDocument {
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
            creation_time: self.creation_time,
            lifetime: self.lifetime,
            token_type: self.token_type.clone(),
            client: ClientRef::from(&self.client),
            claims: self.claims.clone(),
            version: self.version,
        }
    }

    fn collect_references(document: &Self::Document, references: &mut References) {
        references.client(&document.client);
    }

    fn from_document(document: Self::Document, resolved: &Resolved) -> StoreResult<Self> {
        Ok(Self {
            audience: document.audience,
            issuer: document.issuer,
            creation_time: document.creation_time,
            lifetime: document.lifetime,
            token_type: document.token_type,
            client: resolved.client(&document.client)?,
            claims: document.claims,
            version: document.version,
        })
    }
}

impl TokenPayload for RefreshToken {
    const KIND: TokenType = TokenType::RefreshToken;
    type Document = RefreshTokenDocument;

    fn lifetime(&self) -> Duration {
        Duration::seconds(i64::from(self.lifetime))
    }

    fn to_document(&self) -> Self::Document {
        RefreshTokenDocument {
            creation_time: self.creation_time,
            lifetime: self.lifetime,
            access_token: self.access_token.to_document(),
            version: self.version,
        }
    }

    fn collect_references(document: &Self::Document, references: &mut References) {
        AccessToken::collect_references(&document.access_token, references);
    }

    fn from_document(document: Self::Document, resolved: &Resolved) -> StoreResult<Self> {
        Ok(Self {
            creation_time: document.creation_time,
            lifetime: document.lifetime,
            access_token: AccessToken::from_document(document.access_token, resolved)?,
            version: document.version,
        })
    }
}
