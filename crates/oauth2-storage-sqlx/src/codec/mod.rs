//! Reference-resolving JSON codec for token payloads.
//!
//! Payloads embed full `Client` and `Scope` objects. On write those are
//! reduced to `{"clientId"}` / `{"name"}` references; claims and principals are
//! kept as plain data. On read, decoding runs in two phases:
//!
//! 1. every document is parsed into its reference-bearing form and the
//!    distinct client ids and scope names across *all* documents are collected;
//! 2. the references are resolved with one `find_by_ids` and one
//!    `find_by_names` call, then the final payloads are assembled.
//!
//! A reference that does not resolve is a [`StoreError::DanglingReference`].

pub mod documents;

use std::collections::{BTreeSet, HashMap};

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};

use oauth2_core::{Client, ReferenceKind, Scope, StoreError, StoreResult, TokenMetadata, TokenType};
use oauth2_ports::{DynClientStore, DynScopeStore};

pub use documents::{
    AccessTokenDocument, AuthorizationCodeDocument, ClientRef, RefreshTokenDocument, ScopeRef,
};

/// A payload persisted by the generic token store.
///
/// The kind fixes the `token_type` discriminator and, through
/// [`TokenType::write_policy`], how rows are written. The payload supplies its
/// own lifetime and the shape of its stored document.
pub trait TokenPayload: TokenMetadata + Send + Sync + Sized + 'static {
    const KIND: TokenType;

    /// Reference-bearing stored form.
    type Document: Serialize + DeserializeOwned + Send;

    /// Time from storage until the row stops being visible to `get`.
    fn lifetime(&self) -> Duration;

    fn to_document(&self) -> Self::Document;

    fn collect_references(document: &Self::Document, references: &mut References);

    fn from_document(document: Self::Document, resolved: &Resolved) -> StoreResult<Self>;
}

/// Identifiers gathered from parsed documents, deduplicated.
#[derive(Debug, Default)]
pub struct References {
    client_ids: BTreeSet<String>,
    scope_names: BTreeSet<String>,
}

impl References {
    pub fn client(&mut self, reference: &ClientRef) {
        self.client_ids.insert(reference.client_id.clone());
    }

    pub fn scope(&mut self, reference: &ScopeRef) {
        self.scope_names.insert(reference.name.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.client_ids.is_empty() && self.scope_names.is_empty()
    }
}

/// Objects looked up for a set of [`References`].
#[derive(Debug, Default)]
pub struct Resolved {
    clients: HashMap<String, Client>,
    scopes: HashMap<String, Scope>,
}

impl Resolved {
    pub fn client(&self, reference: &ClientRef) -> StoreResult<Client> {
        self.clients
            .get(&reference.client_id)
            .cloned()
            .ok_or_else(|| StoreError::dangling(ReferenceKind::Client, &reference.client_id))
    }

    pub fn scope(&self, reference: &ScopeRef) -> StoreResult<Scope> {
        self.scopes
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| StoreError::dangling(ReferenceKind::Scope, &reference.name))
    }
}

/// Encodes payloads to `jsonb` documents and decodes them back, resolving
/// embedded references against the injected client and scope stores.
#[derive(Clone)]
pub struct ReferenceCodec {
    clients: DynClientStore,
    scopes: DynScopeStore,
}

impl ReferenceCodec {
    pub fn new(clients: DynClientStore, scopes: DynScopeStore) -> Self {
        Self { clients, scopes }
    }

    pub fn encode<T: TokenPayload>(&self, value: &T) -> StoreResult<serde_json::Value> {
        Ok(serde_json::to_value(value.to_document())?)
    }

    pub async fn decode<T: TokenPayload>(&self, model: serde_json::Value) -> StoreResult<T> {
        let document: T::Document = serde_json::from_value(model)?;

        let mut references = References::default();
        T::collect_references(&document, &mut references);
        let resolved = self.resolve(references).await?;

        T::from_document(document, &resolved)
    }

    /// Decodes many documents with a single resolution pass.
    pub async fn decode_all<T: TokenPayload>(
        &self,
        models: Vec<serde_json::Value>,
    ) -> StoreResult<Vec<T>> {
        let documents = models
            .into_iter()
            .map(serde_json::from_value::<T::Document>)
            .collect::<Result<Vec<_>, _>>()?;

        let mut references = References::default();
        for document in &documents {
            T::collect_references(document, &mut references);
        }

        let resolved = self.resolve(references).await?;

        documents
            .into_iter()
            .map(|document| T::from_document(document, &resolved))
            .collect()
    }

    async fn resolve(&self, references: References) -> StoreResult<Resolved> {
        if references.is_empty() {
            return Ok(Resolved::default());
        }

        let mut resolved = Resolved::default();

        if !references.client_ids.is_empty() {
            let ids: Vec<String> = references.client_ids.into_iter().collect();
            resolved.clients = self
                .clients
                .find_by_ids(&ids)
                .await?
                .into_iter()
                .map(|client| (client.client_id.clone(), client))
                .collect();
        }

        if !references.scope_names.is_empty() {
            let names: Vec<String> = references.scope_names.into_iter().collect();
            resolved.scopes = self
                .scopes
                .find_by_names(&names)
                .await?
                .into_iter()
                .map(|scope| (scope.name.clone(), scope))
                .collect();
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use oauth2_core::{
        AccessToken, AuthorizationCode, Claim, ClaimsPrincipal, RefreshToken, ScopeType,
    };
    use oauth2_ports::{ClientStore, ScopeStore};

    #[derive(Default)]
    struct FakeClients {
        clients: Vec<Client>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClientStore for FakeClients {
        async fn find_by_id(&self, client_id: &str) -> StoreResult<Option<Client>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.clients.iter().find(|c| c.client_id == client_id).cloned())
        }

        async fn find_by_ids(&self, client_ids: &[String]) -> StoreResult<Vec<Client>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .clients
                .iter()
                .filter(|c| client_ids.contains(&c.client_id))
                .cloned()
                .collect())
        }

        async fn add(&self, _client: &Client) -> StoreResult<()> {
            unreachable!("codec never writes clients")
        }
    }

    #[derive(Default)]
    struct FakeScopes {
        scopes: Vec<Scope>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScopeStore for FakeScopes {
        async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Scope>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .scopes
                .iter()
                .filter(|s| names.contains(&s.name))
                .cloned()
                .collect())
        }

        async fn get_all(&self, _public_only: bool) -> StoreResult<Vec<Scope>> {
            Ok(self.scopes.clone())
        }

        async fn save(&self, _scope: &Scope) -> StoreResult<()> {
            unreachable!("codec never writes scopes")
        }
    }

    fn web_client() -> Client {
        let mut client = Client::new("web");
        client.authorization_code_lifetime = 120;
        client.claims = vec![Claim::new("tier", "gold")];
        client
    }

    fn fixtures() -> (Arc<FakeClients>, Arc<FakeScopes>, ReferenceCodec) {
        let clients = Arc::new(FakeClients {
            clients: vec![web_client(), Client::new("cli")],
            ..Default::default()
        });
        let scopes = Arc::new(FakeScopes {
            scopes: vec![
                Scope::new("openid", ScopeType::Identity),
                Scope::new("api", ScopeType::Resource),
            ],
            ..Default::default()
        });
        let codec = ReferenceCodec::new(clients.clone(), scopes.clone());
        (clients, scopes, codec)
    }

    fn code_for(client: Client, scopes: Vec<Scope>) -> AuthorizationCode {
        let mut code = AuthorizationCode::new(
            client,
            ClaimsPrincipal::new(
                "idsrv",
                vec![Claim::new("sub", "alice"), Claim::new("amr", "pwd")],
            ),
            scopes,
            "https://web.example.com/cb",
        );
        code.creation_time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        code.nonce = Some("n-0S6_WzA2Mj".to_string());
        code.is_open_id = true;
        code
    }

    #[test]
    fn encode_replaces_embedded_objects_with_references() {
        let (_, _, codec) = fixtures();
        let code = code_for(
            web_client(),
            vec![
                Scope::new("openid", ScopeType::Identity),
                Scope::new("api", ScopeType::Resource),
            ],
        );

        let json = codec.encode(&code).unwrap();

        assert_eq!(json["client"], serde_json::json!({ "clientId": "web" }));
        assert_eq!(
            json["requestedScopes"],
            serde_json::json!([{ "name": "openid" }, { "name": "api" }])
        );
        assert_eq!(json["subject"]["authenticationType"], "idsrv");
        assert_eq!(json["subject"]["claims"][0]["type"], "sub");
        assert_eq!(json["creationTime"], "2024-05-01T12:30:00Z");
    }

    #[tokio::test]
    async fn authorization_code_round_trips_through_references() {
        let (_, _, codec) = fixtures();
        let code = code_for(
            web_client(),
            vec![
                Scope::new("openid", ScopeType::Identity),
                Scope::new("api", ScopeType::Resource),
            ],
        );

        let json = codec.encode(&code).unwrap();
        let back: AuthorizationCode = codec.decode(json).await.unwrap();

        assert_eq!(back, code);
    }

    #[tokio::test]
    async fn refresh_token_round_trips_with_nested_access_token() {
        let (_, _, codec) = fixtures();
        let access = AccessToken::new(
            web_client(),
            vec![Claim::new("sub", "alice"), Claim::new("scope", "api")],
            3600,
        );
        let refresh = RefreshToken::new(access, 86_400);

        let json = codec.encode(&refresh).unwrap();
        assert_eq!(json["accessToken"]["client"]["clientId"], "web");

        let back: RefreshToken = codec.decode(json).await.unwrap();
        assert_eq!(back, refresh);
    }

    #[tokio::test]
    async fn decode_all_resolves_each_reference_once() {
        let (clients, scopes, codec) = fixtures();
        let openid = Scope::new("openid", ScopeType::Identity);
        let models = vec![
            codec
                .encode(&code_for(web_client(), vec![openid.clone()]))
                .unwrap(),
            codec
                .encode(&code_for(web_client(), vec![openid.clone()]))
                .unwrap(),
            codec
                .encode(&code_for(Client::new("cli"), vec![openid]))
                .unwrap(),
        ];

        let decoded: Vec<AuthorizationCode> = codec.decode_all(models).await.unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[2].client.client_id, "cli");
        assert_eq!(clients.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scopes.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn access_token_without_scopes_skips_scope_lookup() {
        let (_, scopes, codec) = fixtures();
        let token = AccessToken::new(web_client(), vec![Claim::new("sub", "bob")], 60);

        let back: AccessToken = codec.decode(codec.encode(&token).unwrap()).await.unwrap();

        assert_eq!(back, token);
        assert_eq!(scopes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_client_is_a_dangling_reference() {
        let (_, _, codec) = fixtures();
        let json = codec
            .encode(&code_for(Client::new("deleted"), vec![]))
            .unwrap();

        let err = codec.decode::<AuthorizationCode>(json).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::DanglingReference { kind: ReferenceKind::Client, ref id } if id == "deleted"
        ));
    }

    #[tokio::test]
    async fn missing_scope_is_a_dangling_reference() {
        let (_, _, codec) = fixtures();
        let json = codec
            .encode(&code_for(
                web_client(),
                vec![Scope::new("retired", ScopeType::Resource)],
            ))
            .unwrap();

        let err = codec.decode::<AuthorizationCode>(json).await.unwrap_err();

        assert!(err.is_dangling_reference());
        assert_eq!(err.to_string(), "Dangling scope reference: retired");
    }

    #[tokio::test]
    async fn offsets_are_normalized_to_utc_on_read() {
        let (_, _, codec) = fixtures();
        let token = AccessToken::new(web_client(), vec![], 60);
        let mut json = codec.encode(&token).unwrap();
        json["creationTime"] = serde_json::json!("2024-05-01T14:30:00+02:00");

        let back: AccessToken = codec.decode(json).await.unwrap();

        assert_eq!(
            back.creation_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn malformed_document_is_a_serialization_error() {
        let (_, _, codec) = fixtures();
        let err = codec
            .decode::<AccessToken>(serde_json::json!({ "client": 7 }))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
