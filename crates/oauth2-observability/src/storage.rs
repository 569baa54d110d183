use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use oauth2_core::{Client, Consent, Scope, StoreResult, TokenMetadata};
use oauth2_ports::{ClientStore, ConsentStore, ScopeStore, TokenStore};

/// A thin wrapper around any store that creates a tracing span for each call.
///
/// Token keys are secrets; only a short prefix and the length are recorded.
pub struct ObservedStore<S: ?Sized> {
    inner: Arc<S>,
    db_system: String,
}

impl<S: ?Sized> ObservedStore<S> {
    pub fn new(inner: Arc<S>, db_system: impl Into<String>) -> Self {
        Self {
            inner,
            db_system: db_system.into(),
        }
    }

    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    fn token_prefix(token: &str) -> String {
        token.chars().take(12).collect::<String>()
    }
}

async fn observe<T>(
    span: tracing::Span,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    async move {
        let result = call.await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "store operation failed");
        }
        result
    }
    .instrument(span)
    .await
}

#[async_trait]
impl<S> ClientStore for ObservedStore<S>
where
    S: ClientStore + ?Sized,
{
    async fn find_by_id(&self, client_id: &str) -> StoreResult<Option<Client>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "find_client",
            client_id = %client_id
        );
        observe(span, self.inner.find_by_id(client_id)).await
    }

    async fn find_by_ids(&self, client_ids: &[String]) -> StoreResult<Vec<Client>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "find_clients",
            client_count = client_ids.len()
        );
        observe(span, self.inner.find_by_ids(client_ids)).await
    }

    async fn add(&self, client: &Client) -> StoreResult<()> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "add_client",
            client_id = %client.client_id
        );
        observe(span, self.inner.add(client)).await
    }
}

#[async_trait]
impl<S> ScopeStore for ObservedStore<S>
where
    S: ScopeStore + ?Sized,
{
    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Scope>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "find_scopes",
            scope_count = names.len()
        );
        observe(span, self.inner.find_by_names(names)).await
    }

    async fn get_all(&self, public_only: bool) -> StoreResult<Vec<Scope>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "list_scopes",
            public_only
        );
        observe(span, self.inner.get_all(public_only)).await
    }

    async fn save(&self, scope: &Scope) -> StoreResult<()> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "save_scope",
            scope = %scope.name
        );
        observe(span, self.inner.save(scope)).await
    }
}

#[async_trait]
impl<S> ConsentStore for ObservedStore<S>
where
    S: ConsentStore + ?Sized,
{
    async fn load(&self, subject: &str, client_id: &str) -> StoreResult<Option<Consent>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "load_consent",
            subject = %subject,
            client_id = %client_id
        );
        observe(span, self.inner.load(subject, client_id)).await
    }

    async fn load_all(&self, subject: &str) -> StoreResult<Vec<Consent>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "load_consents",
            subject = %subject
        );
        observe(span, self.inner.load_all(subject)).await
    }

    async fn revoke(&self, subject: &str, client_id: &str) -> StoreResult<()> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "revoke_consent",
            subject = %subject,
            client_id = %client_id
        );
        observe(span, self.inner.revoke(subject, client_id)).await
    }

    async fn update(&self, consent: &Consent) -> StoreResult<()> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "update_consent",
            subject = %consent.subject,
            client_id = %consent.client_id,
            scope_count = consent.scopes.len()
        );
        observe(span, self.inner.update(consent)).await
    }
}

#[async_trait]
impl<T, S> TokenStore<T> for ObservedStore<S>
where
    T: TokenMetadata + Send + Sync + 'static,
    S: TokenStore<T> + ?Sized,
{
    async fn store(&self, key: &str, value: &T) -> StoreResult<()> {
        // Never log full tokens.
        let key_prefix = Self::token_prefix(key);
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "store_token",
            key_prefix = %key_prefix,
            key_len = key.len(),
            subject = %value.subject_id(),
            client_id = %value.client_id()
        );
        observe(span, self.inner.store(key, value)).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<T>> {
        let key_prefix = Self::token_prefix(key);
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "get_token",
            key_prefix = %key_prefix,
            key_len = key.len()
        );
        observe(span, self.inner.get(key)).await
    }

    async fn get_all(&self, subject: &str) -> StoreResult<Vec<T>> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "list_tokens",
            subject = %subject
        );
        observe(span, self.inner.get_all(subject)).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let key_prefix = Self::token_prefix(key);
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "remove_token",
            key_prefix = %key_prefix,
            key_len = key.len()
        );
        observe(span, self.inner.remove(key)).await
    }

    async fn revoke(&self, subject: &str, client_id: &str) -> StoreResult<()> {
        let span = tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = "revoke_tokens",
            subject = %subject,
            client_id = %client_id
        );
        observe(span, self.inner.revoke(subject, client_id)).await
    }
}
