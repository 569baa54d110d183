use async_trait::async_trait;
use std::sync::Arc;

use oauth2_core::{
    AccessToken, AuthorizationCode, Client, Consent, RefreshToken, Scope, StoreResult,
};

/// Registered clients, keyed by `client_id`.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn find_by_id(&self, client_id: &str) -> StoreResult<Option<Client>>;

    /// Batch lookup; ids that do not exist are simply absent from the result.
    ///
    /// Backends should override this with a single query.
    async fn find_by_ids(&self, client_ids: &[String]) -> StoreResult<Vec<Client>> {
        let mut clients = Vec::with_capacity(client_ids.len());
        for id in client_ids {
            if let Some(client) = self.find_by_id(id).await? {
                clients.push(client);
            }
        }
        Ok(clients)
    }

    /// Fails if a client with the same id already exists.
    async fn add(&self, client: &Client) -> StoreResult<()>;
}

/// Scope definitions, keyed by name.
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Returns exactly the subset of `names` that exists.
    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Scope>>;

    /// `public_only = true` lists discoverable scopes; `false` lists every scope.
    async fn get_all(&self, public_only: bool) -> StoreResult<Vec<Scope>>;

    /// Pure insert; fails if the name is taken.
    async fn save(&self, scope: &Scope) -> StoreResult<()>;
}

/// Consent records, keyed by `(subject, client_id)`.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn load(&self, subject: &str, client_id: &str) -> StoreResult<Option<Consent>>;

    async fn load_all(&self, subject: &str) -> StoreResult<Vec<Consent>>;

    /// Idempotent.
    async fn revoke(&self, subject: &str, client_id: &str) -> StoreResult<()>;

    /// Inserts, or replaces the scope set of an existing consent wholesale.
    async fn update(&self, consent: &Consent) -> StoreResult<()>;
}

/// Expiring tokens of a single kind.
#[async_trait]
pub trait TokenStore<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    async fn store(&self, key: &str, value: &T) -> StoreResult<()>;

    /// `None` when absent or expired. Expired rows are left in place.
    async fn get(&self, key: &str) -> StoreResult<Option<T>>;

    /// Every token of this kind for `subject`, expired ones included.
    async fn get_all(&self, subject: &str) -> StoreResult<Vec<T>>;

    /// Idempotent.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Deletes every token of this kind for `(subject, client_id)`; idempotent.
    async fn revoke(&self, subject: &str, client_id: &str) -> StoreResult<()>;
}

pub type DynClientStore = Arc<dyn ClientStore>;
pub type DynScopeStore = Arc<dyn ScopeStore>;
pub type DynConsentStore = Arc<dyn ConsentStore>;
pub type DynAuthorizationCodeStore = Arc<dyn TokenStore<AuthorizationCode>>;
pub type DynTokenHandleStore = Arc<dyn TokenStore<AccessToken>>;
pub type DynRefreshTokenStore = Arc<dyn TokenStore<RefreshToken>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapClients(HashMap<String, Client>);

    #[async_trait]
    impl ClientStore for MapClients {
        async fn find_by_id(&self, client_id: &str) -> StoreResult<Option<Client>> {
            Ok(self.0.get(client_id).cloned())
        }

        async fn add(&self, _client: &Client) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_batch_lookup_skips_missing_ids() {
        let store = MapClients(HashMap::from([
            ("a".to_string(), Client::new("a")),
            ("b".to_string(), Client::new("b")),
        ]));

        let found = store
            .find_by_ids(&["a".to_string(), "missing".to_string(), "b".to_string()])
            .await
            .unwrap();

        let ids: Vec<_> = found.iter().map(|c| c.client_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
