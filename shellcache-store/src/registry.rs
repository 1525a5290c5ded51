//! Versioned store registry.
//!
//! Maps logical [`Namespace`]s to concrete store names for one
//! [`VersionTag`] and exposes the open / match / put / delete / list
//! contract the strategy engine works against.

use shellcache_core::{CachedResponse, Namespace, RequestKey, Response, StoreName, VersionTag};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::provider::{StoreProvider, StoredEntry};

/// Registry of the stores belonging to one application version.
#[derive(Clone)]
pub struct StoreRegistry {
    provider: Arc<dyn StoreProvider>,
    app: String,
    version: VersionTag,
}

impl StoreRegistry {
    /// Creates a registry over `provider` for `app` at `version`.
    pub fn new(provider: Arc<dyn StoreProvider>, app: impl Into<String>, version: VersionTag) -> Self {
        Self {
            provider,
            app: app.into(),
            version,
        }
    }

    /// Returns a registry sharing the same provider for another version.
    pub fn for_version(&self, version: VersionTag) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            app: self.app.clone(),
            version,
        }
    }

    /// Returns the application prefix.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Returns the current version.
    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &Arc<dyn StoreProvider> {
        &self.provider
    }

    /// Returns the current store name for a namespace.
    pub fn store_name(&self, namespace: Namespace) -> StoreName {
        StoreName::new(self.app.clone(), namespace, self.version.clone())
    }

    /// Returns the names of every current store; anything else is stale.
    pub fn whitelist(&self) -> Vec<String> {
        Namespace::all()
            .iter()
            .map(|ns| self.store_name(*ns).to_string())
            .collect()
    }

    /// Opens the current store for a namespace, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot create the store.
    pub async fn open(&self, namespace: Namespace) -> Result<StoreName, StoreError> {
        let name = self.store_name(namespace);
        self.provider.open(&name.to_string()).await?;
        Ok(name)
    }

    /// Looks up `key` in the current store of one namespace.
    ///
    /// # Errors
    ///
    /// Returns error if the provider read fails.
    pub async fn match_in(
        &self,
        namespace: Namespace,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, StoreError> {
        let name = self.store_name(namespace);
        let entry = self.provider.get(&name.to_string(), key).await?;
        Ok(entry.map(|e| snapshot(e, key, name)))
    }

    /// Looks up `key` across every store of this application and version.
    ///
    /// Stores are searched in creation order and the first hit wins. Names
    /// that do not parse as this application's stores, or that belong to
    /// another version, are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if a provider read fails.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<CachedResponse>, StoreError> {
        for raw in self.provider.names().await? {
            let Ok(name) = StoreName::parse(&self.app, &raw) else {
                continue;
            };
            if name.version != self.version {
                continue;
            }
            if let Some(entry) = self.provider.get(&raw, key).await? {
                debug!(store = %raw, "Global match hit");
                return Ok(Some(snapshot(entry, key, name)));
            }
        }
        Ok(None)
    }

    /// Inserts or overwrites `key` in the current store of `namespace`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider write fails.
    pub async fn put(
        &self,
        namespace: Namespace,
        key: &RequestKey,
        response: Response,
    ) -> Result<CachedResponse, StoreError> {
        let name = self.store_name(namespace);
        let entry = StoredEntry::now(response);
        self.provider
            .put(&name.to_string(), key, entry.clone())
            .await?;
        debug!(store = %name, key = %key, "Stored response");
        Ok(snapshot(entry, key, name))
    }

    /// Writes `key` into the current store of `namespace` only if that store
    /// still exists.
    ///
    /// Returns `None` when the store has been deleted, for example by
    /// activation of a newer version; the store is not recreated.
    ///
    /// # Errors
    ///
    /// Returns error if the provider write fails.
    pub async fn put_existing(
        &self,
        namespace: Namespace,
        key: &RequestKey,
        response: Response,
    ) -> Result<Option<CachedResponse>, StoreError> {
        let name = self.store_name(namespace);
        let entry = StoredEntry::now(response);
        if !self
            .provider
            .put_existing(&name.to_string(), key, entry.clone())
            .await?
        {
            debug!(store = %name, key = %key, "Store deleted, dropping write");
            return Ok(None);
        }
        debug!(store = %name, key = %key, "Stored response");
        Ok(Some(snapshot(entry, key, name)))
    }

    /// Deletes a whole store by persisted name.
    ///
    /// # Errors
    ///
    /// Returns error if the provider delete fails.
    pub async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        self.provider.delete(name).await
    }

    /// Enumerates every persisted store name, current or not.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot enumerate stores.
    pub async fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        self.provider.names().await
    }

    /// Returns persisted store names that are not current for this version.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot enumerate stores.
    pub async fn stale_names(&self) -> Result<Vec<String>, StoreError> {
        let whitelist = self.whitelist();
        Ok(self
            .list_namespaces()
            .await?
            .into_iter()
            .filter(|name| !whitelist.contains(name))
            .collect())
    }

    /// Returns the keys stored under a persisted store name.
    ///
    /// # Errors
    ///
    /// Returns error if the provider read fails.
    pub async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, StoreError> {
        self.provider.keys(name).await
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("app", &self.app)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

fn snapshot(entry: StoredEntry, key: &RequestKey, store: StoreName) -> CachedResponse {
    CachedResponse {
        response: entry.response,
        key: key.clone(),
        store,
        stored_at: entry.stored_at,
    }
}

// ============================================================================
// Tests
// ============================================================================
