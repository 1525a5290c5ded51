//! In-memory store provider.
//!
//! Used for tests and for runs that do not need stores to survive a restart.

use async_trait::async_trait;
use shellcache_core::RequestKey;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::provider::{StoreProvider, StoredEntry};

#[derive(Default)]
struct MemoryInner {
    /// Store names in creation order.
    order: Vec<String>,
    stores: HashMap<String, BTreeMap<RequestKey, StoredEntry>>,
}

impl MemoryInner {
    fn ensure(&mut self, name: &str) -> &mut BTreeMap<RequestKey, StoredEntry> {
        if !self.stores.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.stores.entry(name.to_string()).or_default()
    }
}

/// Store provider backed by process memory.
#[derive(Default)]
pub struct MemoryStoreProvider {
    inner: RwLock<MemoryInner>,
}

impl MemoryStoreProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreProvider for MemoryStoreProvider {
    async fn open(&self, name: &str) -> Result<(), StoreError> {
        self.inner.write().await.ensure(name);
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.stores.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let existed = inner.stores.remove(name).is_some();
        inner.order.retain(|n| n != name);
        debug!(store = %name, existed, "Deleted in-memory store");
        Ok(existed)
    }

    async fn names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.read().await.order.clone())
    }

    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<StoredEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.stores.get(name).and_then(|s| s.get(key)).cloned())
    }

    async fn put(&self, name: &str, key: &RequestKey, entry: StoredEntry) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .ensure(name)
            .insert(key.clone(), entry);
        Ok(())
    }

    async fn put_existing(
        &self,
        name: &str,
        key: &RequestKey,
        entry: StoredEntry,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(store) = inner.stores.get_mut(name) else {
            return Ok(false);
        };
        store.insert(key.clone(), entry);
        Ok(true)
    }

    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .stores
            .get(name)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================
