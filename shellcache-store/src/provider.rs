//! Persistent key-value store provider trait.
//!
//! A provider owns a set of named stores, each mapping [`RequestKey`] to a
//! stored [`Response`]. Names are opaque strings at this layer; the
//! [`StoreRegistry`](crate::StoreRegistry) gives them meaning.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shellcache_core::{RequestKey, Response};

use crate::error::StoreError;

/// A response as persisted by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// The stored response.
    pub response: Response,
    /// When it was written.
    pub stored_at: DateTime<Utc>,
}

impl StoredEntry {
    /// Creates an entry stamped with the current time.
    pub fn now(response: Response) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }
}

/// Persistent key-value store capability.
///
/// Implementations must be safe for concurrent reads and writes; writes to
/// the same key are last-writer-wins.
#[async_trait]
pub trait StoreProvider: Send + Sync {
    /// Creates the named store if it does not exist. Idempotent.
    async fn open(&self, name: &str) -> Result<(), StoreError>;

    /// Returns true if the named store exists.
    async fn has(&self, name: &str) -> Result<bool, StoreError>;

    /// Deletes a store and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;

    /// Enumerates every persisted store name in creation order.
    async fn names(&self) -> Result<Vec<String>, StoreError>;

    /// Looks up a key in one store. A missing store is a miss.
    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<StoredEntry>, StoreError>;

    /// Inserts or overwrites the entry at `key`, creating the store if needed.
    async fn put(&self, name: &str, key: &RequestKey, entry: StoredEntry) -> Result<(), StoreError>;

    /// Inserts or overwrites the entry at `key` only if the store exists.
    ///
    /// The existence check and the write are atomic with respect to
    /// [`delete`](Self::delete). Returns false, writing nothing, when the
    /// store is gone.
    async fn put_existing(
        &self,
        name: &str,
        key: &RequestKey,
        entry: StoredEntry,
    ) -> Result<bool, StoreError>;

    /// Lists keys in one store. A missing store has no keys.
    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, StoreError>;
}
