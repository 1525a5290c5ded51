//! Open application instances.
//!
//! Tracks which clients (tabs, windows, embedded views) are open and which
//! version controls each of them.

use serde::{Deserialize, Serialize};
use shellcache_core::VersionTag;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Identifier of an open client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Registry of open clients and their controlling version.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next: AtomicU64,
    clients: RwLock<BTreeMap<ClientId, Option<VersionTag>>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly opened, uncontrolled client.
    pub async fn open(&self) -> ClientId {
        let id = ClientId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.clients.write().await.insert(id, None);
        debug!(client = %id, "Client opened");
        id
    }

    /// Registers a client that loaded under `version`.
    pub async fn open_controlled(&self, version: VersionTag) -> ClientId {
        let id = self.open().await;
        self.clients.write().await.insert(id, Some(version));
        id
    }

    /// Removes a client. Returns false if it was unknown.
    pub async fn close(&self, id: ClientId) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    /// Returns the version controlling a client.
    pub async fn controller(&self, id: ClientId) -> Option<VersionTag> {
        self.clients.read().await.get(&id).cloned().flatten()
    }

    /// Number of open clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Returns true if no clients are open.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Takes control of every open client for `version`.
    ///
    /// Returns how many clients changed controller.
    pub async fn claim(&self, version: &VersionTag) -> usize {
        let mut clients = self.clients.write().await;
        let mut claimed = 0;
        for controller in clients.values_mut() {
            if controller.as_ref() != Some(version) {
                *controller = Some(version.clone());
                claimed += 1;
            }
        }
        debug!(version = %version.as_str(), claimed, "Claimed clients");
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_takes_over_every_client() {
        let registry = ClientRegistry::new();
        let a = registry.open().await;
        let b = registry.open_controlled(VersionTag::from("v1")).await;
        let c = registry.open_controlled(VersionTag::from("v2")).await;

        let v2 = VersionTag::from("v2");
        assert_eq!(registry.claim(&v2).await, 2);
        for id in [a, b, c] {
            assert_eq!(registry.controller(id).await, Some(v2.clone()));
        }

        assert_eq!(registry.claim(&v2).await, 0);
    }

    #[tokio::test]
    async fn test_close() {
        let registry = ClientRegistry::new();
        let id = registry.open().await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.close(id).await);
        assert!(!registry.close(id).await);
        assert!(registry.is_empty().await);
    }
}
