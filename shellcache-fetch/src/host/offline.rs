//! A fetcher with no network.

use async_trait::async_trait;
use shellcache_core::{Request, Response};
use tracing::debug;

use super::Fetcher;
use crate::error::FetchError;

/// Fails every fetch with [`FetchError::Offline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl OfflineFetcher {
    /// Creates an offline fetcher.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        debug!(url = %request.url, "Offline, refusing fetch");
        Err(FetchError::Offline)
    }
}
