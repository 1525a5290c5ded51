//! Cache-first, for same-origin static assets.

use async_trait::async_trait;
use shellcache_core::{Namespace, Request, RequestKey};
use tracing::{debug, instrument, warn};

use crate::context::EngineContext;
use crate::error::FetchError;
use crate::strategy::{CachePolicy, PolicyKind, Served};

/// Cache-first policy.
///
/// A hit in any store short-circuits the network. A miss is fetched and,
/// if it is a complete same-origin `200`, seeded into the dynamic store.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFirst;

impl CacheFirst {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CachePolicy for CacheFirst {
    fn kind(&self) -> PolicyKind {
        PolicyKind::CacheFirst
    }

    #[instrument(skip(self, ctx, request), fields(url = %request.url))]
    async fn respond(&self, ctx: &EngineContext, request: &Request) -> Result<Served, FetchError> {
        let key = RequestKey::for_request(request).ok_or_else(|| {
            FetchError::InvalidRequest(format!("{} requests are not cached", request.method))
        })?;

        match ctx.registry.match_any(&key).await {
            Ok(Some(cached)) => {
                debug!(store = %cached.store, "Cache hit");
                return Ok(Served::cached(cached, self.kind()));
            }
            Ok(None) => debug!("Cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, fetching"),
        }

        let response = ctx.fetcher.fetch(request).await?;

        if response.is_complete_basic() {
            if let Err(e) = ctx
                .registry
                .put(Namespace::Dynamic, &key, response.clone())
                .await
            {
                warn!(key = %key, error = %e, "Failed to store response");
            }
        } else {
            debug!(
                status = response.status,
                kind = ?response.kind,
                "Response not cacheable, returning unstored"
            );
        }

        Ok(Served::network(response, self.kind()))
    }
}

// ============================================================================
// Tests
// ============================================================================
