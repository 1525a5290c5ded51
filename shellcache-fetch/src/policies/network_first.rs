//! Network-first with a canonical shell fallback, for navigations.
//!
//! Every navigation response is stored under one canonical entry-point key,
//! so whatever path the app was opened at, an offline reload gets the last
//! shell that was seen.

use async_trait::async_trait;
use shellcache_core::{Namespace, Request, RequestKey};
use tracing::{debug, instrument, warn};

use crate::context::EngineContext;
use crate::error::FetchError;
use crate::strategy::{CachePolicy, PolicyKind, Served};

/// Network-first policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFirst;

impl NetworkFirst {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }

    async fn fallback(
        ctx: &EngineContext,
        key: &RequestKey,
        error: FetchError,
    ) -> Result<Served, FetchError> {
        // prefer the store navigations write to, then any store
        let hit = match ctx.registry.match_in(Namespace::Core, key).await {
            Ok(Some(hit)) => Some(hit),
            Ok(None) => ctx.registry.match_any(key).await?,
            Err(e) => {
                warn!(error = %e, "Core store read failed, searching all stores");
                ctx.registry.match_any(key).await?
            }
        };

        match hit {
            Some(cached) => {
                debug!(store = %cached.store, "Serving navigation fallback");
                Ok(Served::fallback(cached))
            }
            None => Err(FetchError::NoFallback {
                key: key.to_string(),
                source: Box::new(error),
            }),
        }
    }
}

#[async_trait]
impl CachePolicy for NetworkFirst {
    fn kind(&self) -> PolicyKind {
        PolicyKind::NetworkFirst
    }

    #[instrument(skip(self, ctx, request), fields(url = %request.url))]
    async fn respond(&self, ctx: &EngineContext, request: &Request) -> Result<Served, FetchError> {
        let key = ctx.config.entry_point_key()?;

        match ctx.fetcher.fetch(request).await {
            Ok(response) => {
                if ctx.config.navigation_cache_errors || response.is_success() {
                    if let Err(e) = ctx
                        .registry
                        .put(Namespace::Core, &key, response.clone())
                        .await
                    {
                        warn!(key = %key, error = %e, "Failed to store navigation shell");
                    }
                }
                Ok(Served::network(response, self.kind()))
            }
            Err(error) => {
                warn!(error = %error, "Navigation fetch failed, falling back");
                Self::fallback(ctx, &key, error).await
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ResponseSource;
    use crate::test_support::{MockFetcher, context, url};
    use shellcache_core::Response;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_online_navigation_stores_under_canonical_key() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("https://bus.example/routes/12", Response::ok("<shell v1>"));
        let ctx = context(fetcher.clone());

        let request = Request::navigate(url("https://bus.example/routes/12"));
        let served = NetworkFirst.respond(&ctx, &request).await.unwrap();

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.text(), "<shell v1>");

        let key = ctx.config.entry_point_key().unwrap();
        let stored = ctx.registry.match_in(Namespace::Core, &key).await.unwrap();
        assert_eq!(stored.unwrap().response.text(), "<shell v1>");

        let literal = RequestKey::get(&request.url);
        assert!(ctx.registry.match_any(&literal).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_navigation_serves_last_shell() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("https://bus.example/", Response::ok("<shell v1>"));
        let ctx = context(fetcher.clone());

        NetworkFirst
            .respond(&ctx, &Request::navigate(url("https://bus.example/")))
            .await
            .unwrap();

        fetcher.respond("https://bus.example/stops", Response::ok("<shell v2>"));
        NetworkFirst
            .respond(&ctx, &Request::navigate(url("https://bus.example/stops")))
            .await
            .unwrap();

        fetcher.fail("https://bus.example/anything");
        let served = NetworkFirst
            .respond(&ctx, &Request::navigate(url("https://bus.example/anything")))
            .await
            .unwrap();

        assert!(matches!(served.source, ResponseSource::Fallback(_)));
        assert_eq!(served.response.text(), "<shell v2>");
    }

    #[tokio::test]
    async fn test_offline_navigation_without_shell_fails() {
        let ctx = context(Arc::new(MockFetcher::new()));
        let err = NetworkFirst
            .respond(&ctx, &Request::navigate(url("https://bus.example/")))
            .await
            .unwrap_err();

        match err {
            FetchError::NoFallback { key, source } => {
                assert_eq!(key, "GET https://bus.example/index.html");
                assert!(source.is_network_failure());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_returned_live() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("https://bus.example/", Response::new(503, "down"));
        let ctx = context(fetcher);

        let served = NetworkFirst
            .respond(&ctx, &Request::navigate(url("https://bus.example/")))
            .await
            .unwrap();
        assert_eq!(served.response.status, 503);
        assert_eq!(served.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_error_status_not_stored_when_disabled() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("https://bus.example/", Response::new(503, "down"));
        let mut config = crate::test_support::config();
        config.navigation_cache_errors = false;
        let ctx = EngineContext::new(
            config,
            fetcher,
            Arc::new(shellcache_store::MemoryStoreProvider::new()),
        );

        NetworkFirst
            .respond(&ctx, &Request::navigate(url("https://bus.example/")))
            .await
            .unwrap();

        let key = ctx.config.entry_point_key().unwrap();
        assert!(ctx.registry.match_any(&key).await.unwrap().is_none());
    }
}
