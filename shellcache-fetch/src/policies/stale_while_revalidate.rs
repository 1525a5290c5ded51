//! Stale-while-revalidate, for dynamic API hosts.
//!
//! The network fetch is started before the cache lookup so the refresh runs
//! whether or not there is a hit. Only 2xx responses overwrite the stored
//! entry, so an outage never replaces a good value with an error page.
//!
//! The refresh may settle after a newer version has been activated and the
//! dynamic store it targets has been deleted. The write is then dropped and
//! the store is not recreated.

use async_trait::async_trait;
use shellcache_core::{Namespace, Request, RequestKey, Response};
use tracing::{debug, instrument, warn};

use crate::context::EngineContext;
use crate::error::FetchError;
use crate::strategy::{CachePolicy, PolicyKind, Revalidation, Served};

/// Stale-while-revalidate policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaleWhileRevalidate;

impl StaleWhileRevalidate {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }
}

/// Spawns the background fetch-and-store task.
fn spawn_revalidation(ctx: EngineContext, request: Request, key: RequestKey) -> Revalidation {
    Revalidation::new(tokio::spawn(async move {
        let response = match ctx.fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(key = %key, error = %error, "Revalidation fetch failed");
                return Err(error);
            }
        };
        store_if_success(&ctx, &key, &response).await;
        Ok(response)
    }))
}

async fn store_if_success(ctx: &EngineContext, key: &RequestKey, response: &Response) {
    if !response.is_success() {
        debug!(key = %key, status = response.status, "Not storing unsuccessful response");
        return;
    }
    match ctx
        .registry
        .put_existing(Namespace::Dynamic, key, response.clone())
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => debug!(key = %key, "Dynamic store was collected, discarding refresh"),
        Err(e) => warn!(key = %key, error = %e, "Failed to store revalidated response"),
    }
}

#[async_trait]
impl CachePolicy for StaleWhileRevalidate {
    fn kind(&self) -> PolicyKind {
        PolicyKind::StaleWhileRevalidate
    }

    #[instrument(skip(self, ctx, request), fields(url = %request.url))]
    async fn respond(&self, ctx: &EngineContext, request: &Request) -> Result<Served, FetchError> {
        let key = RequestKey::for_request(request).ok_or_else(|| {
            FetchError::InvalidRequest(format!("{} requests are not cached", request.method))
        })?;

        if let Err(e) = ctx.registry.open(Namespace::Dynamic).await {
            warn!(error = %e, "Failed to open dynamic store");
        }
        let revalidation = spawn_revalidation(ctx.clone(), request.clone(), key.clone());

        let hit = match ctx.registry.match_any(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, waiting for network");
                None
            }
        };

        match hit {
            Some(cached) => {
                debug!(store = %cached.store, "Serving cached response, revalidating");
                Ok(Served::cached(cached, self.kind()).with_revalidation(revalidation))
            }
            None => {
                debug!("Cache miss, waiting for network");
                let response = revalidation.settled().await?;
                Ok(Served::network(response, self.kind()))
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
    use std::sync::Arc;
    use tokio::sync::Notify;

    const ROUTES: &str = "https://api.example/routes";

    #[tokio::test]
    async fn test_hit_returns_before_network_settles() {
        let gate = Arc::new(Notify::new());
        let fetcher = Arc::new(MockFetcher::gated(gate.clone()));
        fetcher.respond(ROUTES, Response::ok("new"));
        let ctx = context(fetcher.clone());
        let key = RequestKey::get(&url(ROUTES));
        ctx.registry
            .put(Namespace::Dynamic, &key, Response::ok("old"))
            .await
            .unwrap();

        // the gate is closed, so this only returns if it does not wait
        let served = StaleWhileRevalidate
            .respond(&ctx, &Request::get(url(ROUTES)))
            .await
            .unwrap();
        assert_eq!(served.response.text(), "old");
        assert!(matches!(served.source, ResponseSource::Cache(_)));

        gate.notify_one();
        let fresh = served.revalidation.unwrap().settled().await.unwrap();
        assert_eq!(fresh.text(), "new");

        let stored = ctx.registry.match_any(&key).await.unwrap().unwrap();
        assert_eq!(stored.response.text(), "new");
    }

    #[tokio::test]
    async fn test_refresh_after_store_deleted_is_dropped() {
        let gate = Arc::new(Notify::new());
        let fetcher = Arc::new(MockFetcher::gated(gate.clone()));
        fetcher.respond(ROUTES, Response::ok("late"));
        let ctx = context(fetcher);
        let key = RequestKey::get(&url(ROUTES));
        let store = ctx
            .registry
            .put(Namespace::Dynamic, &key, Response::ok("old"))
            .await
            .unwrap()
            .store;

        let served = StaleWhileRevalidate
            .respond(&ctx, &Request::get(url(ROUTES)))
            .await
            .unwrap();
        ctx.registry.delete(&store.to_string()).await.unwrap();

        gate.notify_one();
        let fresh = served.revalidation.unwrap().settled().await.unwrap();
        assert_eq!(fresh.text(), "late");
        assert!(ctx.registry.list_namespaces().await.unwrap().is_empty());
        assert!(ctx.registry.match_any(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_old_value() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail(ROUTES);
        let ctx = context(fetcher);
        let key = RequestKey::get(&url(ROUTES));
        ctx.registry
            .put(Namespace::Dynamic, &key, Response::ok("old"))
            .await
            .unwrap();

        let served = StaleWhileRevalidate
            .respond(&ctx, &Request::get(url(ROUTES)))
            .await
            .unwrap();
        assert_eq!(served.response.text(), "old");
        assert!(served.revalidation.unwrap().settled().await.is_err());

        let stored = ctx.registry.match_any(&key).await.unwrap().unwrap();
        assert_eq!(stored.response.text(), "old");
    }

    #[tokio::test]
    async fn test_error_status_does_not_overwrite() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond(ROUTES, Response::new(500, "boom"));
        let ctx = context(fetcher);
        let key = RequestKey::get(&url(ROUTES));
        ctx.registry
            .put(Namespace::Dynamic, &key, Response::ok("old"))
            .await
            .unwrap();

        let served = StaleWhileRevalidate
            .respond(&ctx, &Request::get(url(ROUTES)))
            .await
            .unwrap();
        served.revalidation.unwrap().settled().await.unwrap();

        let stored = ctx.registry.match_any(&key).await.unwrap().unwrap();
        assert_eq!(stored.response.text(), "old");
    }

    #[tokio::test]
    async fn test_miss_waits_for_network_and_stores() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond(ROUTES, Response::ok("fresh"));
        let ctx = context(fetcher);

        let served = StaleWhileRevalidate
            .respond(&ctx, &Request::get(url(ROUTES)))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.text(), "fresh");
        assert!(served.revalidation.is_none());

        let key = RequestKey::get(&url(ROUTES));
        let stored = ctx.registry.match_in(Namespace::Dynamic, &key).await.unwrap();
        assert_eq!(stored.unwrap().response.text(), "fresh");
    }

    #[tokio::test]
    async fn test_miss_with_network_failure_surfaces() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail(ROUTES);
        let ctx = context(fetcher);

        let err = StaleWhileRevalidate
            .respond(&ctx, &Request::get(url(ROUTES)))
            .await
            .unwrap_err();
        assert!(err.is_network_failure());
    }
}
