//! Install-time precache.
//!
//! The core manifest installs as one unit: every asset is fetched before
//! anything is written, and one failure fails the install. Soft assets and
//! pre-built queries are best-effort and each failure is only logged.

use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use shellcache_core::{Namespace, Request, RequestKey, Response, ResponseType, VersionTag};
use shellcache_fetch::{EngineContext, FetchError, PrebuiltRequest};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::WorkerError;

// ============================================================================
// Install Report
// ============================================================================

/// A best-effort entry that could not be precached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftFailure {
    /// URL or pre-built request id.
    pub target: String,
    /// Why it failed.
    pub error: String,
}

/// What an install stored.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Version that was installed.
    pub version: VersionTag,
    /// Core assets, in manifest order.
    pub core: Vec<RequestKey>,
    /// Soft assets that were stored.
    pub soft: Vec<RequestKey>,
    /// Pre-built queries that were stored.
    pub prebuilt: Vec<RequestKey>,
    /// Best-effort entries that failed.
    pub failures: Vec<SoftFailure>,
    /// When the install finished.
    pub finished_at: DateTime<Utc>,
    /// How long it took.
    #[serde(skip)]
    pub duration: Duration,
}

impl InstallReport {
    /// Total number of stored entries.
    pub fn stored(&self) -> usize {
        self.core.len() + self.soft.len() + self.prebuilt.len()
    }
}

// ============================================================================
// Precache Loader
// ============================================================================

/// Populates the stores of one version.
#[derive(Debug, Clone)]
pub struct PrecacheLoader {
    ctx: EngineContext,
}

impl PrecacheLoader {
    /// Creates a loader for the context's version.
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Runs the whole precache.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Install`] if any core asset fails. Soft
    /// failures are reported in the [`InstallReport`] instead.
    #[instrument(skip(self), fields(version = %self.ctx.config.version))]
    pub async fn run(&self) -> Result<InstallReport, WorkerError> {
        let start = Instant::now();
        info!(
            core = self.ctx.config.manifest.len(),
            soft = self.ctx.config.soft_manifest.len(),
            prebuilt = self.ctx.config.prebuilt.len(),
            "Precaching"
        );

        let core = self.load_core().await?;

        let mut failures = Vec::new();
        let soft = self.load_soft(&mut failures).await;
        let prebuilt = self.load_prebuilt(&mut failures).await;

        let report = InstallReport {
            version: self.ctx.config.version.clone(),
            core,
            soft,
            prebuilt,
            failures,
            finished_at: Utc::now(),
            duration: start.elapsed(),
        };
        info!(
            stored = report.stored(),
            failed = report.failures.len(),
            duration = ?report.duration,
            "Precache complete"
        );
        Ok(report)
    }

    /// Fetches every core asset, then writes them all.
    async fn load_core(&self) -> Result<Vec<RequestKey>, WorkerError> {
        let config = &self.ctx.config;
        let mut requests = Vec::with_capacity(config.manifest.len());
        for entry in &config.manifest {
            let url = config
                .resolve(entry)
                .map_err(|e| WorkerError::Config(format!("manifest entry {entry:?}: {e}")))?;
            requests.push(Request::get(url));
        }

        let fetched = try_join_all(requests.iter().map(|request| async move {
            let response = fetch_asset(&self.ctx, request)
                .await
                .map_err(|reason| WorkerError::Install {
                    url: request.url.to_string(),
                    reason,
                })?;
            Ok::<_, WorkerError>((RequestKey::get(&request.url), response))
        }))
        .await?;

        let registry = &self.ctx.registry;
        let store = registry.store_name(Namespace::Core).to_string();
        let existed = registry.provider().has(&store).await?;
        registry.open(Namespace::Core).await?;

        let mut keys = Vec::with_capacity(fetched.len());
        for (key, response) in fetched {
            if let Err(e) = registry.put(Namespace::Core, &key, response).await {
                if !existed {
                    if let Err(cleanup) = registry.delete(&store).await {
                        warn!(store = %store, error = %cleanup, "Failed to roll back core store");
                    }
                }
                return Err(WorkerError::Install {
                    url: key.url,
                    reason: e.to_string(),
                });
            }
            keys.push(key);
        }

        debug!(count = keys.len(), "Core assets stored");
        Ok(keys)
    }

    async fn load_soft(&self, failures: &mut Vec<SoftFailure>) -> Vec<RequestKey> {
        let config = &self.ctx.config;
        let results = join_all(config.soft_manifest.iter().map(|entry| async move {
            let url = config.resolve(entry).map_err(|e| e.to_string())?;
            let request = Request::get(url);
            let response = fetch_asset(&self.ctx, &request).await?;
            let key = RequestKey::get(&request.url);
            self.ctx
                .registry
                .put(Namespace::Precache, &key, response)
                .await
                .map_err(|e| e.to_string())?;
            Ok::<_, String>(key)
        }))
        .await;

        collect(config.soft_manifest.iter().cloned(), results, failures)
    }

    async fn load_prebuilt(&self, failures: &mut Vec<SoftFailure>) -> Vec<RequestKey> {
        let config = &self.ctx.config;
        let results = join_all(
            config
                .prebuilt
                .iter()
                .map(|prebuilt| self.load_one_prebuilt(prebuilt)),
        )
        .await;

        collect(config.prebuilt.iter().map(|p| p.id.clone()), results, failures)
    }

    async fn load_one_prebuilt(&self, prebuilt: &PrebuiltRequest) -> Result<RequestKey, String> {
        let config = &self.ctx.config;
        let request = prebuilt.to_request(config).map_err(|e| e.to_string())?;
        let key = prebuilt.key(config).map_err(|e| e.to_string())?;
        let response = fetch_asset(&self.ctx, &request).await?;
        self.ctx
            .registry
            .put(Namespace::Dynamic, &key, response)
            .await
            .map_err(|e| e.to_string())?;
        Ok(key)
    }
}

/// Fetches one entry, accepting 2xx and opaque responses.
async fn fetch_asset(ctx: &EngineContext, request: &Request) -> Result<Response, String> {
    let response = ctx
        .fetcher
        .fetch(request)
        .await
        .map_err(|e: FetchError| e.to_string())?;
    if response.is_success() || response.kind == ResponseType::Opaque {
        Ok(response)
    } else {
        Err(format!("HTTP {}", response.status))
    }
}

fn collect(
    targets: impl Iterator<Item = String>,
    results: Vec<Result<RequestKey, String>>,
    failures: &mut Vec<SoftFailure>,
) -> Vec<RequestKey> {
    let mut stored = Vec::new();
    for (target, result) in targets.zip(results) {
        match result {
            Ok(key) => stored.push(key),
            Err(error) => {
                warn!(target = %target, error = %error, "Best-effort precache failed");
                failures.push(SoftFailure { target, error });
            }
        }
    }
    stored
}

// ============================================================================
// Tests
// ============================================================================
