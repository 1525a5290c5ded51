//! Worker controller.
//!
//! Owns the lifecycle state and the engine that is currently serving. All
//! intercepted requests go through [`WorkerController::handle`]; until a
//! version is active they pass straight through.
//!
//! Activation holds the write lock across garbage collection and the engine
//! swap, so no request is served while stale stores are being deleted.
//! Requests hold the read lock for their whole policy call, network fetch
//! included, so activation waits for in-flight requests to finish. Only
//! background refreshes outlive the lock, and those never recreate a
//! collected store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shellcache_core::{CachedResponse, Namespace, Request, Response, VersionTag};
use shellcache_fetch::{
    Classifier, Decision, EngineConfig, EngineContext, FetchError, Interception, StrategyExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::clients::ClientRegistry;
use crate::error::WorkerError;
use crate::lifecycle::{Action, LifecycleEvent, LifecycleState, dispatch};
use crate::precache::{InstallReport, PrecacheLoader};

// ============================================================================
// Reports
// ============================================================================

/// What an activation did.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    /// Version that became active.
    pub version: VersionTag,
    /// Stale stores that were deleted.
    pub deleted: Vec<String>,
    /// Clients that changed controller.
    pub claimed: usize,
    /// When activation finished.
    pub finished_at: DateTime<Utc>,
}

/// Result of an install or update.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    /// The precache report.
    pub install: InstallReport,
    /// Present when the version was activated right away.
    pub activation: Option<ActivationReport>,
}

// ============================================================================
// Worker Controller
// ============================================================================

struct Inner {
    state: LifecycleState,
    active: Option<Arc<StrategyExecutor>>,
    candidate: Option<EngineContext>,
}

/// Drives install, activation and update, and serves requests.
pub struct WorkerController {
    base: EngineContext,
    classifier: Classifier,
    inner: RwLock<Inner>,
    install_lock: Mutex<()>,
    clients: Arc<ClientRegistry>,
}

impl WorkerController {
    /// Creates a controller whose first install will use `ctx`.
    pub fn new(ctx: EngineContext) -> Self {
        Self::with_clients(ctx, Arc::new(ClientRegistry::new()))
    }

    /// Creates a controller sharing an existing client registry.
    pub fn with_clients(ctx: EngineContext, clients: Arc<ClientRegistry>) -> Self {
        let classifier = Classifier::from_config(&ctx.config);
        Self {
            base: ctx,
            classifier,
            inner: RwLock::new(Inner {
                state: LifecycleState::Installing,
                active: None,
                candidate: None,
            }),
            install_lock: Mutex::new(()),
            clients,
        }
    }

    /// Returns the client registry.
    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> LifecycleState {
        self.inner.read().await.state
    }

    /// Returns the version currently serving, if any.
    pub async fn active_version(&self) -> Option<VersionTag> {
        self.inner
            .read()
            .await
            .active
            .as_ref()
            .map(|e| e.context().config.version.clone())
    }

    /// Returns the config of the version currently serving, if any.
    pub async fn active_config(&self) -> Option<Arc<EngineConfig>> {
        self.inner
            .read()
            .await
            .active
            .as_ref()
            .map(|e| Arc::clone(&e.context().config))
    }

    fn transition(inner: &mut Inner, event: LifecycleEvent) -> Result<Action, WorkerError> {
        let transition = dispatch(inner.state, &event)?;
        debug!(
            from = %inner.state,
            to = %transition.next,
            action = ?transition.action,
            "Lifecycle transition"
        );
        inner.state = transition.next;
        Ok(transition.action)
    }

    // ========================================================================
    // Install / Update
    // ========================================================================

    /// Installs the initial version.
    ///
    /// With `skip_waiting` set, the version is activated before returning.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Install`] if a core asset fails; the worker is
    /// then redundant and `install` may be retried.
    #[instrument(skip(self), fields(version = %self.base.config.version))]
    pub async fn install(&self) -> Result<InstallOutcome, WorkerError> {
        let _guard = self.install_lock.lock().await;
        {
            let mut inner = self.inner.write().await;
            Self::transition(&mut inner, LifecycleEvent::Install)?;
        }
        self.run_install(self.base.clone()).await
    }

    /// Installs a new version while the current one keeps serving.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] for an invalid config and
    /// [`WorkerError::Install`] if precaching fails; in both cases the old
    /// version stays active.
    #[instrument(skip(self, config), fields(version = %config.version))]
    pub async fn update(&self, config: EngineConfig) -> Result<InstallOutcome, WorkerError> {
        config
            .validate()
            .map_err(|e| WorkerError::Config(e.to_string()))?;

        let _guard = self.install_lock.lock().await;
        {
            let mut inner = self.inner.write().await;
            Self::transition(&mut inner, LifecycleEvent::Update)?;
        }
        self.run_install(self.base.for_config(config)).await
    }

    async fn run_install(&self, candidate: EngineContext) -> Result<InstallOutcome, WorkerError> {
        let result = PrecacheLoader::new(candidate.clone()).run().await;

        let action = {
            let mut inner = self.inner.write().await;
            if result.is_ok() {
                let skip_waiting = candidate.config.skip_waiting;
                let action =
                    Self::transition(&mut inner, LifecycleEvent::Installed { skip_waiting })?;
                inner.candidate = Some(candidate);
                action
            } else {
                inner.candidate = None;
                Self::transition(&mut inner, LifecycleEvent::InstallFailed)?
            }
        };

        let install = result.inspect_err(|e| warn!(error = %e, "Install failed"))?;
        info!(stored = install.stored(), "Install complete");

        let activation = match action {
            Action::Activate => Some(self.activate().await?),
            _ => None,
        };
        Ok(InstallOutcome {
            install,
            activation,
        })
    }

    // ========================================================================
    // Activate
    // ========================================================================

    /// Activates the waiting version.
    ///
    /// Deletes every store that does not belong to the waiting version,
    /// then swaps it in and claims open clients.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Activation`] if a stale store cannot be
    /// deleted; the worker stays waiting and the previous version, if any,
    /// keeps serving.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<ActivationReport, WorkerError> {
        let mut inner = self.inner.write().await;
        Self::transition(&mut inner, LifecycleEvent::Activate)?;

        let Some(candidate) = inner.candidate.clone() else {
            return Err(WorkerError::InvalidTransition {
                from: inner.state,
                event: LifecycleEvent::Activate.label().to_string(),
            });
        };

        let stale = match candidate.registry.stale_names().await {
            Ok(stale) => stale,
            Err(e) => {
                Self::transition(&mut inner, LifecycleEvent::ActivationFailed)?;
                return Err(e.into());
            }
        };

        let mut deleted = Vec::with_capacity(stale.len());
        for name in stale {
            if let Err(source) = candidate.registry.delete(&name).await {
                warn!(store = %name, error = %source, "Failed to delete stale store");
                Self::transition(&mut inner, LifecycleEvent::ActivationFailed)?;
                return Err(WorkerError::Activation { name, source });
            }
            info!(store = %name, "Deleted stale store");
            deleted.push(name);
        }

        let version = candidate.config.version.clone();
        let claim_clients = candidate.config.claim_clients;
        inner.active = Some(Arc::new(StrategyExecutor::new(candidate)));
        inner.candidate = None;
        Self::transition(&mut inner, LifecycleEvent::Activated)?;
        drop(inner);

        let claimed = if claim_clients {
            self.clients.claim(&version).await
        } else {
            0
        };

        info!(
            version = %version,
            deleted = deleted.len(),
            claimed,
            "Activated"
        );
        Ok(ActivationReport {
            version,
            deleted,
            claimed,
            finished_at: Utc::now(),
        })
    }

    /// Adopts a version that an earlier run already installed and activated.
    ///
    /// Returns `false`, leaving the worker installing, if the core store of
    /// the configured version does not exist.
    #[instrument(skip(self), fields(version = %self.base.config.version))]
    pub async fn resume(&self) -> Result<bool, WorkerError> {
        let core = self.base.registry.store_name(Namespace::Core).to_string();
        if !self.base.registry.provider().has(&core).await? {
            debug!(store = %core, "No installed version to resume");
            return Ok(false);
        }

        let mut inner = self.inner.write().await;
        Self::transition(&mut inner, LifecycleEvent::Resume)?;
        inner.active = Some(Arc::new(StrategyExecutor::new(self.base.clone())));
        info!("Resumed installed version");
        Ok(true)
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Intercepts one request with the active engine.
    pub async fn handle(&self, request: &Request) -> Interception {
        let inner = self.inner.read().await;
        match &inner.active {
            Some(executor) => executor.handle(request).await,
            None => Interception {
                class: self.classifier.classify(request),
                decision: Decision::PassThrough,
                duration: Duration::ZERO,
            },
        }
    }

    /// Intercepts one request and resolves pass-through on the network.
    ///
    /// # Errors
    ///
    /// Returns the policy or network failure.
    pub async fn serve(&self, request: &Request) -> Result<Response, FetchError> {
        let inner = self.inner.read().await;
        match &inner.active {
            Some(executor) => executor.serve(request).await,
            None => self.base.fetcher.fetch(request).await,
        }
    }

    /// Reads back a pre-built warm-up response by id.
    ///
    /// Returns `None` if nothing is active, the id is unknown, or the
    /// warm-up was not stored.
    pub async fn prebuilt(&self, id: &str) -> Result<Option<CachedResponse>, WorkerError> {
        let inner = self.inner.read().await;
        let Some(executor) = &inner.active else {
            return Ok(None);
        };
        let ctx = executor.context();
        let Some(prebuilt) = ctx.config.prebuilt.iter().find(|p| p.id == id) else {
            return Ok(None);
        };
        let key = prebuilt.key(&ctx.config)?;
        Ok(ctx.registry.match_in(Namespace::Dynamic, &key).await?)
    }
}

impl std::fmt::Debug for WorkerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerController")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFetcher, config, context};
    use async_trait::async_trait;
    use shellcache_core::RequestKey;
    use shellcache_store::{MemoryStoreProvider, StoreError, StoreProvider, StoredEntry};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_requests_pass_through_before_install() {
        let fetcher = Arc::new(MockFetcher::new());
        let controller = WorkerController::new(context(fetcher.clone()));

        let outcome = controller
            .handle(&Request::parse_get("https://bus.example/app.js").unwrap())
            .await;
        assert!(outcome.is_pass_through());
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(controller.state().await, LifecycleState::Installing);
    }

    #[tokio::test]
    async fn test_install_activates_with_skip_waiting() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_manifest();
        let controller = WorkerController::new(context(fetcher));
        controller.clients().open().await;

        let outcome = controller.install().await.unwrap();
        let activation = outcome.activation.unwrap();

        assert_eq!(activation.version.as_str(), "v1");
        assert_eq!(activation.claimed, 1);
        assert_eq!(controller.state().await, LifecycleState::Active);
        assert_eq!(controller.active_version().await.unwrap().as_str(), "v1");
    }

    #[tokio::test]
    async fn test_install_waits_without_skip_waiting() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_manifest();
        let ctx = crate::test_support::context_with(config().with_skip_waiting(false), fetcher);
        let controller = WorkerController::new(ctx);

        let outcome = controller.install().await.unwrap();
        assert!(outcome.activation.is_none());
        assert_eq!(controller.state().await, LifecycleState::Waiting);
        assert!(controller.active_version().await.is_none());

        controller.activate().await.unwrap();
        assert_eq!(controller.state().await, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant() {
        let controller = WorkerController::new(context(Arc::new(MockFetcher::new())));

        let err = controller.install().await.unwrap_err();
        assert!(matches!(err, WorkerError::Install { .. }));
        assert_eq!(controller.state().await, LifecycleState::Redundant);
    }

    #[tokio::test]
    async fn test_activate_without_install_is_rejected() {
        let controller = WorkerController::new(context(Arc::new(MockFetcher::new())));
        let err = controller.activate().await.unwrap_err();
        assert!(matches!(err, WorkerError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_resume_serves_from_existing_stores() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_manifest();
        let ctx = context(fetcher.clone());
        WorkerController::new(ctx.clone()).install().await.unwrap();

        let restarted = WorkerController::new(ctx);
        assert!(restarted.resume().await.unwrap());
        assert_eq!(restarted.state().await, LifecycleState::Active);

        let calls = fetcher.calls();
        let outcome = restarted
            .handle(&Request::parse_get("https://bus.example/manifest.json").unwrap())
            .await;
        assert!(outcome.served().unwrap().is_from_cache());
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn test_resume_without_install_stays_installing() {
        let controller = WorkerController::new(context(Arc::new(MockFetcher::new())));
        assert!(!controller.resume().await.unwrap());
        assert_eq!(controller.state().await, LifecycleState::Installing);
    }

    /// Memory provider whose deletes can be switched off.
    #[derive(Default)]
    struct StuckDeletes {
        inner: MemoryStoreProvider,
        failing: AtomicBool,
    }

    #[async_trait]
    impl StoreProvider for StuckDeletes {
        async fn open(&self, name: &str) -> Result<(), StoreError> {
            self.inner.open(name).await
        }
        async fn has(&self, name: &str) -> Result<bool, StoreError> {
            self.inner.has(name).await
        }
        async fn delete(&self, name: &str) -> Result<bool, StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::LockPoisoned("disk busy".into()));
            }
            self.inner.delete(name).await
        }
        async fn names(&self) -> Result<Vec<String>, StoreError> {
            self.inner.names().await
        }
        async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<StoredEntry>, StoreError> {
            self.inner.get(name, key).await
        }
        async fn put(&self, name: &str, key: &RequestKey, entry: StoredEntry) -> Result<(), StoreError> {
            self.inner.put(name, key, entry).await
        }
        async fn put_existing(
            &self,
            name: &str,
            key: &RequestKey,
            entry: StoredEntry,
        ) -> Result<bool, StoreError> {
            self.inner.put_existing(name, key, entry).await
        }
        async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, StoreError> {
            self.inner.keys(name).await
        }
    }

    #[tokio::test]
    async fn test_failed_collection_keeps_old_version_serving() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_manifest();
        let provider = Arc::new(StuckDeletes::default());
        let controller =
            WorkerController::new(EngineContext::new(config(), fetcher.clone(), provider.clone()));
        controller.install().await.unwrap();

        provider.failing.store(true, Ordering::SeqCst);
        let err = controller.update(config().with_version("v2")).await.unwrap_err();
        assert!(matches!(err, WorkerError::Activation { .. }));
        assert_eq!(controller.state().await, LifecycleState::Waiting);
        assert_eq!(controller.active_version().await.unwrap().as_str(), "v1");

        let calls = fetcher.calls();
        let outcome = controller
            .handle(&Request::parse_get("https://bus.example/manifest.json").unwrap())
            .await;
        assert!(outcome.served().unwrap().is_from_cache());
        assert_eq!(fetcher.calls(), calls);

        provider.failing.store(false, Ordering::SeqCst);
        let activation = controller.activate().await.unwrap();
        assert_eq!(activation.version.as_str(), "v2");
        assert!(activation.deleted.contains(&"bus-core-v1".to_string()));
        assert_eq!(controller.state().await, LifecycleState::Active);
        assert_eq!(controller.active_version().await.unwrap().as_str(), "v2");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_config() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_manifest();
        let controller = WorkerController::new(context(fetcher));
        controller.install().await.unwrap();

        let err = controller.update(config().with_version(" ")).await.unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
        assert_eq!(controller.state().await, LifecycleState::Active);
    }
}
