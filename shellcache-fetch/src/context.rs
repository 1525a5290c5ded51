//! Engine context giving policies access to host APIs.
//!
//! The context bundles everything a caching policy touches: the immutable
//! config, the network fetcher and the store registry for the configured
//! version. It is cheap to clone, so background revalidation tasks take
//! their own copy.

use std::sync::Arc;

use shellcache_store::{MemoryStoreProvider, StoreProvider, StoreRegistry};

use crate::config::EngineConfig;
use crate::error::FetchError;
use crate::host::{Fetcher, HttpFetcher};

// ============================================================================
// Engine Context
// ============================================================================

/// Context provided to caching policies.
#[derive(Clone)]
pub struct EngineContext {
    /// Engine configuration.
    pub config: Arc<EngineConfig>,
    /// Network fetcher.
    pub fetcher: Arc<dyn Fetcher>,
    /// Stores for the configured version.
    pub registry: StoreRegistry,
}

impl EngineContext {
    /// Creates a context over an existing fetcher and store provider.
    pub fn new(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        provider: Arc<dyn StoreProvider>,
    ) -> Self {
        let registry = StoreRegistry::new(provider, config.app_name.clone(), config.version.clone());
        Self {
            config: Arc::new(config),
            fetcher,
            registry,
        }
    }

    /// Creates a builder for customizing the context.
    pub fn builder(config: EngineConfig) -> EngineContextBuilder {
        EngineContextBuilder::new(config)
    }

    /// Returns a context for another config sharing this fetcher and
    /// store provider.
    pub fn for_config(&self, config: EngineConfig) -> Self {
        Self::new(
            config,
            Arc::clone(&self.fetcher),
            Arc::clone(self.registry.provider()),
        )
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Engine Context Builder
// ============================================================================

/// Builder for constructing an `EngineContext`.
pub struct EngineContextBuilder {
    config: EngineConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    provider: Option<Arc<dyn StoreProvider>>,
}

impl EngineContextBuilder {
    /// Creates a new builder.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            fetcher: None,
            provider: None,
        }
    }

    /// Sets the network fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the store provider.
    pub fn provider(mut self, provider: Arc<dyn StoreProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Builds the context.
    ///
    /// Without an explicit fetcher an [`HttpFetcher`] for the configured
    /// origin is created; without a provider stores live in memory.
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or the HTTP client cannot be
    /// built.
    pub fn build(self) -> Result<EngineContext, FetchError> {
        self.config.validate()?;
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(
                self.config.origin.clone(),
                self.config.timeout(),
            )?),
        };
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(MemoryStoreProvider::new()));
        Ok(EngineContext::new(self.config, fetcher, provider))
    }
}

// ============================================================================
// Tests
// ============================================================================
