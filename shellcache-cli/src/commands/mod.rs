//! CLI command implementations.

pub mod classify;
pub mod config;
pub mod fetch;
pub mod install;
pub mod purge;
pub mod stores;

use anyhow::{Context, Result, bail};
use shellcache_fetch::{EngineConfig, EngineContext, Fetcher, HttpFetcher, OfflineFetcher};
use shellcache_store::{
    SqliteStoreProvider, StoreProvider, StoreRegistry, default_config_path, default_db_path,
    load_config,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::Cli;

// ============================================================================
// Shared Setup
// ============================================================================

/// Config file the CLI reads: `--config` or the default path.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(default_config_path)
}

/// Store database the CLI opens: `--db` or the default path.
pub fn db_path(cli: &Cli) -> PathBuf {
    cli.db.clone().unwrap_or_else(default_db_path)
}

/// Loads and validates the engine config.
///
/// A missing default config falls back to built-in defaults; a missing
/// `--config` file is an error.
pub async fn load_engine_config(cli: &Cli) -> Result<EngineConfig> {
    let path = config_path(cli);
    let config = if path.exists() {
        load_config::<EngineConfig>(&path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?
    } else if cli.config.is_some() {
        bail!("Config file not found: {}", path.display());
    } else {
        debug!(path = %path.display(), "No config file, using defaults");
        EngineConfig::default()
    };

    config.validate()?;
    Ok(config)
}

/// Opens the persistent store provider.
pub fn open_provider(cli: &Cli) -> Result<Arc<dyn StoreProvider>> {
    let path = db_path(cli);
    let provider = SqliteStoreProvider::open(&path)
        .with_context(|| format!("Failed to open store database {}", path.display()))?;
    Ok(Arc::new(provider))
}

/// Builds the network fetcher, honouring `--offline`.
pub fn build_fetcher(cli: &Cli, config: &EngineConfig) -> Result<Arc<dyn Fetcher>> {
    if cli.offline {
        return Ok(Arc::new(OfflineFetcher::new()));
    }
    Ok(Arc::new(HttpFetcher::new(
        config.origin.clone(),
        config.timeout(),
    )?))
}

/// Builds an engine context over the persistent stores.
pub fn build_context(cli: &Cli, config: EngineConfig) -> Result<EngineContext> {
    let fetcher = build_fetcher(cli, &config)?;
    let provider = open_provider(cli)?;

    Ok(EngineContext::builder(config)
        .fetcher(fetcher)
        .provider(provider)
        .build()?)
}

/// Registry for the configured app and version, without a fetcher.
pub async fn build_registry(cli: &Cli) -> Result<StoreRegistry> {
    let config = load_engine_config(cli).await?;
    let provider = open_provider(cli)?;
    Ok(StoreRegistry::new(
        provider,
        config.app_name.clone(),
        config.version.clone(),
    ))
}
