//! Fetch error types.

use shellcache_core::CoreError;
use shellcache_store::StoreError;
use thiserror::Error;

/// Error type for fetch and strategy operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The network is unavailable.
    #[error("Network unavailable")]
    Offline,

    /// Any other network-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// A navigation failed and no fallback shell is stored.
    #[error("Navigation failed and nothing is cached at {key}: {source}")]
    NoFallback {
        /// Canonical entry-point key that was looked up.
        key: String,
        /// The network failure that triggered the fallback.
        #[source]
        source: Box<FetchError>,
    },

    /// Background revalidation task was aborted or panicked.
    #[error("Revalidation task failed: {0}")]
    Revalidation(String),

    /// Request could not be built for the transport.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Core model error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Returns true if this failure came from the network rather than the
    /// engine's own stores or configuration.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            FetchError::Http(_) | FetchError::Timeout(_) | FetchError::Offline | FetchError::Network(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not report the configured duration
            FetchError::Timeout(0)
        } else {
            FetchError::Http(err)
        }
    }
}
