//! Worker error types.

use shellcache_fetch::FetchError;
use shellcache_store::StoreError;
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Errors from install, activation and update.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A core asset could not be precached; nothing was installed.
    #[error("Install failed at {url}: {reason}")]
    Install {
        /// The asset that failed.
        url: String,
        /// Why it failed.
        reason: String,
    },

    /// A stale store could not be deleted.
    #[error("Activation failed deleting {name}: {source}")]
    Activation {
        /// Store that could not be deleted.
        name: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The event is not valid in the current state.
    #[error("Cannot {event} while {from}")]
    InvalidTransition {
        /// State the worker was in.
        from: LifecycleState,
        /// Event that was rejected.
        event: String,
    },

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Fetch error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

