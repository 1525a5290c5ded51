//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store does not exist.
    #[error("Store not found: {0}")]
    NotFound(String),

    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Model error (bad store name, bad method in a stored row, ...).
    #[error("Core error: {0}")]
    Core(#[from] shellcache_core::CoreError),

    /// A stored row could not be decoded.
    #[error("Corrupt entry: {0}")]
    Corrupt(String),

    /// Connection mutex poisoned by a panicking writer.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Blocking store task panicked or was cancelled.
    #[error("Store task failed: {0}")]
    TaskFailed(String),
}
