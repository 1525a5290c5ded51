// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # shellcache Store
//!
//! Versioned response stores for the shellcache engine.
//!
//! This crate provides:
//!
//! - **StoreProvider**: The persistent key-value store capability
//! - **MemoryStoreProvider** / **SqliteStoreProvider**: Its implementations
//! - **StoreRegistry**: Namespace + version aware open/match/put/delete/list
//! - **Persistence**: Config file I/O helpers and default paths
//!
//! ## Usage
//!
//! ```ignore
//! use shellcache_store::{SqliteStoreProvider, StoreRegistry, default_db_path};
//! use shellcache_core::{Namespace, VersionTag};
//!
//! let provider = Arc::new(SqliteStoreProvider::open(&default_db_path())?);
//! let registry = StoreRegistry::new(provider, "my-app", VersionTag::from("v3"));
//!
//! registry.open(Namespace::Core).await?;
//! let hit = registry.match_any(&key).await?;
//! ```

pub mod error;
pub mod memory;
pub mod persistence;
pub mod provider;
pub mod registry;
pub mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStoreProvider;
pub use persistence::{
    ConfigFormat, default_cache_dir, default_config_dir, default_config_path, default_db_path,
    ensure_dir, load_config, load_config_or_default, load_json, save_json,
};
pub use provider::{StoreProvider, StoredEntry};
pub use registry::StoreRegistry;
pub use sqlite::SqliteStoreProvider;
#[cfg(test)]
mod persistence_tests;
