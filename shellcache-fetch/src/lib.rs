// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # shellcache Fetch
//!
//! Request classification and caching policies for the shellcache engine.
//!
//! ## Host APIs
//!
//! The [`host`] module provides the network capability:
//!
//! - [`host::Fetcher`] - Trait the engine fetches through
//! - [`host::http`] - reqwest-backed fetcher
//! - [`host::offline`] - Fetcher that is always offline
//!
//! ## Interception
//!
//! - [`classify::Classifier`] - Maps a request to its class
//! - [`strategy::CachePolicy`] - Trait for retrieval policies
//! - [`policies`] - Network-first, stale-while-revalidate, cache-first
//! - [`executor::StrategyExecutor`] - Runs one policy per request
//! - [`context::EngineContext`] - Config, fetcher and stores
//!
//! ## Example
//!
//! ```ignore
//! use shellcache_fetch::{EngineConfig, EngineContext, StrategyExecutor};
//!
//! let ctx = EngineContext::builder(EngineConfig::default()).build()?;
//! let executor = StrategyExecutor::new(ctx);
//!
//! let outcome = executor.handle(&request).await;
//! ```

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod host;
pub mod policies;
pub mod strategy;

#[cfg(test)]
mod test_support;

pub use classify::Classifier;
pub use config::{EngineConfig, PrebuiltRequest};
pub use context::{EngineContext, EngineContextBuilder};
pub use error::FetchError;
pub use executor::{Decision, Interception, StrategyExecutor};
pub use host::{Fetcher, HttpFetcher, OfflineFetcher};
pub use policies::{CacheFirst, NetworkFirst, StaleWhileRevalidate};
pub use strategy::{CachePolicy, PolicyKind, ResponseSource, Revalidation, Served};
