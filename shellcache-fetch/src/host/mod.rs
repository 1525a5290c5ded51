//! Host network APIs.
//!
//! The engine never talks to the network directly; it goes through a
//! [`Fetcher`] supplied by the host:
//!
//! - [`http`] - reqwest-backed fetcher with tracing and a timeout
//! - [`offline`] - fetcher that always fails, for offline runs

pub mod http;
pub mod offline;

use async_trait::async_trait;
use shellcache_core::{Request, Response};

use crate::error::FetchError;

pub use http::HttpFetcher;
pub use offline::OfflineFetcher;

/// The network-fetch capability.
///
/// A fetch either produces a response (any status) or fails with a
/// network-class [`FetchError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Sends the request and returns the response.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}
