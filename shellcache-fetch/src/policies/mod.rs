//! The built-in caching policies.
//!
//! - [`NetworkFirst`] for navigations
//! - [`StaleWhileRevalidate`] for dynamic hosts
//! - [`CacheFirst`] for static assets

pub mod cache_first;
pub mod network_first;
pub mod stale_while_revalidate;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::StaleWhileRevalidate;
