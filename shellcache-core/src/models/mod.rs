//! Domain models for shellcache.
//!
//! ## Submodules
//!
//! - [`request`] - Intercepted requests (Method, RequestMode, Request)
//! - [`response`] - Responses and stored snapshots
//! - [`key`] - Store keys
//! - [`store`] - Store identity (Namespace, VersionTag, StoreName)
//! - [`class`] - Request classes

mod class;
mod key;
mod request;
mod response;
mod store;

pub use class::RequestClass;
pub use key::RequestKey;
pub use request::{Method, Request, RequestMode};
pub use response::{CachedResponse, Response, ResponseType};
pub use store::{Namespace, StoreName, VersionTag};
