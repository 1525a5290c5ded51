// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `shellcache` Core
//!
//! Core types for the `shellcache` request-interception cache.
//!
//! This crate holds the models every other crate speaks in. It does no I/O.
//!
//! ## Key Types
//!
//! ### Requests
//! - [`Request`] - An intercepted outgoing request
//! - [`Method`] - HTTP method
//! - [`RequestMode`] - Navigation vs. subresource vs. cross-origin
//! - [`RequestClass`] - Classification result driving policy selection
//!
//! ### Responses
//! - [`Response`] - Network or stored response
//! - [`CachedResponse`] - Immutable stored snapshot
//!
//! ### Stores
//! - [`RequestKey`] - Key a response is stored under
//! - [`Namespace`] - core, dynamic, precache
//! - [`VersionTag`] - Deployment version
//! - [`StoreName`] - Persisted store name

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Requests
    Method,
    Request,
    RequestClass,
    RequestMode,
    // Responses
    CachedResponse,
    Response,
    ResponseType,
    // Stores
    Namespace,
    RequestKey,
    StoreName,
    VersionTag,
};
