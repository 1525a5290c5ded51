// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # shellcache Worker
//!
//! The install, activation and serving lifecycle of the shellcache engine.
//!
//! - [`precache::PrecacheLoader`] - Install-time precache of the app shell
//! - [`lifecycle`] - State machine and its pure [`lifecycle::dispatch`]
//! - [`clients::ClientRegistry`] - Open clients and their controlling version
//! - [`controller::WorkerController`] - Runs the lifecycle and serves requests
//!
//! ## Example
//!
//! ```ignore
//! use shellcache_worker::WorkerController;
//!
//! let controller = WorkerController::new(ctx);
//! controller.install().await?;
//!
//! let response = controller.serve(&request).await?;
//! ```

pub mod clients;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod precache;

#[cfg(test)]
mod test_support;

pub use clients::{ClientId, ClientRegistry};
pub use controller::{ActivationReport, InstallOutcome, WorkerController};
pub use error::WorkerError;
pub use lifecycle::{Action, LifecycleEvent, LifecycleState, Transition, dispatch};
pub use precache::{InstallReport, PrecacheLoader, SoftFailure};
