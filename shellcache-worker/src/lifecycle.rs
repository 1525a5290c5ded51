//! Lifecycle state machine.
//!
//! [`dispatch`] is a pure function from a state and an event to the next
//! state and the action the controller must carry out. It performs no I/O.
//!
//! ```text
//! Installing --Installed--> Waiting --Activated--> Active --Update--> Updating
//!     |                        ^                                        |
//!     +--InstallFailed--> Redundant          +------Installed-----------+
//!                                            Updating --InstallFailed--> Active
//! Installing --Resume--> Active
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkerError;

// ============================================================================
// States
// ============================================================================

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// First install has not completed.
    #[default]
    Installing,
    /// A version is installed and waiting to be activated.
    Waiting,
    /// A version is serving requests.
    Active,
    /// A new version is installing while the old one keeps serving.
    Updating,
    /// The first install failed; nothing will be served.
    Redundant,
}

impl LifecycleState {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Updating => "updating",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Events & Actions
// ============================================================================

/// Something that happened to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Start the first install.
    Install,
    /// A new version was deployed.
    Update,
    /// Precache finished.
    Installed {
        /// Activate without waiting for an explicit request.
        skip_waiting: bool,
    },
    /// Precache failed.
    InstallFailed,
    /// Activation was requested.
    Activate,
    /// Garbage collection and the engine swap finished.
    Activated,
    /// Garbage collection failed.
    ActivationFailed,
    /// A version activated by an earlier run was found on disk.
    Resume,
}

impl LifecycleEvent {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Installed { .. } => "finish install",
            Self::InstallFailed => "fail install",
            Self::Activate => "activate",
            Self::Activated => "finish activation",
            Self::ActivationFailed => "fail activation",
            Self::Resume => "resume",
        }
    }
}

/// What the controller must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run the precache loader for the candidate version.
    RunPrecache,
    /// Start activation immediately.
    Activate,
    /// Hold the installed version until activation is requested.
    AwaitActivation,
    /// Delete stale stores, then swap engines and claim clients.
    CollectGarbage,
    /// Serve with the newly active engine.
    Serve,
    /// Keep serving with the previous engine.
    KeepServing,
    /// Drop the failed candidate.
    Discard,
}

/// Result of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub next: LifecycleState,
    /// Action to carry out.
    pub action: Action,
}

impl Transition {
    fn to(next: LifecycleState, action: Action) -> Self {
        Self { next, action }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Computes the transition for `event` in `state`.
///
/// # Errors
///
/// Returns [`WorkerError::InvalidTransition`] for an event the state does
/// not accept.
pub fn dispatch(state: LifecycleState, event: &LifecycleEvent) -> Result<Transition, WorkerError> {
    use LifecycleEvent as E;
    use LifecycleState as S;

    let transition = match (state, event) {
        (S::Installing | S::Redundant, E::Install) => {
            Transition::to(S::Installing, Action::RunPrecache)
        }
        (S::Active, E::Update) => Transition::to(S::Updating, Action::RunPrecache),

        (S::Installing | S::Updating, E::Installed { skip_waiting }) => {
            let action = if *skip_waiting {
                Action::Activate
            } else {
                Action::AwaitActivation
            };
            Transition::to(S::Waiting, action)
        }
        (S::Installing, E::InstallFailed) => Transition::to(S::Redundant, Action::Discard),
        (S::Updating, E::InstallFailed) => Transition::to(S::Active, Action::KeepServing),

        (S::Waiting, E::Activate) => Transition::to(S::Waiting, Action::CollectGarbage),
        (S::Waiting, E::Activated) => Transition::to(S::Active, Action::Serve),
        (S::Waiting, E::ActivationFailed) => Transition::to(S::Waiting, Action::AwaitActivation),

        (S::Installing, E::Resume) => Transition::to(S::Active, Action::Serve),

        (from, event) => {
            return Err(WorkerError::InvalidTransition {
                from,
                event: event.label().to_string(),
            });
        }
    };
    Ok(transition)
}

// ============================================================================
// Tests
// ============================================================================
