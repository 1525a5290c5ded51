//! Request classification result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The class an intercepted request falls into.
///
/// Each class maps to exactly one retrieval policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Full-document navigation; network first, canonical shell fallback.
    Navigation,
    /// Request to a configured remote host; stale-while-revalidate.
    Dynamic,
    /// Same-origin (or unlisted) static asset; cache first.
    StaticSameOrigin,
    /// Non-`GET` request; passed through untouched.
    Uncacheable,
}

impl RequestClass {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Dynamic => "dynamic",
            Self::StaticSameOrigin => "static",
            Self::Uncacheable => "uncacheable",
        }
    }

    /// Returns true if the engine intervenes for this class.
    pub fn is_intercepted(&self) -> bool {
        !matches!(self, Self::Uncacheable)
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
