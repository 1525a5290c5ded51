//! Caching policy trait and types.
//!
//! A policy decides how one class of request is answered: from the
//! network, from a store, or both. The executor picks exactly one policy
//! per intercepted request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellcache_core::{CachedResponse, Request, RequestClass, Response, StoreName};
use std::fmt;
use tokio::task::JoinHandle;

use crate::context::EngineContext;
use crate::error::FetchError;

// ============================================================================
// Policy Kind
// ============================================================================

/// The retrieval policy applied to a request class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Network, falling back to the canonical shell.
    NetworkFirst,
    /// Cached value now, refreshed from the network in the background.
    StaleWhileRevalidate,
    /// Any store, then the network.
    CacheFirst,
}

impl PolicyKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
            Self::CacheFirst => "cache-first",
        }
    }

    /// The policy for a request class, or `None` if the request passes
    /// through.
    pub fn for_class(class: RequestClass) -> Option<Self> {
        match class {
            RequestClass::Navigation => Some(Self::NetworkFirst),
            RequestClass::Dynamic => Some(Self::StaleWhileRevalidate),
            RequestClass::StaticSameOrigin => Some(Self::CacheFirst),
            RequestClass::Uncacheable => None,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Served Response
// ============================================================================

/// Where a served response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Live network response.
    Network,
    /// Store hit.
    Cache(StoreName),
    /// Navigation fallback after a network failure.
    Fallback(StoreName),
}

impl ResponseSource {
    /// Short label for reporting.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache(_) => "cache",
            Self::Fallback(_) => "fallback",
        }
    }

    /// The store the response was read from, if any.
    pub fn store(&self) -> Option<&StoreName> {
        match self {
            Self::Network => None,
            Self::Cache(name) | Self::Fallback(name) => Some(name),
        }
    }
}

/// Handle to a background revalidation.
///
/// Dropping the handle does not cancel the refresh.
#[derive(Debug)]
pub struct Revalidation(JoinHandle<Result<Response, FetchError>>);

impl Revalidation {
    /// Wraps a spawned revalidation task.
    pub fn new(handle: JoinHandle<Result<Response, FetchError>>) -> Self {
        Self(handle)
    }

    /// Waits for the network fetch and the store write to finish.
    ///
    /// # Errors
    ///
    /// Returns the network failure, or [`FetchError::Revalidation`] if the
    /// task panicked or was aborted.
    pub async fn settled(self) -> Result<Response, FetchError> {
        self.0
            .await
            .map_err(|e| FetchError::Revalidation(e.to_string()))?
    }
}

/// A response produced by a policy.
#[derive(Debug)]
pub struct Served {
    /// The response handed back to the caller.
    pub response: Response,
    /// Where it came from.
    pub source: ResponseSource,
    /// The policy that produced it.
    pub policy: PolicyKind,
    /// Pending background refresh, if one was started.
    pub revalidation: Option<Revalidation>,
}

impl Served {
    /// A live network response.
    pub fn network(response: Response, policy: PolicyKind) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
            policy,
            revalidation: None,
        }
    }

    /// A store hit.
    pub fn cached(cached: CachedResponse, policy: PolicyKind) -> Self {
        let source = ResponseSource::Cache(cached.store.clone());
        Self {
            response: cached.into_response(),
            source,
            policy,
            revalidation: None,
        }
    }

    /// A navigation fallback.
    pub fn fallback(cached: CachedResponse) -> Self {
        let source = ResponseSource::Fallback(cached.store.clone());
        Self {
            response: cached.into_response(),
            source,
            policy: PolicyKind::NetworkFirst,
            revalidation: None,
        }
    }

    /// Attaches a pending background refresh.
    pub fn with_revalidation(mut self, revalidation: Revalidation) -> Self {
        self.revalidation = Some(revalidation);
        self
    }

    /// Returns true if the response came from a store.
    pub fn is_from_cache(&self) -> bool {
        !matches!(self.source, ResponseSource::Network)
    }
}

// ============================================================================
// Cache Policy Trait
// ============================================================================

/// A retrieval policy for one request class.
///
/// ## Implementing a Policy
///
/// ```ignore
/// struct NetworkOnly;
///
/// #[async_trait]
/// impl CachePolicy for NetworkOnly {
///     fn kind(&self) -> PolicyKind {
///         PolicyKind::NetworkFirst
///     }
///
///     async fn respond(&self, ctx: &EngineContext, request: &Request) -> Result<Served, FetchError> {
///         let response = ctx.fetcher.fetch(request).await?;
///         Ok(Served::network(response, self.kind()))
///     }
/// }
/// ```
#[async_trait]
pub trait CachePolicy: Send + Sync {
    /// The kind of policy; the executor keeps one policy per kind.
    fn kind(&self) -> PolicyKind;

    /// Identifier used in logs.
    fn id(&self) -> &str {
        self.kind().display_name()
    }

    /// Answers an intercepted `GET` request.
    async fn respond(&self, ctx: &EngineContext, request: &Request) -> Result<Served, FetchError>;
}

// ============================================================================
// Tests
// ============================================================================
