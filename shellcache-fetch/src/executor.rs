//! Strategy executor: the interception point.
//!
//! The executor classifies each request and hands it to exactly one
//! policy. Uncacheable requests are never looked at again; the host sends
//! them to the network untouched.

use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use shellcache_core::{Request, RequestClass, Response};

use crate::classify::Classifier;
use crate::context::EngineContext;
use crate::error::FetchError;
use crate::policies::{CacheFirst, NetworkFirst, StaleWhileRevalidate};
use crate::strategy::{CachePolicy, PolicyKind, Served};

// ============================================================================
// Interception
// ============================================================================

/// What the executor decided for one request.
#[derive(Debug)]
pub enum Decision {
    /// The engine declined; the request goes to the network unmodified.
    PassThrough,
    /// A policy answered (or failed to).
    Respond(Result<Served, FetchError>),
}

/// The outcome of intercepting one request.
#[derive(Debug)]
pub struct Interception {
    /// How the request was classified.
    pub class: RequestClass,
    /// What happened.
    pub decision: Decision,
    /// Time spent in the engine.
    pub duration: Duration,
}

impl Interception {
    /// Returns true if the engine declined the request.
    pub fn is_pass_through(&self) -> bool {
        matches!(self.decision, Decision::PassThrough)
    }

    /// Returns true if a policy produced a response.
    pub fn is_success(&self) -> bool {
        matches!(self.decision, Decision::Respond(Ok(_)))
    }

    /// Returns the served response, if any.
    pub fn served(&self) -> Option<&Served> {
        match &self.decision {
            Decision::Respond(Ok(served)) => Some(served),
            _ => None,
        }
    }

    /// Returns the policy error, if any.
    pub fn error(&self) -> Option<&FetchError> {
        match &self.decision {
            Decision::Respond(Err(error)) => Some(error),
            _ => None,
        }
    }
}

// ============================================================================
// Strategy Executor
// ============================================================================

/// Dispatches intercepted requests to caching policies.
pub struct StrategyExecutor {
    ctx: EngineContext,
    classifier: Classifier,
    policies: Vec<Box<dyn CachePolicy>>,
}

impl StrategyExecutor {
    /// Creates an executor with the built-in policies.
    pub fn new(ctx: EngineContext) -> Self {
        let classifier = Classifier::from_config(&ctx.config);
        Self {
            ctx,
            classifier,
            policies: vec![
                Box::new(NetworkFirst::new()),
                Box::new(StaleWhileRevalidate::new()),
                Box::new(CacheFirst::new()),
            ],
        }
    }

    /// Replaces the policy of the same kind.
    pub fn with_policy(mut self, policy: Box<dyn CachePolicy>) -> Self {
        self.policies.retain(|p| p.kind() != policy.kind());
        self.policies.push(policy);
        self
    }

    /// Returns the engine context.
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Returns the classifier.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    fn policy(&self, kind: PolicyKind) -> Option<&dyn CachePolicy> {
        self.policies
            .iter()
            .find(|p| p.kind() == kind)
            .map(AsRef::as_ref)
    }

    /// Intercepts one request.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn handle(&self, request: &Request) -> Interception {
        let start = Instant::now();
        let class = self.classifier.classify(request);

        let Some(policy) = PolicyKind::for_class(class).and_then(|kind| self.policy(kind)) else {
            debug!(class = %class, "Passing request through");
            return Interception {
                class,
                decision: Decision::PassThrough,
                duration: start.elapsed(),
            };
        };

        debug!(class = %class, policy = %policy.id(), "Executing policy");
        let result = policy.respond(&self.ctx, request).await;
        let duration = start.elapsed();

        match &result {
            Ok(served) => info!(
                policy = %policy.id(),
                source = served.source.label(),
                status = served.response.status,
                duration = ?duration,
                "Request served"
            ),
            Err(error) => warn!(
                policy = %policy.id(),
                error = %error,
                duration = ?duration,
                "Policy failed"
            ),
        }

        Interception {
            class,
            decision: Decision::Respond(result),
            duration,
        }
    }

    /// Intercepts one request and resolves pass-through on the network.
    ///
    /// # Errors
    ///
    /// Returns the policy failure, or the network failure of a
    /// passed-through request.
    pub async fn serve(&self, request: &Request) -> Result<Response, FetchError> {
        match self.handle(request).await.decision {
            Decision::PassThrough => self.ctx.fetcher.fetch(request).await,
            Decision::Respond(result) => result.map(|served| served.response),
        }
    }
}

impl std::fmt::Debug for StrategyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyExecutor")
            .field("ctx", &self.ctx)
            .field("classifier", &self.classifier)
            .field(
                "policies",
                &self.policies.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
