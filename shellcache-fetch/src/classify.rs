//! Request classification.
//!
//! Every intercepted request maps to exactly one [`RequestClass`]. Rules
//! are evaluated in order and the first match wins:
//!
//! 1. Non-`GET` requests are uncacheable.
//! 2. Navigations use network-first.
//! 3. Requests to a configured dynamic host use stale-while-revalidate.
//! 4. Everything else is served cache-first.

use shellcache_core::{Request, RequestClass};
use tracing::trace;

use crate::config::EngineConfig;

/// Pure request classifier.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    dynamic_hosts: Vec<String>,
}

impl Classifier {
    /// Creates a classifier for the given dynamic hosts.
    pub fn new<I, S>(dynamic_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dynamic_hosts: dynamic_hosts
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Creates a classifier from engine config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.dynamic_hosts.iter().cloned())
    }

    /// Classifies a request.
    pub fn classify(&self, request: &Request) -> RequestClass {
        let class = if !request.method.is_get() {
            RequestClass::Uncacheable
        } else if request.mode.is_navigation() {
            RequestClass::Navigation
        } else if request.host().is_some_and(|h| self.is_dynamic_host(h)) {
            RequestClass::Dynamic
        } else {
            RequestClass::StaticSameOrigin
        };
        trace!(url = %request.url, class = %class, "Classified request");
        class
    }

    /// Returns true if `host` is a dynamic host or a subdomain of one.
    pub fn is_dynamic_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.dynamic_hosts
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shellcache_core::{Method, RequestMode};
    use url::Url;

    fn classifier() -> Classifier {
        Classifier::new(["api.example"])
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_non_get_is_uncacheable_before_anything_else() {
        let c = classifier();
        let post_nav = Request::new(Method::Post, url("https://bus.example/"))
            .with_mode(RequestMode::Navigate);
        let post_api = Request::new(Method::Post, url("https://api.example/q"));
        let head = Request::new(Method::Head, url("https://bus.example/app.js"));

        assert_eq!(c.classify(&post_nav), RequestClass::Uncacheable);
        assert_eq!(c.classify(&post_api), RequestClass::Uncacheable);
        assert_eq!(c.classify(&head), RequestClass::Uncacheable);
    }

    #[test]
    fn test_navigation_wins_over_dynamic_host() {
        let c = classifier();
        let nav = Request::navigate(url("https://api.example/"));
        assert_eq!(c.classify(&nav), RequestClass::Navigation);
    }

    #[test]
    fn test_dynamic_host_and_subdomain() {
        let c = classifier();
        assert_eq!(
            c.classify(&Request::get(url("https://api.example/routes"))),
            RequestClass::Dynamic
        );
        assert_eq!(
            c.classify(&Request::get(url("https://v2.API.example/routes"))),
            RequestClass::Dynamic
        );
        assert_eq!(
            c.classify(&Request::get(url("https://notapi.example/routes"))),
            RequestClass::StaticSameOrigin
        );
    }

    #[test]
    fn test_everything_else_is_static() {
        let c = classifier();
        assert_eq!(
            c.classify(&Request::get(url("https://bus.example/app.css"))),
            RequestClass::StaticSameOrigin
        );
        assert_eq!(
            Classifier::default().classify(&Request::get(url("https://api.example/routes"))),
            RequestClass::StaticSameOrigin
        );
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig::default().with_dynamic_host("tdx.example");
        let c = Classifier::from_config(&config);
        assert!(c.is_dynamic_host("tdx.example"));
        assert!(!c.is_dynamic_host("example"));
    }
}
