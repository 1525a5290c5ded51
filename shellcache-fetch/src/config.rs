//! Engine configuration.
//!
//! One immutable [`EngineConfig`] is built at start-up and shared by every
//! component through an `Arc`.

use serde::{Deserialize, Serialize};
use shellcache_core::{Method, Request, RequestKey, VersionTag};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Origin used when a config file does not name one.
const DEFAULT_ORIGIN: &str = "http://localhost/";

// ============================================================================
// Pre-built Requests
// ============================================================================

/// A known-shape non-`GET` request warmed into the dynamic store at install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrebuiltRequest {
    /// Name the host uses to read the warmed response back.
    pub id: String,
    /// Request method, usually `POST`.
    #[serde(default = "default_prebuilt_method")]
    pub method: Method,
    /// Absolute URL, or a path relative to the origin.
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body text.
    #[serde(default)]
    pub body: String,
}

fn default_prebuilt_method() -> Method {
    Method::Post
}

impl PrebuiltRequest {
    /// Creates a `POST` warm-up request with a body.
    pub fn post(id: impl Into<String>, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: Method::Post,
            url: url.into(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Builds the outgoing request.
    pub fn to_request(&self, config: &EngineConfig) -> Result<Request, FetchError> {
        let url = config.resolve(&self.url)?;
        let mut request = Request::new(self.method.clone(), url).with_body(self.body.as_bytes());
        for (name, value) in &self.headers {
            request = request.with_header(name, value.clone());
        }
        Ok(request)
    }

    /// Literal store key with the method and body folded in.
    pub fn key(&self, config: &EngineConfig) -> Result<RequestKey, FetchError> {
        let url = config.resolve(&self.url)?;
        Ok(RequestKey::prebuilt(
            self.method.clone(),
            &url,
            self.body.as_bytes(),
        ))
    }
}

// ============================================================================
// Engine Config
// ============================================================================

/// Configuration for one deployed version of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix of every store name.
    pub app_name: String,
    /// Deployed version tag.
    pub version: VersionTag,
    /// The application's own origin.
    pub origin: Url,
    /// Canonical entry-point path every navigation falls back to.
    pub entry_point: String,
    /// Core app-shell assets. Install fails if any of them fails.
    pub manifest: Vec<String>,
    /// Best-effort assets (fonts, CDN stylesheets).
    pub soft_manifest: Vec<String>,
    /// Best-effort non-`GET` warm-up queries.
    pub prebuilt: Vec<PrebuiltRequest>,
    /// Remote hosts whose responses are served stale-while-revalidate.
    pub dynamic_hosts: Vec<String>,
    /// Network timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Activate immediately after a successful install.
    pub skip_waiting: bool,
    /// Take control of already-open clients on activation.
    pub claim_clients: bool,
    /// Store non-2xx navigation responses as the fallback shell too.
    pub navigation_cache_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "shellcache".to_string(),
            version: VersionTag::default(),
            origin: default_origin(),
            entry_point: "/index.html".to_string(),
            manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon.ico".to_string(),
            ],
            soft_manifest: Vec::new(),
            prebuilt: Vec::new(),
            dynamic_hosts: Vec::new(),
            fetch_timeout_secs: DEFAULT_TIMEOUT_SECS,
            skip_waiting: true,
            claim_clients: true,
            navigation_cache_errors: true,
        }
    }
}

fn default_origin() -> Url {
    // constant input, cannot fail
    Url::parse(DEFAULT_ORIGIN).unwrap_or_else(|e| panic!("invalid default origin: {e}"))
}

impl EngineConfig {
    /// Creates a config for an application at `origin`.
    pub fn new(app_name: impl Into<String>, origin: Url) -> Self {
        Self {
            app_name: app_name.into(),
            origin,
            ..Default::default()
        }
    }

    /// Sets the version tag.
    pub fn with_version(mut self, version: impl Into<VersionTag>) -> Self {
        self.version = version.into();
        self
    }

    /// Replaces the core manifest.
    pub fn with_manifest<I, S>(mut self, manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = manifest.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the soft manifest.
    pub fn with_soft_manifest<I, S>(mut self, soft: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.soft_manifest = soft.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a pre-built warm-up request.
    pub fn with_prebuilt(mut self, request: PrebuiltRequest) -> Self {
        self.prebuilt.push(request);
        self
    }

    /// Adds a dynamic host.
    pub fn with_dynamic_host(mut self, host: impl Into<String>) -> Self {
        self.dynamic_hosts.push(host.into());
        self
    }

    /// Sets the entry-point path.
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Sets the network timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets whether install activates immediately.
    pub fn with_skip_waiting(mut self, skip: bool) -> Self {
        self.skip_waiting = skip;
        self
    }

    /// Returns the network timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Resolves a manifest entry against the origin.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn resolve(&self, entry: &str) -> Result<Url, FetchError> {
        Ok(self.origin.join(entry)?)
    }

    /// The canonical key every navigation is stored under.
    pub fn entry_point_key(&self) -> Result<RequestKey, FetchError> {
        Ok(RequestKey::get(&self.resolve(&self.entry_point)?))
    }

    /// Checks the config for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] naming the first bad field.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.app_name.trim().is_empty() {
            return Err(FetchError::Config("app_name must not be empty".into()));
        }
        if self.app_name.contains(char::is_whitespace) {
            return Err(FetchError::Config(
                "app_name must not contain whitespace".into(),
            ));
        }
        if self.version.is_blank() {
            return Err(FetchError::Config("version must not be empty".into()));
        }
        if self.origin.cannot_be_a_base() {
            return Err(FetchError::Config(format!(
                "origin {} cannot resolve relative paths",
                self.origin
            )));
        }
        self.entry_point_key().map_err(|e| {
            FetchError::Config(format!("entry_point {:?}: {e}", self.entry_point))
        })?;
        for entry in self.manifest.iter().chain(&self.soft_manifest) {
            self.resolve(entry)
                .map_err(|e| FetchError::Config(format!("manifest entry {entry:?}: {e}")))?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> EngineConfig {
        EngineConfig::new("kaohsiung-bus", Url::parse("https://bus.example/").unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.app_name, "shellcache");
        assert_eq!(config.version.as_str(), "v1");
        assert_eq!(config.entry_point, "/index.html");
        assert_eq!(config.manifest.len(), 4);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.skip_waiting);
        assert!(config.claim_clients);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = app();
        assert_eq!(
            config.resolve("/index.html").unwrap().as_str(),
            "https://bus.example/index.html"
        );
        assert_eq!(
            config
                .resolve("https://fonts.example/css?family=Inter")
                .unwrap()
                .as_str(),
            "https://fonts.example/css?family=Inter"
        );
    }

    #[test]
    fn test_entry_point_key() {
        let key = app().entry_point_key().unwrap();
        assert!(key.is_get());
        assert_eq!(key.url, "https://bus.example/index.html");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut config = app();
        config.app_name = " ".into();
        assert!(matches!(config.validate(), Err(FetchError::Config(_))));

        let config = app().with_version("");
        assert!(matches!(config.validate(), Err(FetchError::Config(_))));
    }

    #[test]
    fn test_prebuilt_key_includes_body() {
        let config = app();
        let a = PrebuiltRequest::post("routes", "https://api.example/graphql", "{\"q\":1}");
        let b = PrebuiltRequest::post("stops", "https://api.example/graphql", "{\"q\":2}");

        let ka = a.key(&config).unwrap();
        let kb = b.key(&config).unwrap();
        assert_eq!(ka.method, Method::Post);
        assert_eq!(ka.url, kb.url);
        assert_ne!(ka, kb);

        let request = a.to_request(&config).unwrap();
        assert_eq!(request.body.as_deref(), Some(&b"{\"q\":1}"[..]));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "app_name": "kaohsiung-bus",
                "version": "v3",
                "origin": "https://bus.example/",
                "dynamic_hosts": ["api.example"],
                "prebuilt": [{"id": "routes", "url": "https://api.example/q", "body": "{}"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.version.as_str(), "v3");
        assert_eq!(config.entry_point, "/index.html");
        assert_eq!(config.prebuilt[0].method, Method::Post);
        assert_eq!(config.dynamic_hosts, vec!["api.example"]);
    }
}
