//! Intercepted request types.
//!
//! - [`Method`] - HTTP method token
//! - [`RequestMode`] - How the host issued the request (navigation, CORS, ...)
//! - [`Request`] - An outgoing request as seen by the interception point

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::CoreError;

// ============================================================================
// Method
// ============================================================================

/// HTTP request method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Method {
    /// `GET`
    #[default]
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// Any other (extension) method token, stored uppercase.
    Other(String),
}

impl Method {
    /// Returns the canonical uppercase token.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }

    /// Returns true for `GET`, the only method ever used as a store key
    /// outside of install-time warm-up requests.
    pub fn is_get(&self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err(CoreError::InvalidMethod(s.to_string()));
        }
        Ok(match token.as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            _ => Self::Other(token),
        })
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl TryFrom<String> for Method {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Request Mode
// ============================================================================

/// How the host application issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load (address bar, link click, reload).
    Navigate,
    /// Same-origin subresource request.
    #[default]
    SameOrigin,
    /// Cross-origin request with CORS.
    Cors,
    /// Cross-origin request without CORS (opaque response).
    NoCors,
}

impl RequestMode {
    /// Returns true for full-document navigations.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigate)
    }
}

// ============================================================================
// Request
// ============================================================================

/// An outgoing request observed at the interception point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request mode.
    #[serde(default)]
    pub mode: RequestMode,
    /// Request headers (lowercased names).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a request with an explicit method.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` subresource request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a `GET` navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    /// Parses `url` and creates a `GET` request for it.
    pub fn parse_get(url: &str) -> Result<Self, CoreError> {
        Ok(Self::get(Url::parse(url)?))
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds a header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the request host, if the URL has one.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Returns true if the request targets the given origin.
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}

// ============================================================================
// Tests
// ============================================================================
