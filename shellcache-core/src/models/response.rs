//! Response types.
//!
//! - [`Response`] - A response produced by the network or a store
//! - [`ResponseType`] - Provenance of a network response
//! - [`CachedResponse`] - An immutable stored snapshot of a response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::key::RequestKey;
use super::store::StoreName;

// ============================================================================
// Response Type
// ============================================================================

/// Where a network response came from, as far as the requester may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Same-origin response with full access.
    #[default]
    Basic,
    /// Cross-origin response obtained with CORS.
    Cors,
    /// Cross-origin response without CORS; status and body are hidden.
    Opaque,
}

// ============================================================================
// Response
// ============================================================================

/// A response body with status and headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase.
    #[serde(default)]
    pub status_text: String,
    /// Response headers (lowercased names).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    #[serde(default)]
    pub body: Vec<u8>,
    /// Response provenance.
    #[serde(default)]
    pub kind: ResponseType,
}

impl Response {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: body.into(),
            kind: ResponseType::Basic,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body).with_status_text("OK")
    }

    /// Sets the reason phrase.
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Adds a header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the response provenance.
    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for a complete same-origin `200` response.
    pub fn is_complete_basic(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

// ============================================================================
// Cached Response
// ============================================================================

/// A stored snapshot of a response.
///
/// Snapshots are never mutated; a refresh stores a new snapshot at the same
/// key, replacing the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// The stored response.
    pub response: Response,
    /// The key it is stored under.
    pub key: RequestKey,
    /// The store holding it.
    pub store: StoreName,
    /// When it was written.
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Creates a snapshot stamped with the current time.
    pub fn new(response: Response, key: RequestKey, store: StoreName) -> Self {
        Self {
            response,
            key,
            store,
            stored_at: Utc::now(),
        }
    }

    /// Consumes the snapshot, returning the response.
    pub fn into_response(self) -> Response {
        self.response
    }
}

// ============================================================================
// Tests
// ============================================================================
