//! Store keys.
//!
//! A [`RequestKey`] is derived from method + absolute URL. Only `GET`
//! requests produce keys on the request path; the single exception is
//! [`RequestKey::prebuilt`], which the install-time loader uses for
//! warm-up queries with a body baked into the key.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::request::{Method, Request};

/// Key of a stored response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Request method.
    pub method: Method,
    /// Absolute URL with the fragment removed.
    pub url: String,
    /// Opaque variant discriminator (body digest for prebuilt keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl RequestKey {
    /// Key for a `GET` of the given URL.
    pub fn get(url: &Url) -> Self {
        Self {
            method: Method::Get,
            url: strip_fragment(url),
            variant: None,
        }
    }

    /// Key for an intercepted request, or `None` for anything but `GET`.
    pub fn for_request(request: &Request) -> Option<Self> {
        request
            .method
            .is_get()
            .then(|| Self::get(&request.url))
    }

    /// Literal key for a pre-built non-`GET` request.
    ///
    /// The body is folded into the key as a SHA-256 digest so two warm-up
    /// queries against the same endpoint stay distinct.
    pub fn prebuilt(method: Method, url: &Url, body: &[u8]) -> Self {
        let digest = digest::digest(&digest::SHA256, body);
        Self {
            method,
            url: strip_fragment(url),
            variant: Some(URL_SAFE_NO_PAD.encode(digest.as_ref())),
        }
    }

    /// Returns true for a plain `GET` key.
    pub fn is_get(&self) -> bool {
        self.method.is_get() && self.variant.is_none()
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{} {} [{}]", self.method, self.url, variant),
            None => write!(f, "{} {}", self.method, self.url),
        }
    }
}

fn strip_fragment(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

// ============================================================================
// Tests
// ============================================================================
