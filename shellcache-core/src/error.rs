//! Core error types for `shellcache`.

use thiserror::Error;

/// Core error type for model construction and parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An HTTP method token was empty or malformed.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// A store name did not follow the `{app}-{namespace}-{version}` layout.
    #[error("Invalid store name: {0}")]
    InvalidStoreName(String),
}
