//! Store identity types.
//!
//! - [`Namespace`] - Which logical store (core, dynamic, precache)
//! - [`VersionTag`] - Deployment version embedded in store names
//! - [`StoreName`] - `{app}-{namespace}-{version}`, the persisted store name

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Namespace
// ============================================================================

/// Logical store namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// App shell assets fetched atomically at install.
    Core,
    /// Runtime-populated entries (API data, fonts, late static assets).
    Dynamic,
    /// Best-effort install-time warm-up entries.
    Precache,
}

impl Namespace {
    /// Returns the lowercase name used in store names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Dynamic => "dynamic",
            Self::Precache => "precache",
        }
    }

    /// Returns all namespaces.
    pub fn all() -> &'static [Namespace] {
        &[Self::Core, Self::Dynamic, Self::Precache]
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(Self::Core),
            "dynamic" => Ok(Self::Dynamic),
            "precache" => Ok(Self::Precache),
            other => Err(CoreError::InvalidStoreName(other.to_string())),
        }
    }
}

// ============================================================================
// Version Tag
// ============================================================================

/// Deployment version identifier.
///
/// Bumping it is the only way to force fresh stores and collect old ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Creates a version tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the tag is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for VersionTag {
    fn default() -> Self {
        Self::new("v1")
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

// ============================================================================
// Store Name
// ============================================================================

/// Fully qualified store name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreName {
    /// Application prefix.
    pub app: String,
    /// Logical namespace.
    pub namespace: Namespace,
    /// Deployment version.
    pub version: VersionTag,
}

impl StoreName {
    /// Creates a store name.
    pub fn new(app: impl Into<String>, namespace: Namespace, version: VersionTag) -> Self {
        Self {
            app: app.into(),
            namespace,
            version,
        }
    }

    /// Parses a persisted name belonging to `app`.
    ///
    /// Returns an error for names with another prefix, an unknown namespace,
    /// or an empty version.
    pub fn parse(app: &str, name: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidStoreName(name.to_string());
        let rest = name
            .strip_prefix(app)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(invalid)?;
        let (namespace, version) = rest.split_once('-').ok_or_else(invalid)?;
        if version.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            app: app.to_string(),
            namespace: namespace.parse()?,
            version: VersionTag::new(version),
        })
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.app, self.namespace, self.version)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_name_display() {
        let name = StoreName::new("kaohsiung-bus", Namespace::Core, VersionTag::from("v1"));
        assert_eq!(name.to_string(), "kaohsiung-bus-core-v1");
    }

    #[test]
    fn test_store_name_parse_roundtrip_with_dashed_version() {
        let name = StoreName::new("app", Namespace::Dynamic, VersionTag::from("2024-06-01"));
        let parsed = StoreName::parse("app", &name.to_string()).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_store_name_parse_rejects_foreign_names() {
        assert!(StoreName::parse("app", "other-core-v1").is_err());
        assert!(StoreName::parse("app", "app-images-v1").is_err());
        assert!(StoreName::parse("app", "app-core-").is_err());
        assert!(StoreName::parse("app", "kaohsiung-bus-v1").is_err());
    }
}
