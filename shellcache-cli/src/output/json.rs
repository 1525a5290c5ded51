//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use shellcache_core::{Request, RequestClass, Response};
use shellcache_fetch::{Decision, FetchError, Interception, PolicyKind};
use shellcache_worker::InstallOutcome;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for an install.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOutput {
    pub version: String,
    pub core: Vec<String>,
    pub soft: Vec<String>,
    pub prebuilt: Vec<String>,
    pub failures: Vec<FailureOutput>,
    pub activated: bool,
    pub deleted: Vec<String>,
    pub claimed: usize,
    #[serde(serialize_with = "serialize_datetime")]
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u128,
}

/// A soft precache failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureOutput {
    pub target: String,
    pub error: String,
}

/// JSON output for one request through the engine.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutput {
    pub method: String,
    pub url: String,
    pub class: RequestClass,
    /// `pass-through`, `served` or `failed`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u128,
}

impl FetchOutput {
    /// Converts the outcome of one request to output.
    pub fn new(request: &Request, interception: &Interception, include_body: bool) -> Self {
        let mut output = Self {
            method: request.method.to_string(),
            url: request.url.to_string(),
            class: interception.class,
            outcome: "pass-through",
            policy: None,
            source: None,
            store: None,
            status: None,
            bytes: None,
            body: None,
            error: None,
            duration_ms: interception.duration.as_millis(),
        };

        match &interception.decision {
            Decision::PassThrough => {}
            Decision::Respond(Ok(served)) => {
                output.outcome = "served";
                output.policy = Some(served.policy.display_name());
                output.source = Some(served.source.label());
                output.store = served.source.store().map(ToString::to_string);
                output.fill_response(&served.response, include_body);
            }
            Decision::Respond(Err(e)) => {
                output.outcome = "failed";
                output.policy = PolicyKind::for_class(interception.class).map(|p| p.display_name());
                output.error = Some(e.to_string());
            }
        }

        output
    }

    /// Adds the network result of a pass-through request.
    pub fn forwarded(mut self, result: &Result<Response, FetchError>, include_body: bool) -> Self {
        self.source = Some("network");
        match result {
            Ok(response) => self.fill_response(response, include_body),
            Err(e) => self.error = Some(e.to_string()),
        }
        self
    }

    fn fill_response(&mut self, response: &Response, include_body: bool) {
        self.status = Some(response.status);
        self.bytes = Some(response.body.len());
        if include_body {
            self.body = Some(response.text());
        }
    }
}

/// JSON output for a classified URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyOutput {
    pub url: String,
    pub class: RequestClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<&'static str>,
}

/// JSON output for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOutput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub entries: usize,
    pub stale: bool,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats an install outcome.
    pub fn format_install(&self, outcome: &InstallOutcome) -> Result<String> {
        self.format(&install_to_output(outcome))
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Converts an install outcome to output.
pub fn install_to_output(outcome: &InstallOutcome) -> InstallOutput {
    let install = &outcome.install;
    let (deleted, claimed) = outcome
        .activation
        .as_ref()
        .map(|a| (a.deleted.clone(), a.claimed))
        .unwrap_or_default();

    InstallOutput {
        version: install.version.to_string(),
        core: install.core.iter().map(ToString::to_string).collect(),
        soft: install.soft.iter().map(ToString::to_string).collect(),
        prebuilt: install.prebuilt.iter().map(ToString::to_string).collect(),
        failures: install
            .failures
            .iter()
            .map(|f| FailureOutput {
                target: f.target.clone(),
                error: f.error.clone(),
            })
            .collect(),
        activated: outcome.activation.is_some(),
        deleted,
        claimed,
        finished_at: outcome
            .activation
            .as_ref()
            .map_or(install.finished_at, |a| a.finished_at),
        duration_ms: install.duration.as_millis(),
    }
}

/// Converts a classified URL to output.
pub fn classify_to_output(url: &str, class: RequestClass) -> ClassifyOutput {
    ClassifyOutput {
        url: url.to_string(),
        class,
        policy: PolicyKind::for_class(class).map(|p| p.display_name()),
    }
}
