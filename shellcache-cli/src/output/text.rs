//! Text output formatting with colors.

use shellcache_core::{Request, RequestClass, Response};
use shellcache_fetch::{Decision, FetchError, Interception, PolicyKind, ResponseSource};
use shellcache_worker::InstallOutcome;

use super::json::StoreOutput;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats an install outcome.
    pub fn format_install(&self, outcome: &InstallOutcome) -> String {
        let install = &outcome.install;
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {}",
            self.bold("Installed"),
            self.cyan(install.version.as_str())
        ));
        lines.push(format!(
            "  {} stored ({} core, {} soft, {} prebuilt) in {}ms",
            install.stored(),
            install.core.len(),
            install.soft.len(),
            install.prebuilt.len(),
            install.duration.as_millis()
        ));
        for key in &install.core {
            lines.push(format!("  {} {}", self.green("✓"), key));
        }
        for key in install.soft.iter().chain(&install.prebuilt) {
            lines.push(format!("  {} {}", self.green("✓"), self.dim(&key.to_string())));
        }
        for failure in &install.failures {
            lines.push(format!(
                "  {} {} {}",
                self.yellow("!"),
                failure.target,
                self.dim(&failure.error)
            ));
        }

        match &outcome.activation {
            Some(activation) => {
                lines.push(format!(
                    "{} {}, {} client{} claimed",
                    self.bold("Activated"),
                    self.cyan(activation.version.as_str()),
                    activation.claimed,
                    if activation.claimed == 1 { "" } else { "s" }
                ));
                for name in &activation.deleted {
                    lines.push(format!("  {} {}", self.red("-"), name));
                }
            }
            None => lines.push(self.yellow("Waiting for activation")),
        }

        lines.join("\n")
    }

    /// Formats the outcome of one request.
    pub fn format_fetch(
        &self,
        request: &Request,
        interception: &Interception,
        include_body: bool,
    ) -> String {
        let mut lines = vec![format!(
            "{} {} {}",
            self.bold(request.method.as_str()),
            request.url,
            self.dim(&format!("({})", interception.class))
        )];

        match &interception.decision {
            Decision::PassThrough => {
                lines.push(format!("  {}", self.dim("pass-through, not intercepted")));
            }
            Decision::Respond(Ok(served)) => {
                lines.push(format!(
                    "  {} {} via {}",
                    self.format_status(served.response.status),
                    self.format_source(&served.source),
                    served.policy
                ));
                lines.push(format!(
                    "  {} bytes in {}ms",
                    served.response.body.len(),
                    interception.duration.as_millis()
                ));
                if include_body {
                    lines.push(String::new());
                    lines.push(served.response.text());
                }
            }
            Decision::Respond(Err(e)) => {
                let policy = PolicyKind::for_class(interception.class)
                    .map_or("engine", |p| p.display_name());
                lines.push(format!("  {} {}: {}", self.red("✗"), policy, e));
            }
        }

        lines.join("\n")
    }

    /// Formats the network result of a pass-through request.
    pub fn format_forwarded(
        &self,
        result: &Result<Response, FetchError>,
        include_body: bool,
    ) -> String {
        match result {
            Ok(response) => {
                let mut line = format!(
                    "  {} network, {} bytes",
                    self.format_status(response.status),
                    response.body.len()
                );
                if include_body {
                    line.push_str("\n\n");
                    line.push_str(&response.text());
                }
                line
            }
            Err(e) => format!("  {} network: {}", self.red("✗"), e),
        }
    }

    /// Formats one classified URL.
    pub fn format_class_line(&self, url: &str, class: RequestClass) -> String {
        let policy = PolicyKind::for_class(class).map_or("pass-through", |p| p.display_name());
        format!("{:<12} {:<24} {}", class.label(), self.dim(policy), url)
    }

    /// Header for the store listing.
    pub fn format_stores_header(&self) -> String {
        self.bold(&format!("{:<40} {:>8}  {}", "Store", "Entries", "Status"))
    }

    /// Formats one store row.
    pub fn format_store_line(&self, store: &StoreOutput) -> String {
        let status = if store.stale {
            self.yellow("stale")
        } else {
            self.green("current")
        };
        format!("{:<40} {:>8}  {}", store.name, store.entries, status)
    }

    fn format_status(&self, status: u16) -> String {
        let text = status.to_string();
        match status {
            200..=299 => self.green(&text),
            0 => self.dim("opaque"),
            _ => self.yellow(&text),
        }
    }

    fn format_source(&self, source: &ResponseSource) -> String {
        match source {
            ResponseSource::Network => "network".to_string(),
            ResponseSource::Cache(name) => format!("cache {}", self.dim(&name.to_string())),
            ResponseSource::Fallback(name) => {
                format!("{} {}", self.yellow("fallback"), self.dim(&name.to_string()))
            }
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
