//! Fetch command - run one request through the engine.

use anyhow::{Result, bail};
use clap::Args;
use shellcache_core::{Method, Request, RequestMode};
use shellcache_fetch::{Decision, EngineConfig};
use shellcache_worker::WorkerController;
use tracing::{debug, info, warn};

use super::{build_context, load_engine_config};
use crate::output::{FetchOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL to request (relative paths resolve against the origin).
    pub url: String,

    /// Request method.
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: Method,

    /// Send as a document navigation.
    #[arg(long)]
    pub navigate: bool,

    /// Request body.
    #[arg(long, short = 'd')]
    pub body: Option<String>,

    /// Extra request header (`Name: value`), repeatable.
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Print the response body.
    #[arg(long)]
    pub show_body: bool,

    /// Exit without waiting for a background refresh.
    #[arg(long)]
    pub no_wait: bool,
}

/// Runs the fetch command.
pub async fn run(args: &FetchArgs, cli: &Cli) -> Result<ExitCode> {
    let config = load_engine_config(cli).await?;
    let request = build_request(args, &config)?;

    let controller = WorkerController::new(build_context(cli, config)?);
    if !controller.resume().await? {
        warn!("No installed version, requests pass through");
    }

    let mut interception = controller.handle(&request).await;
    let revalidation = match &mut interception.decision {
        Decision::Respond(Ok(served)) => served.revalidation.take(),
        _ => None,
    };
    let forwarded = if interception.is_pass_through() {
        Some(controller.serve(&request).await)
    } else {
        None
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_fetch(&request, &interception, args.show_body)
            );
            if let Some(result) = &forwarded {
                println!("{}", formatter.format_forwarded(result, args.show_body));
            }
        }
        OutputFormat::Json => {
            let mut output = FetchOutput::new(&request, &interception, args.show_body);
            if let Some(result) = &forwarded {
                output = output.forwarded(result, args.show_body);
            }
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    if let Some(revalidation) = revalidation.filter(|_| !args.no_wait) {
        match revalidation.settled().await {
            Ok(response) => info!(status = response.status, "Background refresh finished"),
            Err(e) => debug!(error = %e, "Background refresh failed"),
        }
    }

    let failed = interception.error().is_some() || matches!(forwarded, Some(Err(_)));
    Ok(if failed {
        ExitCode::RequestFailed
    } else {
        ExitCode::Success
    })
}

fn build_request(args: &FetchArgs, config: &EngineConfig) -> Result<Request> {
    let mut request = Request::new(args.method.clone(), config.resolve(&args.url)?);
    if args.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }
    for header in &args.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("Invalid header '{header}', expected 'Name: value'");
        };
        request = request.with_header(name.trim(), value.trim());
    }
    if let Some(body) = &args.body {
        request = request.with_body(body.as_bytes());
    }
    Ok(request)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn args(url: &str) -> FetchArgs {
        FetchArgs {
            url: url.to_string(),
            method: Method::Get,
            navigate: false,
            body: None,
            headers: vec![],
            show_body: false,
            no_wait: false,
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::new("bus", Url::parse("https://bus.example/").unwrap())
    }

    #[test]
    fn test_relative_url_resolves_against_origin() {
        let request = build_request(&args("/routes/5"), &config()).unwrap();
        assert_eq!(request.url.as_str(), "https://bus.example/routes/5");
        assert_eq!(request.mode, RequestMode::SameOrigin);
    }

    #[test]
    fn test_navigation_with_headers_and_body() {
        let mut args = args("https://api.example/graphql");
        args.method = Method::Post;
        args.navigate = true;
        args.headers = vec!["Content-Type: application/json".into()];
        args.body = Some("{}".into());

        let request = build_request(&args, &config()).unwrap();
        assert_eq!(request.url.as_str(), "https://api.example/graphql");
        assert_eq!(request.mode, RequestMode::Navigate);
        assert_eq!(request.body.as_deref(), Some(b"{}".as_slice()));
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        let mut args = args("/");
        args.headers = vec!["no-colon".into()];
        assert!(build_request(&args, &config()).is_err());
    }
}
