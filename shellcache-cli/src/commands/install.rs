//! Install command - precache the configured version and activate it.

use anyhow::Result;
use clap::Args;
use shellcache_worker::WorkerController;
use tracing::info;

use super::{build_context, load_engine_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the install command.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Install this version instead of the configured one.
    #[arg(long = "tag", value_name = "VERSION")]
    pub version: Option<String>,
}

/// Runs the install command.
pub async fn run(args: &InstallArgs, cli: &Cli) -> Result<ExitCode> {
    let mut config = load_engine_config(cli).await?;
    if let Some(version) = &args.version {
        config = config.with_version(version.as_str());
        config.validate()?;
    }
    info!(app = %config.app_name, version = %config.version, "Installing");

    let controller = WorkerController::new(build_context(cli, config)?);
    let outcome = controller.install().await?;

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_install(&outcome));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_install(&outcome)?);
        }
    }

    Ok(ExitCode::Success)
}
