//! Purge command - delete stores.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::build_registry;
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the purge command.
#[derive(Args, Debug, Default)]
pub struct PurgeArgs {
    /// Only delete stores that do not belong to the configured version.
    #[arg(long)]
    pub stale: bool,
}

/// Runs the purge command.
pub async fn run(args: &PurgeArgs, cli: &Cli) -> Result<ExitCode> {
    let registry = build_registry(cli).await?;
    let targets = if args.stale {
        registry.stale_names().await?
    } else {
        registry.list_namespaces().await?
    };

    let mut deleted = Vec::with_capacity(targets.len());
    for name in targets {
        if registry.delete(&name).await? {
            info!(store = %name, "Deleted store");
            deleted.push(name);
        }
    }

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                for name in &deleted {
                    println!("Deleted {name}");
                }
                println!(
                    "{} store{} deleted",
                    deleted.len(),
                    if deleted.len() == 1 { "" } else { "s" }
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": deleted });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(ExitCode::Success)
}
