//! Stores command - list persisted stores.

use anyhow::Result;
use shellcache_core::StoreName;
use shellcache_store::StoreRegistry;
use tracing::info;

use super::build_registry;
use crate::output::{JsonFormatter, StoreOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the stores command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let registry = build_registry(cli).await?;
    info!(app = %registry.app(), version = %registry.version(), "Listing stores");

    let stores = collect(&registry).await?;

    match cli.format {
        OutputFormat::Text => {
            if stores.is_empty() {
                println!("No stores");
                return Ok(ExitCode::Success);
            }

            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_stores_header());
            println!("{}", "─".repeat(60));
            for store in &stores {
                println!("{}", formatter.format_store_line(store));
            }
            println!();
            println!(
                "Total: {} stores ({} stale)",
                stores.len(),
                stores.iter().filter(|s| s.stale).count()
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&stores)?);
        }
    }

    Ok(ExitCode::Success)
}

/// One row per persisted store, in creation order.
pub async fn collect(registry: &StoreRegistry) -> Result<Vec<StoreOutput>> {
    let stale = registry.stale_names().await?;
    let mut stores = Vec::new();

    for name in registry.list_namespaces().await? {
        let parsed = StoreName::parse(registry.app(), &name).ok();
        stores.push(StoreOutput {
            entries: registry.keys(&name).await?.len(),
            stale: stale.contains(&name),
            namespace: parsed.as_ref().map(|p| p.namespace.to_string()),
            version: parsed.map(|p| p.version.to_string()),
            name,
        });
    }

    Ok(stores)
}

// ============================================================================
// Tests
// ============================================================================
