//! Config command - manage configuration.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use shellcache_fetch::EngineConfig;
use shellcache_store::{ConfigFormat, default_config_dir, save_json};
use tracing::info;

use super::{config_path, db_path, load_engine_config};
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration and store paths.
    Path,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await?,
        ConfigAction::Path => show_paths(cli)?,
        ConfigAction::Init { force } => init_config(*force, cli).await?,
    }
    Ok(ExitCode::Success)
}

async fn show_config(cli: &Cli) -> Result<()> {
    let config = load_engine_config(cli).await?;

    match cli.format {
        OutputFormat::Text => {
            println!("shellcache Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("App:           {}", config.app_name);
            println!("Version:       {}", config.version);
            println!("Origin:        {}", config.origin);
            println!("Entry point:   {}", config.entry_point);
            println!("Timeout:       {}s", config.fetch_timeout_secs);
            println!("Skip waiting:  {}", config.skip_waiting);
            println!("Claim clients: {}", config.claim_clients);
            println!();
            println!("Core manifest:");
            for entry in &config.manifest {
                println!("  • {entry}");
            }
            if !config.soft_manifest.is_empty() {
                println!("Soft manifest:");
                for entry in &config.soft_manifest {
                    println!("  • {entry}");
                }
            }
            if !config.prebuilt.is_empty() {
                println!("Prebuilt requests:");
                for prebuilt in &config.prebuilt {
                    println!("  • {} {} {}", prebuilt.id, prebuilt.method, prebuilt.url);
                }
            }
            if !config.dynamic_hosts.is_empty() {
                println!("Dynamic hosts:");
                for host in &config.dynamic_hosts {
                    println!("  • {host}");
                }
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = config_path(cli);
    let db_file = db_path(cli);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_file.display());
            println!("Store db:    {}", db_file.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_file.display().to_string(),
                "store_db": db_file.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let path = config_path(cli);

    if ConfigFormat::for_path(&path) != ConfigFormat::Json {
        bail!("config init writes JSON; choose a .json path");
    }
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    save_json(&path, &EngineConfig::default()).await?;

    info!(path = %path.display(), "Config written");
    if !cli.quiet {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
