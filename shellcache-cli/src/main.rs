// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! shellcache CLI - drive the request interception cache from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Install and activate the configured version
//! shellcache install
//!
//! # Run one request through the engine
//! shellcache fetch https://bus.example/index.html --navigate
//!
//! # Same, without touching the network
//! shellcache --offline fetch https://bus.example/routes/5 --navigate
//!
//! # Which policy would handle these?
//! shellcache classify https://api.example/eta https://bus.example/app.css
//!
//! # List stores, JSON output
//! shellcache stores --format json --pretty
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{classify, config, fetch, install, purge, stores};

// ============================================================================
// CLI Definition
// ============================================================================

/// shellcache CLI - offline request interception cache.
#[derive(Parser)]
#[command(name = "shellcache")]
#[command(about = "Offline request interception cache CLI")]
#[command(long_about = r#"
shellcache precaches an app shell into versioned stores and answers
requests with one of three policies:

  • navigation  network-first, falls back to the stored shell
  • dynamic     stale-while-revalidate
  • static      cache-first

Non-GET requests always go to the network.

Examples:
  shellcache install                     # Precache + activate
  shellcache fetch <url> --navigate      # One request through the engine
  shellcache classify <url>...           # Show request classes
  shellcache stores                      # List stores
  shellcache config init                 # Write a default config
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, lists stores.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (JSON or YAML).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// SQLite store database.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Never touch the network; every fetch fails as offline.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Precache the configured version and activate it.
    #[command(visible_alias = "i")]
    Install(install::InstallArgs),

    /// Run one request through the engine.
    #[command(visible_alias = "f")]
    Fetch(fetch::FetchArgs),

    /// Show how URLs would be classified.
    Classify(classify::ClassifyArgs),

    /// List stores with entry counts.
    #[command(visible_alias = "s")]
    Stores,

    /// Delete every store.
    Purge(purge::PurgeArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The request could not be answered.
    RequestFailed = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("shellcache=debug,info")
    } else {
        EnvFilter::new("shellcache=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Install(args)) => install::run(args, &cli).await,
        Some(Commands::Fetch(args)) => fetch::run(args, &cli).await,
        Some(Commands::Classify(args)) => classify::run(args, &cli).await,
        Some(Commands::Stores) | None => stores::run(&cli).await,
        Some(Commands::Purge(args)) => purge::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
    };

    match result {
        Ok(code) => {
            if !matches!(code, ExitCode::Success) {
                std::process::exit(code as i32);
            }
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }

    Ok(())
}
