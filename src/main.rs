//! # Goopss CLI (`goopss`)
//!
//! ## Usage
//!
//! ```bash
//! goopss --config ./config/goopss.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `goopss listings <owner>` | Reconciled listings of a shop |
//! | `goopss tasks <owner>` | Completed tasks per category |
//! | `goopss sources` | Configured sources and their health |
//! | `goopss serve` | Start the HTTP API |
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr so
//! `--json` output stays clean.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use goopss_harness::{config, listings, server, sources, tasks};

/// Goopss: listing-optimization reconciliation and task summaries.
#[derive(Parser)]
#[command(
    name = "goopss",
    about = "Goopss: listing-optimization reconciliation and task summaries",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/goopss.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a shop's listings merged with their optimization records.
    Listings {
        /// Shop / owner identifier.
        owner: String,

        /// Only print listings that have an optimization record.
        #[arg(long)]
        only_optimized: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Count a customer's completed tasks per category.
    ///
    /// `--since` and `--until` are exclusive bounds and must be given together.
    Tasks {
        /// Customer identifier.
        owner: String,

        /// Lower bound (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Upper bound (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        until: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List configured sources and their status.
    Sources,

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Listings {
            owner,
            only_optimized,
            json,
        } => {
            let sources = sources::build_sources(&cfg)?;
            listings::run_listings(&sources, &owner, only_optimized, json).await?;
        }
        Commands::Tasks {
            owner,
            since,
            until,
            json,
        } => {
            let sources = sources::build_sources(&cfg)?;
            tasks::run_tasks(&sources, &owner, since.as_deref(), until.as_deref(), json).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
