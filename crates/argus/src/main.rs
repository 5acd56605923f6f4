//! argus - shared folder permission watcher and group share auditor
//!
//! Main entry point for the argus CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod commands;

use commands::{audit, collect, status, watches, Ctx};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// argus - watch shared folders for permission drift
#[derive(Parser)]
#[command(name = "argus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Explicit config file (skips discovery)
    #[arg(long, global = true, env = "ARGUS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one incremental collection pass over all watches
    Collect(collect::CollectArgs),

    /// Group share audit job control
    Audit(audit::AuditArgs),

    /// Show watches, the job slot and recent item statuses
    Status(status::StatusArgs),

    /// List configured watch rows
    Watches(watches::WatchesArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "argus=debug,argus_config=debug,argus_store=debug,argus_resolver=debug,argus_collector=debug,argus_scheduler=debug,argus_audit=debug,info"
    } else {
        "argus=info,argus_config=info,argus_store=info,argus_resolver=info,argus_collector=info,argus_scheduler=info,argus_audit=info,warn"
    };

    let log_dir = argus_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "argus.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "argus=trace,argus_config=trace,argus_store=trace,argus_resolver=trace,argus_collector=trace,argus_scheduler=trace,argus_audit=trace,info",
                )),
        )
        .init();

    let ctx = Ctx::load(cli.config.as_ref())?;

    match &cli.command {
        Commands::Collect(args) => collect::run(&ctx, args),
        Commands::Audit(args) => audit::run(&ctx, args),
        Commands::Status(args) => status::run(&ctx, args),
        Commands::Watches(args) => watches::run(&ctx, args),
    }
}
