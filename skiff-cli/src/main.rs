//! Skiff — mirror periodic data dumps into a managed dataset hub.
//!
//! # Usage
//!
//! ```text
//! skiff init [--force]
//! skiff sync <artifact> [--dry-run] [--keep]
//! skiff sync --all [--dry-run] [--keep]
//! skiff upload <artifact> [--dry-run]
//! skiff status [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, status::StatusArgs, sync::SyncArgs, upload::UploadArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "skiff",
    version,
    about = "Mirror periodic data dumps into a managed dataset hub",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter configuration to ~/.skiff/config.yaml.
    Init(InitArgs),

    /// Reconcile configured artifacts against the origin and the hub.
    Sync(SyncArgs),

    /// Push an artifact's existing local bytes without freshness checks.
    Upload(UploadArgs),

    /// Show manifest state for the configured artifacts.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Upload(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
