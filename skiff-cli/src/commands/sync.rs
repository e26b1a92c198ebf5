//! `skiff sync` — reconcile configured artifacts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use skiff_core::config;
use skiff_sync::pipeline::{self, SyncScope};
use skiff_sync::{ArtifactOutcome, RetryPolicy, RunOptions, RunReport, SyncDecision};
use skiff_transport::{HttpOrigin, HubClient};

/// Arguments for `skiff sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Name of the artifact to reconcile (omit when using `--all`).
    pub artifact: Option<String>,

    /// Reconcile every configured artifact.
    #[arg(long, conflicts_with = "artifact")]
    pub all: bool,

    /// Decide without transferring: no network writes, no local file changes.
    #[arg(long)]
    pub dry_run: bool,

    /// Keep local copies after a successful upload.
    #[arg(long)]
    pub keep: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let config =
            config::load_at(&home).context("failed to load configuration — run `skiff init` first")?;

        let scope = if self.all {
            SyncScope::All
        } else {
            let name = self
                .artifact
                .clone()
                .context("provide an artifact name or use --all")?;
            SyncScope::Artifact(name)
        };

        let origin = HttpOrigin::new();
        let store = HubClient::new(
            &config.store.endpoint,
            &config.store.repo,
            std::env::var("SKIFF_HUB_TOKEN").ok(),
        );
        let options = RunOptions {
            dry_run: self.dry_run,
            keep_local: self.keep,
            retry: RetryPolicy::default(),
        };

        let report = pipeline::run(&home, &config, &origin, &store, scope, options)
            .context("sync failed")?;
        print_report(&report, self.dry_run);

        // Partial failure is distinct from a clean run.
        if report.has_failures() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    for outcome in &report.outcomes {
        match outcome {
            ArtifactOutcome::Skipped { name } => {
                println!("{prefix}  ·  {name} — already current");
            }
            ArtifactOutcome::Reused { name } => {
                println!("{prefix}  ⇊  {name} — reused mirror copy");
            }
            ArtifactOutcome::Fetched { name, uploaded } => {
                println!(
                    "{prefix}  ✎  {name} — fetched and uploaded ({} file{})",
                    uploaded.len(),
                    if uploaded.len() == 1 { "" } else { "s" },
                );
            }
            ArtifactOutcome::Uploaded { name, uploaded } => {
                println!("{prefix}  ✎  {name} — uploaded {} file(s)", uploaded.len());
            }
            ArtifactOutcome::WouldTransfer { name, decision } => {
                let verb = match decision {
                    SyncDecision::ReuseMirror => "reuse the mirror copy",
                    _ => "fetch from the origin",
                };
                println!("{prefix}  ~  {name} — would {verb}");
            }
            ArtifactOutcome::Failed { name, stage, error } => {
                println!(
                    "{prefix}  {}  {name} — failed while {stage}: {error}",
                    "✗".red().bold()
                );
            }
        }
    }

    println!(
        "{prefix}✓ {} skipped, {} reused, {} fetched, {} failed",
        report.skipped(),
        report.reused(),
        report.fetched(),
        report.failed_names().len(),
    );
    if report.has_failures() {
        println!(
            "{} {}",
            "Failed artifacts:".red().bold(),
            report.failed_names().join(", ")
        );
    }
}
