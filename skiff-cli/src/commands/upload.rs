//! `skiff upload <artifact>` — push existing local bytes, no freshness checks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use skiff_core::config;
use skiff_sync::pipeline::{self, SyncScope};
use skiff_sync::{ArtifactOutcome, RetryPolicy, RunOptions};
use skiff_transport::{HttpOrigin, HubClient};

/// Arguments for `skiff upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Name of the artifact whose local copy should be uploaded.
    pub artifact: String,

    /// Plan the upload without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl UploadArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let config =
            config::load_at(&home).context("failed to load configuration — run `skiff init` first")?;

        let origin = HttpOrigin::new();
        let store = HubClient::new(
            &config.store.endpoint,
            &config.store.repo,
            std::env::var("SKIFF_HUB_TOKEN").ok(),
        );
        let options = RunOptions {
            dry_run: self.dry_run,
            keep_local: true,
            retry: RetryPolicy::default(),
        };

        let report = pipeline::run(
            &home,
            &config,
            &origin,
            &store,
            SyncScope::UploadOnly(self.artifact.clone()),
            options,
        )
        .with_context(|| format!("upload failed for '{}'", self.artifact))?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        for outcome in &report.outcomes {
            if let ArtifactOutcome::Uploaded { name, uploaded } = outcome {
                println!("{prefix}✓ '{name}' uploaded as:");
                for path in uploaded {
                    println!("{prefix}  ✎  {path}");
                }
            }
        }
        Ok(())
    }
}
