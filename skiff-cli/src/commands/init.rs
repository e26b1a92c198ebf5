//! `skiff init [--force]` — write a starter configuration.

use anyhow::{Context, Result};
use clap::Args;

use skiff_core::config;

/// Arguments for `skiff init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = config::init(self.force).context("failed to write configuration")?;
        println!("✓ Wrote starter configuration");
        println!("  Saved to: {}", path.display());
        println!("  Edit the store endpoint/repo and artifact set, then run `skiff sync --all`.");
        Ok(())
    }
}
