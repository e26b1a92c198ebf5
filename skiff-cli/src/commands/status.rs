//! `skiff status` — manifest visibility for configured artifacts.
//!
//! Local-only: reads the configuration and the persisted manifest, never the
//! network.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use skiff_core::config::{self, SyncConfig};
use skiff_sync::manifest::{self, format_age, Manifest};

/// Arguments for `skiff status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let config =
            config::load_at(&home).context("failed to load configuration — run `skiff init` first")?;
        let manifest = manifest::load(&config.manifest_path_at(&home))
            .context("failed to load the sync manifest")?;

        let rows = build_rows(&config, &manifest);
        if self.json {
            print_json(&rows)?;
            return Ok(());
        }
        print_table(&config, rows);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ArtifactStatus {
    name: String,
    synced: bool,
    marker: Option<String>,
    last_synced_at: Option<String>,
    last_synced_age: String,
    revision: String,
}

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    artifacts: Vec<ArtifactStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    artifacts: usize,
    synced: usize,
}

#[derive(Serialize)]
struct ArtifactStatusJson {
    name: String,
    state: String,
    source_last_modified: Option<String>,
    last_synced: Option<String>,
    revision: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "artifact")]
    artifact: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "origin marker")]
    marker: String,
    #[tabled(rename = "last sync")]
    last_sync: String,
    #[tabled(rename = "revision")]
    revision: String,
}

fn build_rows(config: &SyncConfig, manifest: &Manifest) -> Vec<ArtifactStatus> {
    config
        .artifacts
        .iter()
        .map(|artifact| {
            let entry = manifest.get(artifact.name.as_str());
            ArtifactStatus {
                name: artifact.name.to_string(),
                synced: entry.is_some(),
                marker: entry.and_then(|e| e.source_last_modified.clone()),
                last_synced_at: entry.map(|e| e.last_synced.to_rfc3339()),
                last_synced_age: entry
                    .map(|e| format_age(e.last_synced))
                    .unwrap_or_else(|| "never".to_string()),
                revision: artifact
                    .revision_or(&config.store.default_revision)
                    .to_string(),
            }
        })
        .collect()
}

fn print_json(rows: &[ArtifactStatus]) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            artifacts: rows.len(),
            synced: rows.iter().filter(|r| r.synced).count(),
        },
        artifacts: rows
            .iter()
            .map(|row| ArtifactStatusJson {
                name: row.name.clone(),
                state: state_key(row.synced).to_string(),
                source_last_modified: row.marker.clone(),
                last_synced: row.last_synced_at.clone(),
                revision: row.revision.clone(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(config: &SyncConfig, rows: Vec<ArtifactStatus>) {
    let synced = rows.iter().filter(|r| r.synced).count();
    println!(
        "skiff v{} | {} -> {} | {} artifacts | {} synced",
        env!("CARGO_PKG_VERSION"),
        config.store.endpoint,
        config.store.repo,
        rows.len(),
        synced,
    );

    if rows.is_empty() {
        println!("No artifacts configured. Edit ~/.skiff/config.yaml.");
        return;
    }

    let needs_sync = rows.len() - synced;
    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            artifact: row.name,
            state: state_indicator(row.synced),
            marker: row.marker.unwrap_or_else(|| "—".to_string()),
            last_sync: row.last_synced_age,
            revision: row.revision,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if needs_sync > 0 {
        println!("Run 'skiff sync --all' to reconcile unsynced artifacts.");
    }
}

fn state_key(synced: bool) -> &'static str {
    if synced {
        "synced"
    } else {
        "never"
    }
}

fn state_indicator(synced: bool) -> String {
    if synced {
        format!("{} SYNCED", "■".green().bold())
    } else {
        format!("{} NEVER SYNCED", "■".bright_black().bold())
    }
}
