//! Shared sync pipeline entrypoint used by the CLI.

use std::path::Path;

use skiff_core::config::SyncConfig;
use skiff_core::remote::{MirrorClient, OriginClient};

use crate::runner::{ArtifactOutcome, RunOptions, RunReport, SyncRunner};
use crate::SyncError;

/// Scope for a sync pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    /// Reconcile every configured artifact.
    All,
    /// Reconcile a single named artifact.
    Artifact(String),
    /// Push a single artifact's existing local bytes, no freshness checks.
    UploadOnly(String),
}

/// Run the sync pipeline for a scope.
///
/// This is the canonical entrypoint for `skiff sync` and `skiff upload`.
pub fn run(
    home: &Path,
    config: &SyncConfig,
    origin: &dyn OriginClient,
    store: &dyn MirrorClient,
    scope: SyncScope,
    options: RunOptions,
) -> Result<RunReport, SyncError> {
    let runner = SyncRunner::new(home, config, origin, store, options);
    match scope {
        SyncScope::All => {
            let artifacts: Vec<&_> = config.artifacts.iter().collect();
            runner.run(&artifacts)
        }
        SyncScope::Artifact(name) => {
            let artifact = config
                .artifact(&name)
                .ok_or(SyncError::UnknownArtifact(name))?;
            runner.run(&[artifact])
        }
        SyncScope::UploadOnly(name) => {
            let artifact = config
                .artifact(&name)
                .ok_or(SyncError::UnknownArtifact(name))?;
            let report = runner.upload_only(artifact)?;
            Ok(RunReport {
                outcomes: vec![ArtifactOutcome::Uploaded {
                    name: artifact.name.clone(),
                    uploaded: report.uploaded,
                }],
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
