//! Per-artifact reconciliation workflow.
//!
//! Each artifact moves through `Checking → Deciding → Acting → Recording`;
//! a failure at any stage marks that artifact `Failed` — logged with stage
//! and cause — and the run moves on to the next one. Only a corrupt
//! manifest and the final manifest upload are run-fatal.
//!
//! The manifest document is saved after every successful Recording, so a
//! terminated run keeps the entries of every artifact that completed.

use std::fmt;
use std::fs;
use std::path::Path;

use skiff_core::config::SyncConfig;
use skiff_core::remote::{MirrorClient, OriginClient};
use skiff_core::types::{ArtifactName, ArtifactSpec};

use crate::chunker::{self, UploadReport};
use crate::error::{io_err, SyncError};
use crate::freshness::{self, MirrorState, SyncDecision};
use crate::manifest::{self, Manifest};
use crate::retry::RetryPolicy;

/// Synthetic origin marker used when a dry run never contacts the origin.
pub const DRY_RUN_MARKER: &str = "<dry-run>";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Workflow stage an artifact failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checking,
    Deciding,
    Acting,
    Recording,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Checking => write!(f, "checking"),
            Stage::Deciding => write!(f, "deciding"),
            Stage::Acting => write!(f, "acting"),
            Stage::Recording => write!(f, "recording"),
        }
    }
}

/// How one artifact's workflow ended.
#[derive(Debug)]
pub enum ArtifactOutcome {
    /// Local copy already current; nothing moved.
    Skipped { name: ArtifactName },
    /// The hub's copy was current and was downloaded into the working area.
    Reused { name: ArtifactName },
    /// Fetched from the origin and uploaded (possibly in parts).
    Fetched {
        name: ArtifactName,
        uploaded: Vec<String>,
    },
    /// Upload-only: existing local bytes pushed without freshness checks.
    Uploaded {
        name: ArtifactName,
        uploaded: Vec<String>,
    },
    /// Dry run: the decision that a real run would act on.
    WouldTransfer {
        name: ArtifactName,
        decision: SyncDecision,
    },
    Failed {
        name: ArtifactName,
        stage: Stage,
        error: SyncError,
    },
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ArtifactOutcome::Skipped { .. }))
    }

    pub fn reused(&self) -> usize {
        self.count(|o| matches!(o, ArtifactOutcome::Reused { .. }))
    }

    pub fn fetched(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                ArtifactOutcome::Fetched { .. } | ArtifactOutcome::Uploaded { .. }
            )
        })
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ArtifactOutcome::Failed { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_names().is_empty()
    }

    fn count(&self, pred: impl Fn(&ArtifactOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Caller-selected behavior for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Decide only: no network writes, no filesystem mutation.
    pub dry_run: bool,
    /// Keep local copies after a successful upload.
    pub keep_local: bool,
    pub retry: RetryPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            keep_local: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// The explicit, always-initialized outcome of a reuse attempt; the fetch
/// decision consumes this instead of a branch-conditional binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReuseOutcome {
    NotAttempted,
    Downloaded,
    FellBack,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Drives the per-artifact workflow against the configured collaborators.
pub struct SyncRunner<'a> {
    home: &'a Path,
    config: &'a SyncConfig,
    origin: &'a dyn OriginClient,
    store: &'a dyn MirrorClient,
    options: RunOptions,
}

impl<'a> SyncRunner<'a> {
    pub fn new(
        home: &'a Path,
        config: &'a SyncConfig,
        origin: &'a dyn OriginClient,
        store: &'a dyn MirrorClient,
        options: RunOptions,
    ) -> Self {
        Self {
            home,
            config,
            origin,
            store,
            options,
        }
    }

    /// Reconcile `artifacts` sequentially, then persist and upload the
    /// manifest. Per-artifact failures are folded into the report; manifest
    /// corruption and the final manifest upload are the only run-fatal paths.
    pub fn run(&self, artifacts: &[&ArtifactSpec]) -> Result<RunReport, SyncError> {
        let manifest_path = self.config.manifest_path_at(self.home);
        let mut manifest = manifest::load(&manifest_path)?;

        let mut outcomes = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            tracing::info!("checking {}", artifact.name);
            let outcome = match self.sync_artifact(&mut manifest, &manifest_path, artifact) {
                Ok(outcome) => outcome,
                Err((stage, error)) => {
                    tracing::warn!("{}: failed while {stage}: {error}", artifact.name);
                    ArtifactOutcome::Failed {
                        name: artifact.name.clone(),
                        stage,
                        error,
                    }
                }
            };
            outcomes.push(outcome);
        }

        if !self.options.dry_run {
            manifest::save(&manifest_path, &manifest)?;
            self.upload_manifest(&manifest_path)?;
        }

        Ok(RunReport { outcomes })
    }

    /// Push an artifact's existing local bytes through the chunker without
    /// freshness checks. The manifest is deliberately not touched: this is
    /// an operator escape hatch for re-pushing bytes.
    pub fn upload_only(&self, artifact: &ArtifactSpec) -> Result<UploadReport, SyncError> {
        let local = self.config.local_path_at(self.home, artifact);
        if !local.exists() {
            return Err(SyncError::MissingLocalFile { path: local });
        }
        let revision = artifact.revision_or(&self.config.store.default_revision);
        if !self.options.dry_run {
            self.ensure_revision(revision)?;
        }
        tracing::info!(
            "{}: uploading local copy without freshness bookkeeping",
            artifact.name
        );
        chunker::upload_file(
            self.store,
            &self.options.retry,
            &local,
            &artifact.repo_path,
            revision,
            &format!("Sync {}", artifact.name),
            self.config.chunk_size,
            self.options.dry_run,
        )
    }

    // -- per-artifact workflow ---------------------------------------------

    fn sync_artifact(
        &self,
        manifest: &mut Manifest,
        manifest_path: &Path,
        artifact: &ArtifactSpec,
    ) -> Result<ArtifactOutcome, (Stage, SyncError)> {
        let name = &artifact.name;
        let local = self.config.local_path_at(self.home, artifact);
        let revision = artifact.revision_or(&self.config.store.default_revision);

        // Checking: the origin's freshness header, through retry. Exhaustion
        // is fatal for this artifact only.
        let origin_marker = if self.options.dry_run {
            Some(DRY_RUN_MARKER.to_string())
        } else {
            self.options
                .retry
                .run(&format!("HEAD {}", artifact.url), || {
                    self.origin.head(&artifact.url)
                })
                .map_err(|e| {
                    (
                        Stage::Checking,
                        SyncError::OriginUnreachable {
                            url: artifact.url.clone(),
                            source: e,
                        },
                    )
                })?
        };

        // Deciding. An origin that reports no marker cannot be compared and
        // is treated as changed.
        let decision = match origin_marker.as_deref() {
            Some(marker) => freshness::resolve(
                name.as_str(),
                marker,
                manifest.marker(name.as_str()),
                local.exists(),
                || self.mirror_state(artifact, revision),
            ),
            None => {
                tracing::info!("{name}: origin reports no modification marker; treating as changed");
                SyncDecision::FetchOrigin
            }
        };
        tracing::info!("{name}: decision {decision:?}");

        if self.options.dry_run {
            return Ok(match decision {
                SyncDecision::Skip => ArtifactOutcome::Skipped { name: name.clone() },
                decision => ArtifactOutcome::WouldTransfer {
                    name: name.clone(),
                    decision,
                },
            });
        }

        // Acting.
        let work_dir = self.config.work_dir_at(self.home);
        fs::create_dir_all(&work_dir).map_err(|e| (Stage::Acting, io_err(&work_dir, e)))?;

        let reuse = match decision {
            SyncDecision::ReuseMirror => self.try_reuse(artifact, revision, &local),
            _ => ReuseOutcome::NotAttempted,
        };

        let fetch_needed =
            decision == SyncDecision::FetchOrigin || reuse == ReuseOutcome::FellBack;
        let mut uploaded = Vec::new();
        if fetch_needed {
            self.fetch_origin(artifact, &local)
                .map_err(|e| (Stage::Acting, e))?;
            self.ensure_revision(revision)
                .map_err(|e| (Stage::Acting, e))?;
            let report = chunker::upload_file(
                self.store,
                &self.options.retry,
                &local,
                &artifact.repo_path,
                revision,
                &format!("Sync {name}"),
                self.config.chunk_size,
                false,
            )
            .map_err(|e| (Stage::Acting, e))?;
            uploaded = report.uploaded;
        }

        // Recording: the manifest reflects this artifact as of now, durably.
        manifest.record_sync(name.as_str(), origin_marker.as_deref(), name.as_str());
        manifest::save(manifest_path, manifest).map_err(|e| (Stage::Recording, e))?;

        // Retention: drop bytes this run produced unless told otherwise.
        let produced_local = fetch_needed || reuse == ReuseOutcome::Downloaded;
        if produced_local && !self.options.keep_local && !artifact.retain {
            if let Err(e) = fs::remove_file(&local) {
                tracing::warn!("{name}: could not remove local copy: {e}");
            }
        }

        Ok(if fetch_needed {
            ArtifactOutcome::Fetched {
                name: name.clone(),
                uploaded,
            }
        } else if reuse == ReuseOutcome::Downloaded {
            ArtifactOutcome::Reused { name: name.clone() }
        } else {
            ArtifactOutcome::Skipped { name: name.clone() }
        })
    }

    /// The hub's knowledge of this artifact. Lookup exhaustion degrades to
    /// `Absent` — the one place retry exhaustion is not surfaced, per the
    /// freshness contract.
    fn mirror_state(&self, artifact: &ArtifactSpec, revision: &str) -> MirrorState {
        if self.options.dry_run {
            return MirrorState::Absent;
        }
        let listing = self
            .options
            .retry
            .run(&format!("list revision {revision}"), || {
                self.store.list_revision(revision)
            });
        match listing {
            Ok(entries) => match entries.into_iter().find(|e| e.path == artifact.repo_path) {
                Some(entry) => match entry.last_modified {
                    Some(marker) => MirrorState::Marker(marker),
                    None => MirrorState::NoMarker,
                },
                None => MirrorState::Absent,
            },
            Err(e) => {
                tracing::warn!("{}: mirror metadata unavailable: {e}", artifact.name);
                MirrorState::Absent
            }
        }
    }

    fn try_reuse(&self, artifact: &ArtifactSpec, revision: &str, local: &Path) -> ReuseOutcome {
        let result = self
            .options
            .retry
            .run(&format!("mirror read {}", artifact.repo_path), || {
                self.store.read_to(&artifact.repo_path, revision, local)
            });
        match result {
            Ok(()) => {
                tracing::info!("{}: reused mirror copy", artifact.name);
                ReuseOutcome::Downloaded
            }
            Err(e) => {
                tracing::warn!(
                    "{}: mirror reuse failed ({e}); falling back to origin fetch",
                    artifact.name
                );
                ReuseOutcome::FellBack
            }
        }
    }

    fn fetch_origin(&self, artifact: &ArtifactSpec, local: &Path) -> Result<(), SyncError> {
        let result = self
            .options
            .retry
            .run(&format!("GET {}", artifact.url), || {
                self.origin.fetch_to(&artifact.url, local)
            });
        match result {
            Ok(bytes) => {
                tracing::info!("{}: fetched {bytes} bytes from origin", artifact.name);
                Ok(())
            }
            Err(e) => {
                // Never leave a partial payload for a later run to trust.
                let _ = fs::remove_file(local);
                Err(SyncError::OriginUnreachable {
                    url: artifact.url.clone(),
                    source: e,
                })
            }
        }
    }

    fn ensure_revision(&self, revision: &str) -> Result<(), SyncError> {
        if revision == self.config.store.default_revision {
            return Ok(());
        }
        self.options
            .retry
            .run(&format!("ensure branch {revision}"), || {
                self.store.ensure_branch(revision)
            })?;
        Ok(())
    }

    /// The manifest itself is the run's final tracked artifact, mirrored
    /// under the metadata prefix. Exhaustion here fails the run.
    fn upload_manifest(&self, manifest_path: &Path) -> Result<(), SyncError> {
        let file_name = manifest_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manifest.json".to_string());
        let repo_path = format!("metadata/{file_name}");
        chunker::upload_file(
            self.store,
            &self.options.retry,
            manifest_path,
            &repo_path,
            &self.config.store.default_revision,
            "Update sync manifest",
            self.config.chunk_size,
            false,
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
