//! Sync manifest — the durable memory of the system across runs.
//!
//! A flat JSON document mapping artifact name to its last known sync state,
//! persisted with the same atomic `.tmp` + rename pattern as the
//! configuration. A missing document is an empty manifest; an unparseable
//! one refuses the run ([`SyncError::ManifestCorrupt`]) so drift is never
//! silently masked by re-downloading everything.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

/// Per-chunk bookkeeping inside a [`ManifestEntry`]; the map survives
/// documents written by the downstream conversion stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub converted: bool,
    pub last_synced: DateTime<Utc>,
}

/// Last known sync state of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// When the last successful reconciliation completed.
    pub last_synced: DateTime<Utc>,
    /// The origin's modification marker as of that sync; `None` when the
    /// origin reported no marker.
    pub source_last_modified: Option<String>,
    #[serde(default)]
    pub converted_chunks: BTreeMap<String, ChunkRecord>,
}

/// The whole persisted document: artifact name → entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    /// The recorded origin marker for `name`, if any.
    pub fn marker(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .and_then(|e| e.source_last_modified.as_deref())
    }

    /// Record a successful reconciliation: create or update the entry for
    /// `name` and upsert one `converted_chunks` sub-entry, all at current
    /// wall-clock time. Never touches any other artifact's entry.
    pub fn record_sync(&mut self, name: &str, origin_marker: Option<&str>, sub_artifact: &str) {
        let now = Utc::now();
        let entry = self
            .entries
            .entry(name.to_owned())
            .or_insert_with(|| ManifestEntry {
                last_synced: now,
                source_last_modified: None,
                converted_chunks: BTreeMap::new(),
            });
        entry.last_synced = now;
        entry.source_last_modified = origin_marker.map(str::to_owned);
        let chunk = entry
            .converted_chunks
            .entry(sub_artifact.to_owned())
            .or_insert(ChunkRecord {
                converted: true,
                last_synced: now,
            });
        chunk.converted = true;
        chunk.last_synced = now;
    }
}

/// Load the manifest at `path`.
///
/// Returns an empty manifest if the file does not yet exist.
pub fn load(path: &Path) -> Result<Manifest, SyncError> {
    if !path.exists() {
        tracing::debug!("no manifest at {}; starting empty", path.display());
        return Ok(Manifest::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| SyncError::ManifestCorrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save the manifest atomically: write to `<path>.tmp`, then rename.
pub fn save(path: &Path, manifest: &Manifest) -> Result<(), SyncError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Compact age like `12s`, `4m`, `7h`, `3d` for a manifest timestamp.
pub fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
