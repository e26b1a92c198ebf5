//! Per-user YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.skiff/
//!   config.yaml     (store endpoint, artifact set — created by `skiff init`)
//!   manifest.json   (sync manifest, owned by skiff-sync)
//!   dumps/          (local working area for payloads in flight)
//! ```
//!
//! # API pattern
//!
//! Every function that touches the filesystem has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{ArtifactName, ArtifactSpec};

/// Hub single-file size limit: payloads above this are uploaded in parts.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024 * 1024;

// ---------------------------------------------------------------------------
// 1. Config types
// ---------------------------------------------------------------------------

/// Identity of the managed dataset store the artifacts mirror into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hub API.
    pub endpoint: String,
    /// Repository identifier, e.g. `archive/openlibrary`.
    pub repo: String,
    /// Revision used when an artifact does not name its own.
    #[serde(default = "default_revision")]
    pub default_revision: String,
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

/// Root of the skiff configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub store: StoreConfig,
    /// Maximum single-upload size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Local working area; defaults to `<home>/.skiff/dumps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Manifest document path; defaults to `<home>/.skiff/manifest.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,
}

impl SyncConfig {
    /// Local working area for payloads in flight.
    pub fn work_dir_at(&self, home: &Path) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| skiff_dir_at(home).join("dumps"))
    }

    /// Path of the persisted sync manifest document.
    pub fn manifest_path_at(&self, home: &Path) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| skiff_dir_at(home).join("manifest.json"))
    }

    /// Where an artifact's bytes live while resident locally.
    pub fn local_path_at(&self, home: &Path, artifact: &ArtifactSpec) -> PathBuf {
        self.work_dir_at(home).join(artifact.name.as_str())
    }

    /// Look up a configured artifact by name.
    pub fn artifact(&self, name: &str) -> Option<&ArtifactSpec> {
        self.artifacts.iter().find(|a| a.name.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.skiff/` — pure, no I/O.
pub fn skiff_dir_at(home: &Path) -> PathBuf {
    home.join(".skiff")
}

/// `<home>/.skiff/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    skiff_dir_at(home).join("config.yaml")
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load the configuration from `<home>/.skiff/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Write a starter configuration and return its path.
///
/// Refuses to overwrite an existing file unless `force` is set. The starter
/// artifact set tracks the OpenLibrary raw dumps on a `backup/raw` revision.
pub fn init_at(home: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = config_path_at(home);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists { path });
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let yaml = serde_yaml::to_string(&starter_config())?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, &yaml)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

/// `init_at` convenience wrapper.
pub fn init(force: bool) -> Result<PathBuf, ConfigError> {
    init_at(&home()?, force)
}

fn starter_config() -> SyncConfig {
    let dump = |kind: &str| ArtifactSpec {
        name: ArtifactName::from(format!("ol_dump_{kind}_latest.txt.gz")),
        url: format!("https://openlibrary.org/data/ol_dump_{kind}_latest.txt.gz"),
        repo_path: format!("ol_dump_{kind}_latest.txt.gz"),
        revision: Some("backup/raw".to_string()),
        retain: false,
    };
    SyncConfig {
        store: StoreConfig {
            endpoint: "https://hub.example.org".to_string(),
            repo: "archive/openlibrary".to_string(),
            default_revision: default_revision(),
        },
        chunk_size: DEFAULT_CHUNK_SIZE,
        work_dir: None,
        manifest_path: None,
        artifacts: vec![dump("authors"), dump("editions"), dump("works")],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_config_is_not_found() {
        let home = TempDir::new().unwrap();
        match load_at(home.path()) {
            Err(ConfigError::NotFound { path }) => {
                assert_eq!(path, config_path_at(home.path()));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn init_then_load_roundtrips_the_starter_config() {
        let home = TempDir::new().unwrap();
        let path = init_at(home.path(), false).expect("init");
        assert_eq!(path, config_path_at(home.path()));

        let config = load_at(home.path()).expect("load");
        assert_eq!(config, starter_config());
        assert_eq!(config.artifacts.len(), 3);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let home = TempDir::new().unwrap();
        init_at(home.path(), false).expect("first init");
        match init_at(home.path(), false) {
            Err(ConfigError::AlreadyExists { .. }) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
        init_at(home.path(), true).expect("forced init");
    }

    #[test]
    fn init_tmp_file_cleaned_up() {
        let home = TempDir::new().unwrap();
        init_at(home.path(), false).expect("init");
        let tmp = config_path_at(home.path()).with_extension("yaml.tmp");
        assert!(!tmp.exists(), "tmp file should be removed after rename");
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let home = TempDir::new().unwrap();
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "store: [not a mapping").unwrap();
        match load_at(home.path()) {
            Err(ConfigError::Parse { .. }) => {}
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn default_paths_are_rooted_at_home() {
        let home = TempDir::new().unwrap();
        let config = starter_config();
        assert_eq!(
            config.work_dir_at(home.path()),
            home.path().join(".skiff").join("dumps")
        );
        assert_eq!(
            config.manifest_path_at(home.path()),
            home.path().join(".skiff").join("manifest.json")
        );
        let local = config.local_path_at(home.path(), &config.artifacts[0]);
        assert!(local.ends_with("dumps/ol_dump_authors_latest.txt.gz"));
    }

    #[test]
    fn explicit_paths_override_defaults() {
        let home = TempDir::new().unwrap();
        let mut config = starter_config();
        config.work_dir = Some(PathBuf::from("/srv/dumps"));
        config.manifest_path = Some(PathBuf::from("/srv/manifest.json"));
        assert_eq!(config.work_dir_at(home.path()), PathBuf::from("/srv/dumps"));
        assert_eq!(
            config.manifest_path_at(home.path()),
            PathBuf::from("/srv/manifest.json")
        );
    }

    #[test]
    fn artifact_lookup_by_name() {
        let config = starter_config();
        assert!(config.artifact("ol_dump_works_latest.txt.gz").is_some());
        assert!(config.artifact("nope").is_none());
    }
}
