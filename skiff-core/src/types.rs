//! Domain types for the skiff artifact registry.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a tracked artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactName(pub String);

impl ArtifactName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ArtifactName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArtifactName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A tracked artifact: one dump file mirrored from an origin URL into the hub.
///
/// The artifact set is configured, never discovered, and is immutable for the
/// lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: ArtifactName,
    /// Authoritative upstream URL for this artifact's bytes.
    pub url: String,
    /// Repo-relative path under which the artifact is stored in the hub.
    pub repo_path: String,
    /// Hub revision (branch) for this artifact class; falls back to the
    /// store's default revision when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Retention-exempt artifacts keep their local copy after upload.
    #[serde(default)]
    pub retain: bool,
}

impl ArtifactSpec {
    /// The revision this artifact is stored on, given the store default.
    pub fn revision_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.revision.as_deref().unwrap_or(default)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
