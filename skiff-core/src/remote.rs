//! Collaborator contracts for the two remote sides of a sync run.
//!
//! The sync engine never talks HTTP itself: it sees the origin and the hub
//! through these traits, and skiff-transport provides the `ureq`-backed
//! implementations. Tests substitute in-memory fakes.

use std::path::Path;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed network interaction with the origin or the hub.
///
/// Kinds split into transient (worth retrying) and permanent. Connection
/// failures, 5xx/429 responses, and mid-transfer I/O errors are transient;
/// other 4xx responses and malformed payloads are not.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the remote at all (DNS, TLS, refused connection).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The remote answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The transfer itself failed partway (read/write error on either end).
    #[error("transfer I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote answered, but not with what the protocol promises.
    #[error("malformed response from {url}: {detail}")]
    Malformed { url: String, detail: String },
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Io(_) => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Malformed { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Read-side collaborator for the authoritative upstream origin.
pub trait OriginClient {
    /// HEAD `url` and return its modification marker, if the origin reports
    /// one. The marker is opaque: equality-comparable only.
    fn head(&self, url: &str) -> Result<Option<String>, TransportError>;

    /// Stream the payload at `url` into `dest`, returning the byte count.
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, TransportError>;
}

// ---------------------------------------------------------------------------
// Mirror store
// ---------------------------------------------------------------------------

/// One file the hub holds on a revision.
///
/// `last_modified: None` is the "present, no marker" state — distinct from
/// the file being absent from the listing entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub path: String,
    pub last_modified: Option<String>,
    pub size: Option<u64>,
}

/// Collaborator for the managed dataset store holding the mirror.
pub trait MirrorClient {
    /// List all files the hub holds on `revision`.
    fn list_revision(&self, revision: &str) -> Result<Vec<RemoteEntry>, TransportError>;

    /// Download `repo_path` at `revision` into `dest`.
    fn read_to(&self, repo_path: &str, revision: &str, dest: &Path) -> Result<(), TransportError>;

    /// Upload the file at `local` to `repo_path` on `revision`.
    fn write(
        &self,
        local: &Path,
        repo_path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), TransportError>;

    /// Create `revision` if it does not exist. Idempotent: an
    /// already-existing branch is a no-op, not an error.
    fn ensure_branch(&self, revision: &str) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
