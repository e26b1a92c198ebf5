//! Error types for skiff-sync.

use std::path::PathBuf;

use thiserror::Error;

use skiff_core::error::ConfigError;
use skiff_core::remote::TransportError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A network interaction failed after retries.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The origin could not be reached after retries — fatal for the
    /// artifact, never for the run.
    #[error("origin unreachable at {url}: {source}")]
    OriginUnreachable {
        url: String,
        #[source]
        source: TransportError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted manifest document failed to parse. The run refuses to
    /// proceed rather than silently starting from an empty state.
    #[error("manifest at {path} is corrupt: {source}")]
    ManifestCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (manifest save path).
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error from configuration loading.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Upload-only was requested but there is no local payload to push.
    #[error("no local copy at {path} to upload")]
    MissingLocalFile { path: PathBuf },

    /// The named artifact is not in the configured set.
    #[error("unknown artifact '{0}'")]
    UnknownArtifact(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
