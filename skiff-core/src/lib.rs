//! Skiff core library — domain types, configuration persistence, collaborator
//! contracts, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and the artifact descriptor
//! - [`config`] — YAML configuration under `<home>/.skiff/`
//! - [`remote`] — origin/mirror collaborator traits and [`TransportError`]
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod remote;
pub mod types;

pub use config::{StoreConfig, SyncConfig};
pub use error::ConfigError;
pub use remote::{MirrorClient, OriginClient, RemoteEntry, TransportError};
pub use types::{ArtifactName, ArtifactSpec};
