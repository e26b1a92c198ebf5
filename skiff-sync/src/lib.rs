//! # skiff-sync
//!
//! The reconciliation engine. For each tracked artifact a run decides — from
//! the origin's modification marker, the hub's metadata, and the persisted
//! manifest — whether to skip, reuse the hub's copy, or fetch from the origin
//! and upload (chunked above the hub's single-file limit).
//!
//! Call [`pipeline::run`] with a scope, or drive [`SyncRunner`] directly.

pub mod chunker;
pub mod error;
pub mod freshness;
pub mod manifest;
pub mod pipeline;
pub mod retry;
pub mod runner;

pub use error::SyncError;
pub use freshness::{MirrorState, SyncDecision};
pub use manifest::{ChunkRecord, Manifest, ManifestEntry};
pub use retry::RetryPolicy;
pub use runner::{ArtifactOutcome, RunOptions, RunReport, Stage, SyncRunner};
