//! fieldsync - Offline capture queue and sync orchestrator for
//! archaeology field notes
//!
//! Field teams capture audio notes and site photographs with no
//! connectivity; fieldsync queues them locally and, once online, drains
//! the queue against the archive backend, which transcribes and
//! interprets each note. A human reviewer then confirms or rejects each
//! processed artifact, with explicit merge/overwrite/ignore resolution
//! when the archive already holds a record for the same stratigraphic
//! unit.
//!
//! # Architecture
//!
//! The system is built around an artifact lifecycle:
//! - Every capture starts `offline` with exactly one queue entry
//! - A sync run drains the queue in priority order (audio before images)
//! - Remote processing moves artifacts to `processed` or `error_processed`
//! - Human review moves them to the terminal `validated` or `rejected`
//!
//! # Modules
//!
//! - `domain`: Data structures (Artifact, QueueEntry, Interpretation)
//! - `store`: SQLite-backed local persistence
//! - `remote`: Archive HTTP client and wire types
//! - `sync`: Queue-draining orchestrator and connectivity watcher
//! - `resolve`: Confirm/reject review and duplicate resolution
//! - `ingest`: Media capture into the offline queue
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Capture an audio note offline
//! fieldsync capture note.m4a --site Pompeii --recorded-by "M. Rossi"
//!
//! # Drain the queue once connectivity returns
//! fieldsync sync
//!
//! # Review a processed artifact
//! fieldsync confirm <artifact-id> --field area=1
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod remote;
pub mod resolve;
pub mod store;
pub mod sync;

// Re-export main types at crate root for convenience
pub use domain::{Artifact, ArtifactKind, ArtifactStatus, Interpretation, QueueEntry};
pub use remote::{ArchiveApi, HttpArchiveClient, RemoteError};
pub use resolve::{ConflictResolver, ResolutionAction};
pub use store::{LocalStore, StoreError};
pub use sync::{SyncOrchestrator, SyncReport};
