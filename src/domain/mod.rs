//! Domain types for the fieldsync engine.
//!
//! This module contains the core data structures:
//! - Artifact: one captured audio note or image plus its derived remote state
//! - QueueEntry: a pending-sync marker referencing exactly one artifact
//! - Interpretation: the AI-derived structured record, validated at the
//!   store write boundary
//! - lifecycle: the artifact status transition table

pub mod artifact;
pub mod interpretation;
pub mod lifecycle;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactKind, ArtifactStatus, CaptureMeta, QueueEntry};
pub use interpretation::{Interpretation, Relationship};
pub use lifecycle::transition_allowed;
