//! Captured artifacts and their pending-sync queue entries.
//!
//! An artifact is created in `Offline` status together with exactly one
//! queue entry; the sync orchestrator and conflict resolver move it through
//! the rest of its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interpretation::Interpretation;

/// Kind of captured media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Voice recording destined for transcription
    AudioNote,

    /// Site photograph
    Image,
}

impl ArtifactKind {
    /// Sync priority: lower drains sooner. Audio ahead of images because
    /// transcription has tighter latency value than media.
    pub fn priority(self) -> i64 {
        match self {
            Self::AudioNote => 1,
            Self::Image => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AudioNote => "audio_note",
            Self::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio_note" => Some(Self::AudioNote),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Captured locally, waiting in the sync queue
    Offline,

    /// Uploaded and processed by the archive (transcription + interpretation)
    Processed,

    /// Uploaded, but remote processing failed; recoverable only via an
    /// explicit reprocess, never via the queue
    ErrorProcessed,

    /// Human-confirmed into the permanent record store (terminal)
    Validated,

    /// Human-rejected, no archive write (terminal)
    Rejected,
}

impl ArtifactStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Validated | Self::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Processed => "processed",
            Self::ErrorProcessed => "error_processed",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "offline" => Some(Self::Offline),
            "processed" => Some(Self::Processed),
            "error_processed" => Some(Self::ErrorProcessed),
            "validated" => Some(Self::Validated),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture-time metadata for an artifact payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMeta {
    /// Excavation site name (case preserved exactly as captured)
    pub site: String,

    /// Who recorded/photographed it
    pub recorded_by: Option<String>,

    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,

    /// Original file name of the captured media
    pub file_name: String,

    /// Path to the media bytes on local disk
    pub media_path: std::path::PathBuf,

    /// Recording length; audio notes only
    pub duration_seconds: Option<f64>,
}

/// One captured audio note or image and its derived remote state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Local id (UUID v4), stable, never reused
    pub id: String,

    /// Archive-side note id; absent until first successful upload, set at
    /// most once, never cleared or reassigned
    pub remote_id: Option<i64>,

    pub kind: ArtifactKind,

    pub status: ArtifactStatus,

    pub meta: CaptureMeta,

    /// SHA-256 of the captured bytes; sent as the idempotency key with
    /// every upload attempt
    pub content_hash: String,

    pub transcription: Option<String>,

    /// Language code detected during transcription
    pub detected_language: Option<String>,

    pub interpretation: Option<Interpretation>,

    pub created_at: DateTime<Utc>,

    /// Set when the upload durability point is reached
    pub synced_at: Option<DateTime<Utc>>,
}

/// A pending-sync marker referencing exactly one offline artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: String,

    pub artifact_id: String,

    pub kind: ArtifactKind,

    /// Lower drains sooner; ties broken by insertion order
    pub priority: i64,

    /// Monotonic, increments only on a failed upload attempt
    pub attempts: u32,

    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_sorts_ahead_of_images() {
        assert!(ArtifactKind::AudioNote.priority() < ArtifactKind::Image.priority());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ArtifactStatus::Offline,
            ArtifactStatus::Processed,
            ArtifactStatus::ErrorProcessed,
            ArtifactStatus::Validated,
            ArtifactStatus::Rejected,
        ] {
            assert_eq!(ArtifactStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ArtifactStatus::parse("pending"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ArtifactStatus::Validated.is_terminal());
        assert!(ArtifactStatus::Rejected.is_terminal());
        assert!(!ArtifactStatus::Processed.is_terminal());
        assert!(!ArtifactStatus::ErrorProcessed.is_terminal());
        assert!(!ArtifactStatus::Offline.is_terminal());
    }
}
