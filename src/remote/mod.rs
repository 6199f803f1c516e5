//! Remote archive interface.
//!
//! `ArchiveApi` is the seam between the sync core and the archive's HTTP
//! surface; the orchestrator and resolver depend only on the trait, so tests
//! inject an in-memory archive instead of a live server.

pub mod http;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ArtifactKind, Interpretation};

pub use http::HttpArchiveClient;

/// Bound on every network call; a timeout is treated identically to any
/// other network failure for retry purposes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifying key of an archive record; duplicates are detected on
/// (site, area, unit, unit_type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub site: String,
    pub area: String,
    pub unit: String,
    pub unit_type: String,
}

impl std::fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, Area {}, {} {}",
            self.site, self.area, self.unit_type, self.unit
        )
    }
}

/// Parse the archive's 409 detail message into a structured key.
///
/// Wire format: `"US already exists: {site}, Area {area}, US {unit}"`.
pub fn parse_duplicate_detail(detail: &str) -> Option<DuplicateKey> {
    let (prefix, rest) = detail.split_once(": ")?;
    let unit_type = prefix.split_whitespace().next()?.to_string();

    let mut parts = rest.splitn(3, ", ");
    let site = parts.next()?.trim();
    let area = parts.next()?.trim().strip_prefix("Area ")?;
    let unit_part = parts.next()?.trim();
    let unit = unit_part
        .strip_prefix(&format!("{} ", unit_type))
        .unwrap_or(unit_part);

    if site.is_empty() || area.is_empty() || unit.is_empty() {
        return None;
    }

    Some(DuplicateKey {
        site: site.to_string(),
        area: area.to_string(),
        unit: unit.to_string(),
        unit_type,
    })
}

/// Errors from the remote archive
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("record already exists: {0}")]
    Conflict(DuplicateKey),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether the next sync run should retry automatically. Malformed
    /// responses count as server faults and retry like network failures;
    /// conflicts require explicit human resolution and never auto-retry.
    pub fn retryable(&self) -> bool {
        !matches!(self, Self::Conflict(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Metadata sent alongside the media bytes at intake.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub kind: ArtifactKind,
    pub site: String,
    pub recorded_by: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub file_name: String,
    /// Client-generated, stable per artifact across retries, so the server
    /// can deduplicate an upload whose acknowledgment was lost.
    pub idempotency_key: String,
}

/// Result of the remote processing call.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub transcription: String,
    pub detected_language: Option<String>,
    pub interpretation: Option<Interpretation>,
}

/// Authoritative per-note state from `GET /notes`.
#[derive(Debug, Clone)]
pub struct RemoteNote {
    pub note_id: i64,
    pub status: String,
    pub transcription: Option<String>,
    pub detected_language: Option<String>,
    pub interpretation: Option<Interpretation>,
}

/// Payload of the confirm-to-archive call.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmRequest {
    pub extracted_fields: BTreeMap<String, String>,
    pub entity_type: String,
    pub target_table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_action: Option<String>,
}

/// Remote archive operations consumed by the sync core
#[async_trait]
pub trait ArchiveApi: Send + Sync {
    /// Multipart intake upload; returns the archive-assigned note id.
    async fn upload(&self, req: &UploadRequest, media: Vec<u8>) -> Result<i64, RemoteError>;

    /// Transcription + interpretation for an uploaded note.
    async fn process(&self, note_id: i64, force_reprocess: bool)
        -> Result<ProcessOutcome, RemoteError>;

    /// Write the reviewed record into the permanent store.
    /// A natural-key collision surfaces as [`RemoteError::Conflict`].
    async fn confirm(&self, note_id: i64, req: &ConfirmRequest) -> Result<(), RemoteError>;

    /// Mark a note rejected; no archive write happens.
    async fn reject(&self, note_id: i64) -> Result<(), RemoteError>;

    /// Authoritative state of all notes, used for reconciliation.
    async fn list_notes(&self) -> Result<Vec<RemoteNote>, RemoteError>;
}
