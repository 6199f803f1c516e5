//! Capture ingestion: turns a raw captured file into a stored artifact
//! plus its queue entry.
//!
//! This is the boundary the acquisition widgets call into; everything
//! upstream of it (microphone, camera, GPS) lives outside the crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::{Artifact, ArtifactKind, CaptureMeta};
use crate::store::LocalStore;

/// Capture-time inputs from the acquisition layer
#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    pub site: String,
    pub recorded_by: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
}

/// Ingest one captured file: copy it under the media directory, fingerprint
/// it, and create the offline artifact + queue entry atomically.
pub async fn capture_file(
    store: &Arc<LocalStore>,
    kind: ArtifactKind,
    source: &Path,
    media_dir: &Path,
    request: CaptureRequest,
) -> Result<Artifact> {
    let bytes = tokio::fs::read(source)
        .await
        .with_context(|| format!("Failed to read capture: {}", source.display()))?;

    let content_hash = hash_bytes(&bytes);

    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "capture".to_string());

    let media_path = stored_media_path(media_dir, &file_name);
    if let Some(parent) = media_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create media dir: {}", parent.display()))?;
    }
    tokio::fs::write(&media_path, &bytes)
        .await
        .with_context(|| format!("Failed to store media: {}", media_path.display()))?;

    let duration_seconds = match kind {
        // Rough estimate from file size; the archive computes the real one
        ArtifactKind::AudioNote => Some(bytes.len() as f64 / 16_000.0),
        ArtifactKind::Image => None,
    };

    let meta = CaptureMeta {
        site: request.site,
        recorded_by: request.recorded_by,
        gps_lat: request.gps_lat,
        gps_lon: request.gps_lon,
        file_name,
        media_path,
        duration_seconds,
    };

    let artifact = store.create(kind, meta, content_hash)?;
    info!(id = %artifact.id, kind = %artifact.kind, site = %artifact.meta.site, "captured");
    Ok(artifact)
}

/// SHA-256 of the capture bytes; stable per artifact, sent as the upload
/// idempotency key.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn stored_media_path(media_dir: &Path, file_name: &str) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    media_dir.join(format!("capture_{}_{}", timestamp, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactStatus;
    use tempfile::TempDir;

    #[test]
    fn test_hash_is_stable() {
        let h1 = hash_bytes(b"field recording");
        let h2 = hash_bytes(b"field recording");
        let h3 = hash_bytes(b"different recording");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
    }

    #[tokio::test]
    async fn test_capture_creates_offline_artifact() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("note.m4a");
        tokio::fs::write(&source, b"fake audio content").await.unwrap();

        let store = Arc::new(LocalStore::open_in_memory().unwrap());
        let artifact = capture_file(
            &store,
            ArtifactKind::AudioNote,
            &source,
            &temp.path().join("media"),
            CaptureRequest {
                site: "Pompeii".to_string(),
                recorded_by: Some("mara".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(artifact.status, ArtifactStatus::Offline);
        assert_eq!(artifact.meta.file_name, "note.m4a");
        assert!(artifact.meta.media_path.exists());
        assert!(artifact.meta.duration_seconds.is_some());
        assert_eq!(store.queue_len().unwrap(), 1);
    }
}
