//! Row mapping between SQLite and domain structs.
//!
//! Only declared columns are read or written; there is no fallback
//! flattening of unknown shapes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::domain::{Artifact, ArtifactKind, ArtifactStatus, CaptureMeta, QueueEntry};

pub const SELECT_ARTIFACT: &str = "SELECT id, kind, status, remote_id, site, recorded_by, \
     gps_lat, gps_lon, file_name, media_path, duration_seconds, content_hash, \
     transcription, detected_language, interpretation, created_at, synced_at \
     FROM artifacts";

pub const SELECT_ENTRY: &str =
    "SELECT id, artifact_id, kind, priority, attempts, added_at FROM sync_queue";

fn invalid(idx: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        reason.into(),
    )
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid(idx, format!("bad timestamp {raw:?}: {e}")))
}

pub fn artifact_from_row(row: &Row<'_>) -> Result<Artifact, rusqlite::Error> {
    let kind_raw: String = row.get(1)?;
    let kind = ArtifactKind::parse(&kind_raw)
        .ok_or_else(|| invalid(1, format!("unknown kind {kind_raw:?}")))?;

    let status_raw: String = row.get(2)?;
    let status = ArtifactStatus::parse(&status_raw)
        .ok_or_else(|| invalid(2, format!("unknown status {status_raw:?}")))?;

    let media_path: String = row.get(9)?;

    let interpretation = match row.get::<_, Option<String>>(14)? {
        Some(json) => Some(
            serde_json::from_str(&json)
                .map_err(|e| invalid(14, format!("bad interpretation json: {e}")))?,
        ),
        None => None,
    };

    let created_raw: String = row.get(15)?;
    let synced_at = match row.get::<_, Option<String>>(16)? {
        Some(raw) => Some(parse_timestamp(16, &raw)?),
        None => None,
    };

    Ok(Artifact {
        id: row.get(0)?,
        remote_id: row.get(3)?,
        kind,
        status,
        meta: CaptureMeta {
            site: row.get(4)?,
            recorded_by: row.get(5)?,
            gps_lat: row.get(6)?,
            gps_lon: row.get(7)?,
            file_name: row.get(8)?,
            media_path: PathBuf::from(media_path),
            duration_seconds: row.get(10)?,
        },
        content_hash: row.get(11)?,
        transcription: row.get(12)?,
        detected_language: row.get(13)?,
        interpretation,
        created_at: parse_timestamp(15, &created_raw)?,
        synced_at,
    })
}

pub fn entry_from_row(row: &Row<'_>) -> Result<QueueEntry, rusqlite::Error> {
    let kind_raw: String = row.get(2)?;
    let kind = ArtifactKind::parse(&kind_raw)
        .ok_or_else(|| invalid(2, format!("unknown kind {kind_raw:?}")))?;

    let added_raw: String = row.get(5)?;

    Ok(QueueEntry {
        id: row.get(0)?,
        artifact_id: row.get(1)?,
        kind,
        priority: row.get(3)?,
        attempts: row.get(4)?,
        added_at: parse_timestamp(5, &added_raw)?,
    })
}
