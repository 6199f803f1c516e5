//! Durable local persistence for captured artifacts and the sync queue.
//!
//! One SQLite database holds three tables: `artifacts` (keyed by local id,
//! with secondary indexes on status/site/created_at), `sync_queue` (ordered
//! by priority then insertion), and a small `settings` key-value store.
//!
//! A single `LocalStore` instance is assumed to be the sole mutator of its
//! database; concurrent mutation from a second process is unsupported.

mod row;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    transition_allowed, Artifact, ArtifactKind, ArtifactStatus, CaptureMeta, Interpretation,
    QueueEntry,
};
use crate::domain::interpretation::InterpretationError;

/// Default retention threshold for fully synced artifacts.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Errors from the local store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("queue entry not found: {0}")]
    EntryNotFound(String),

    #[error("remote id already set to {existing}, refusing to change it")]
    RemoteIdImmutable { existing: i64 },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ArtifactStatus,
        to: ArtifactStatus,
    },

    #[error("invalid interpretation: {0}")]
    Interpretation(#[from] InterpretationError),

    #[error("corrupt row for {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("store lock poisoned")]
    Lock,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Partial update applied to an artifact.
///
/// Only declared fields can be written; absent fields are left untouched.
/// There is deliberately no way to express "clear `remote_id`".
#[derive(Debug, Clone, Default)]
pub struct ArtifactPatch {
    pub status: Option<ArtifactStatus>,
    pub remote_id: Option<i64>,
    pub transcription: Option<String>,
    pub detected_language: Option<String>,
    pub interpretation: Option<Interpretation>,
    pub synced_at: Option<DateTime<Utc>>,
}

/// Filter for listing artifacts
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<ArtifactStatus>,
    pub site: Option<String>,
    pub limit: Option<usize>,
}

/// SQLite-backed artifact and queue store
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Corrupt {
                    id: path.as_ref().display().to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    /// Insert a new artifact in `Offline` status together with its queue
    /// entry, as one atomic unit. Either both rows commit or neither does.
    pub fn create(
        &self,
        kind: ArtifactKind,
        meta: CaptureMeta,
        content_hash: String,
    ) -> Result<Artifact, StoreError> {
        let artifact = Artifact {
            id: Uuid::new_v4().to_string(),
            remote_id: None,
            kind,
            status: ArtifactStatus::Offline,
            meta,
            content_hash,
            transcription: None,
            detected_language: None,
            interpretation: None,
            created_at: Utc::now(),
            synced_at: None,
        };

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO artifacts (id, kind, status, remote_id, site, recorded_by,
                 gps_lat, gps_lon, file_name, media_path, duration_seconds,
                 content_hash, transcription, detected_language, interpretation,
                 created_at, synced_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                 NULL, NULL, NULL, ?12, NULL)",
            params![
                artifact.id,
                artifact.kind.as_str(),
                artifact.status.as_str(),
                artifact.meta.site,
                artifact.meta.recorded_by,
                artifact.meta.gps_lat,
                artifact.meta.gps_lon,
                artifact.meta.file_name,
                artifact.meta.media_path.to_string_lossy(),
                artifact.meta.duration_seconds,
                artifact.content_hash,
                artifact.created_at.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "INSERT INTO sync_queue (id, artifact_id, kind, priority, attempts, added_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                Uuid::new_v4().to_string(),
                artifact.id,
                artifact.kind.as_str(),
                artifact.kind.priority(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        debug!(id = %artifact.id, kind = %artifact.kind, "artifact captured");
        Ok(artifact)
    }

    /// Fetch one artifact by local id.
    pub fn get(&self, id: &str) -> Result<Artifact, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("{} WHERE id = ?1", row::SELECT_ARTIFACT),
            params![id],
            row::artifact_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// List artifacts, newest first, honoring the filter's secondary
    /// access paths (status, site).
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Artifact>, StoreError> {
        let mut sql = row::SELECT_ARTIFACT.to_string();
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push(format!("status = ?{}", values.len() + 1));
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(ref site) = filter.site {
            clauses.push(format!("site = ?{}", values.len() + 1));
            values.push(Box::new(site.clone()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
            row::artifact_from_row,
        )?;

        let mut artifacts = Vec::new();
        for artifact in rows {
            artifacts.push(artifact?);
        }
        Ok(artifacts)
    }

    /// Merge `patch` into an artifact.
    ///
    /// Rejects any status change the lifecycle table forbids and any
    /// attempt to reassign an already-set `remote_id`. The interpretation,
    /// if present, is validated here: this is the single write boundary.
    pub fn update(&self, id: &str, patch: ArtifactPatch) -> Result<Artifact, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        apply_patch(&tx, id, patch)?;
        tx.commit()?;
        drop(conn);
        self.get(id)
    }

    /// Remove an artifact; its queue entry (if still pending) goes with it
    /// in the same transaction via the FK cascade.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM artifacts WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(%id, "artifact deleted");
        Ok(())
    }

    /// Persist the archive-assigned id the moment upload succeeds.
    /// This is the durability point: once committed, the artifact is no
    /// longer a duplicate-upload risk.
    pub fn set_remote_id(&self, id: &str, remote_id: i64) -> Result<Artifact, StoreError> {
        self.update(
            id,
            ArtifactPatch {
                remote_id: Some(remote_id),
                synced_at: Some(Utc::now()),
                ..Default::default()
            },
        )
    }

    /// Apply a sync outcome and drop the queue entry in one transaction,
    /// so no crash can leave a non-offline artifact still queued.
    pub fn finish_entry(
        &self,
        entry_id: &str,
        artifact_id: &str,
        patch: ArtifactPatch,
    ) -> Result<Artifact, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        apply_patch(&tx, artifact_id, patch)?;
        tx.execute("DELETE FROM sync_queue WHERE id = ?1", params![entry_id])?;
        tx.commit()?;
        drop(conn);
        self.get(artifact_id)
    }

    /// Ordered view of the pending queue at call time: priority ascending
    /// (audio before images), insertion order as the tiebreak. A sync run
    /// operates only against its snapshot; entries enqueued mid-run wait
    /// for the next run.
    pub fn queue_snapshot(&self) -> Result<Vec<QueueEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY priority ASC, rowid ASC",
            row::SELECT_ENTRY
        ))?;
        let rows = stmt.query_map([], row::entry_from_row)?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Number of entries currently pending.
    pub fn queue_len(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM sync_queue", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// The queue entry referencing `artifact_id`, if one is pending.
    pub fn entry_for_artifact(&self, artifact_id: &str) -> Result<Option<QueueEntry>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("{} WHERE artifact_id = ?1", row::SELECT_ENTRY),
                params![artifact_id],
                row::entry_from_row,
            )
            .optional()?)
    }

    /// Record a failed upload attempt; the entry and its artifact are left
    /// otherwise untouched so the next run retries from scratch.
    pub fn increment_attempts(&self, entry_id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE sync_queue SET attempts = attempts + 1 WHERE id = ?1",
            params![entry_id],
        )?;
        if n == 0 {
            return Err(StoreError::EntryNotFound(entry_id.to_string()));
        }
        Ok(())
    }

    /// Delete one queue entry. Used only after its artifact's sync outcome
    /// is durably recorded.
    pub fn remove_entry(&self, entry_id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM sync_queue WHERE id = ?1", params![entry_id])?;
        if n == 0 {
            return Err(StoreError::EntryNotFound(entry_id.to_string()));
        }
        Ok(())
    }

    /// Retention sweep: drop artifacts that are fully synced (remote id
    /// present, no longer queued) and older than `max_age_days`.
    pub fn prune(&self, max_age_days: i64) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - Duration::days(max_age_days);
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM artifacts
             WHERE remote_id IS NOT NULL
               AND status != 'offline'
               AND created_at < ?1
               AND id NOT IN (SELECT artifact_id FROM sync_queue)",
            params![cutoff.to_rfc3339()],
        )?;
        if n > 0 {
            info!(removed = n, max_age_days, "retention sweep");
        }
        Ok(n)
    }

    /// Read a user preference.
    pub fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?)
    }

    /// Write a user preference.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Apply a patch inside an open transaction.
fn apply_patch(
    conn: &Connection,
    id: &str,
    patch: ArtifactPatch,
) -> Result<(), StoreError> {
    let current = conn
        .query_row(
            &format!("{} WHERE id = ?1", row::SELECT_ARTIFACT),
            params![id],
            row::artifact_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if let Some(new_status) = patch.status {
        if !transition_allowed(current.status, new_status) {
            return Err(StoreError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }
    }

    if let Some(new_remote) = patch.remote_id {
        if let Some(existing) = current.remote_id {
            if existing != new_remote {
                return Err(StoreError::RemoteIdImmutable { existing });
            }
        }
    }

    let interpretation_json = match patch.interpretation {
        Some(interp) => Some(serde_json::to_string(&interp.validate()?)?),
        None => None,
    };

    conn.execute(
        "UPDATE artifacts SET
            status            = COALESCE(?2, status),
            remote_id         = COALESCE(?3, remote_id),
            transcription     = COALESCE(?4, transcription),
            detected_language = COALESCE(?5, detected_language),
            interpretation    = COALESCE(?6, interpretation),
            synced_at         = COALESCE(?7, synced_at)
         WHERE id = ?1",
        params![
            id,
            patch.status.map(|s| s.as_str()),
            patch.remote_id,
            patch.transcription,
            patch.detected_language,
            interpretation_json,
            patch.synced_at.map(|t| t.to_rfc3339()),
        ],
    )?;

    Ok(())
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS artifacts (
    id                TEXT PRIMARY KEY,
    kind              TEXT NOT NULL,
    status            TEXT NOT NULL,
    remote_id         INTEGER,
    site              TEXT NOT NULL,
    recorded_by       TEXT,
    gps_lat           REAL,
    gps_lon           REAL,
    file_name         TEXT NOT NULL,
    media_path        TEXT NOT NULL,
    duration_seconds  REAL,
    content_hash      TEXT NOT NULL,
    transcription     TEXT,
    detected_language TEXT,
    interpretation    TEXT,
    created_at        TEXT NOT NULL,
    synced_at         TEXT
);
CREATE INDEX IF NOT EXISTS idx_artifacts_status  ON artifacts(status);
CREATE INDEX IF NOT EXISTS idx_artifacts_site    ON artifacts(site);
CREATE INDEX IF NOT EXISTS idx_artifacts_created ON artifacts(created_at);

CREATE TABLE IF NOT EXISTS sync_queue (
    id          TEXT PRIMARY KEY,
    artifact_id TEXT NOT NULL UNIQUE REFERENCES artifacts(id) ON DELETE CASCADE,
    kind        TEXT NOT NULL,
    priority    INTEGER NOT NULL,
    attempts    INTEGER NOT NULL DEFAULT 0,
    added_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_queue_priority ON sync_queue(priority);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn meta(site: &str, file_name: &str) -> CaptureMeta {
        CaptureMeta {
            site: site.to_string(),
            recorded_by: Some("mara".to_string()),
            gps_lat: Some(40.75),
            gps_lon: Some(14.49),
            file_name: file_name.to_string(),
            media_path: PathBuf::from(format!("/tmp/{}", file_name)),
            duration_seconds: Some(12.5),
        }
    }

    fn capture_audio(store: &LocalStore) -> Artifact {
        store
            .create(
                ArtifactKind::AudioNote,
                meta("Pompeii", "note.m4a"),
                "abc123".to_string(),
            )
            .unwrap()
    }

    #[test]
    fn test_create_is_offline_with_one_entry() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);

        assert_eq!(artifact.status, ArtifactStatus::Offline);
        assert!(artifact.remote_id.is_none());

        let entry = store.entry_for_artifact(&artifact.id).unwrap().unwrap();
        assert_eq!(entry.priority, 1);
        assert_eq!(entry.attempts, 0);
        assert_eq!(store.queue_len().unwrap(), 1);
    }

    #[test]
    fn test_queue_ordered_by_priority_then_insertion() {
        let store = LocalStore::open_in_memory().unwrap();
        let image = store
            .create(ArtifactKind::Image, meta("Pompeii", "trench.jpg"), "h1".into())
            .unwrap();
        let audio = capture_audio(&store);

        let snapshot = store.queue_snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        // audio (priority 1) drains before the earlier-enqueued image (2)
        assert_eq!(snapshot[0].artifact_id, audio.id);
        assert_eq!(snapshot[1].artifact_id, image.id);
    }

    #[test]
    fn test_insertion_order_breaks_ties() {
        let store = LocalStore::open_in_memory().unwrap();
        let first = capture_audio(&store);
        let second = capture_audio(&store);

        let snapshot = store.queue_snapshot().unwrap();
        assert_eq!(snapshot[0].artifact_id, first.id);
        assert_eq!(snapshot[1].artifact_id, second.id);
    }

    #[test]
    fn test_delete_cascades_to_queue_entry() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);
        assert_eq!(store.queue_len().unwrap(), 1);

        store.delete(&artifact.id).unwrap();
        assert_eq!(store.queue_len().unwrap(), 0);
        assert!(matches!(
            store.get(&artifact.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_remote_id_set_once() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);

        let updated = store.set_remote_id(&artifact.id, 42).unwrap();
        assert_eq!(updated.remote_id, Some(42));
        assert!(updated.synced_at.is_some());

        // idempotent re-set of the same value is fine
        store.set_remote_id(&artifact.id, 42).unwrap();

        // reassignment is not
        let err = store.set_remote_id(&artifact.id, 43).unwrap_err();
        assert!(matches!(err, StoreError::RemoteIdImmutable { existing: 42 }));
        assert_eq!(store.get(&artifact.id).unwrap().remote_id, Some(42));
    }

    #[test]
    fn test_update_rejects_illegal_transition() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);

        let err = store
            .update(
                &artifact.id,
                ArtifactPatch {
                    status: Some(ArtifactStatus::Validated),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_interpretation_validated_at_write() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);

        let bogus = Interpretation {
            entity_type: "DRAGON".to_string(),
            target_table: "us_table".to_string(),
            confidence: 0.5,
            extracted_fields: Default::default(),
            relationships: vec![],
            notes: String::new(),
        };
        let err = store
            .update(
                &artifact.id,
                ArtifactPatch {
                    interpretation: Some(bogus),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Interpretation(_)));
    }

    #[test]
    fn test_list_by_status_and_site() {
        let store = LocalStore::open_in_memory().unwrap();
        capture_audio(&store);
        store
            .create(ArtifactKind::Image, meta("Ostia", "wall.jpg"), "h2".into())
            .unwrap();

        let offline = store
            .list(&ListFilter {
                status: Some(ArtifactStatus::Offline),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(offline.len(), 2);

        let ostia = store
            .list(&ListFilter {
                site: Some("Ostia".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ostia.len(), 1);
        assert_eq!(ostia[0].meta.site, "Ostia");
    }

    #[test]
    fn test_increment_attempts() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);
        let entry = store.entry_for_artifact(&artifact.id).unwrap().unwrap();

        store.increment_attempts(&entry.id).unwrap();
        store.increment_attempts(&entry.id).unwrap();

        let entry = store.entry_for_artifact(&artifact.id).unwrap().unwrap();
        assert_eq!(entry.attempts, 2);
    }

    #[test]
    fn test_finish_entry_is_atomic() {
        let store = LocalStore::open_in_memory().unwrap();
        let artifact = capture_audio(&store);
        let entry = store.entry_for_artifact(&artifact.id).unwrap().unwrap();
        store.set_remote_id(&artifact.id, 7).unwrap();

        let updated = store
            .finish_entry(
                &entry.id,
                &artifact.id,
                ArtifactPatch {
                    status: Some(ArtifactStatus::Processed),
                    transcription: Some("US 2045, strato di terra".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, ArtifactStatus::Processed);
        assert_eq!(store.queue_len().unwrap(), 0);
    }

    #[test]
    fn test_settings_roundtrip() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.setting("language").unwrap(), None);

        store.set_setting("language", "it").unwrap();
        assert_eq!(store.setting("language").unwrap(), Some("it".to_string()));

        store.set_setting("language", "en").unwrap();
        assert_eq!(store.setting("language").unwrap(), Some("en".to_string()));
    }

    #[test]
    fn test_prune_spares_unsynced_and_recent() {
        let store = LocalStore::open_in_memory().unwrap();

        // still offline: never pruned regardless of age
        let offline = capture_audio(&store);
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "UPDATE artifacts SET created_at = ?1 WHERE id = ?2",
                params![(Utc::now() - Duration::days(90)).to_rfc3339(), offline.id],
            )
            .unwrap();
        }

        // fully synced and old: pruned
        let old = capture_audio(&store);
        let entry = store.entry_for_artifact(&old.id).unwrap().unwrap();
        store.set_remote_id(&old.id, 11).unwrap();
        store
            .finish_entry(
                &entry.id,
                &old.id,
                ArtifactPatch {
                    status: Some(ArtifactStatus::Processed),
                    ..Default::default()
                },
            )
            .unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "UPDATE artifacts SET created_at = ?1 WHERE id = ?2",
                params![(Utc::now() - Duration::days(90)).to_rfc3339(), old.id],
            )
            .unwrap();
        }

        // fully synced but recent: spared
        let recent = capture_audio(&store);
        let entry = store.entry_for_artifact(&recent.id).unwrap().unwrap();
        store.set_remote_id(&recent.id, 12).unwrap();
        store
            .finish_entry(
                &entry.id,
                &recent.id,
                ArtifactPatch {
                    status: Some(ArtifactStatus::Processed),
                    ..Default::default()
                },
            )
            .unwrap();

        let removed = store.prune(DEFAULT_RETENTION_DAYS).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&offline.id).is_ok());
        assert!(store.get(&recent.id).is_ok());
        assert!(store.get(&old.id).is_err());
    }
}
