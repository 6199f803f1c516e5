//! Shared test fixtures: an in-memory archive standing in for the HTTP
//! backend, plus helpers for seeding captures.

// Each integration test binary compiles this module separately and uses
// a different subset of it.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use fieldsync::domain::{Artifact, ArtifactKind, Interpretation};
use fieldsync::ingest::{capture_file, CaptureRequest};
use fieldsync::remote::{
    ArchiveApi, ConfirmRequest, DuplicateKey, ProcessOutcome, RemoteError, RemoteNote,
    UploadRequest,
};
use fieldsync::store::LocalStore;

/// An archived record, keyed by (site, area, unit, unit_type)
#[derive(Debug, Clone)]
pub struct ArchivedRecord {
    pub key: DuplicateKey,
    pub fields: BTreeMap<String, String>,
}

#[derive(Default)]
struct MockState {
    next_note_id: i64,
    notes: Vec<RemoteNote>,
    records: Vec<ArchivedRecord>,
}

/// In-memory stand-in for the archive backend.
///
/// Failures are programmable per call site; every method bumps a counter
/// so tests can assert on how much network traffic an operation caused.
pub struct MockArchive {
    state: Mutex<MockState>,
    /// Outcome returned by `process`; `None` means a generic server error
    pub process_outcome: Mutex<Option<ProcessOutcome>>,
    /// Upload calls that should fail before succeeding
    pub upload_failures: AtomicUsize,
    /// When true, every process call fails
    pub process_fails: Mutex<bool>,
    /// When set, every process call blocks until the gate is notified
    pub process_gate: Mutex<Option<Arc<Notify>>>,
    pub upload_calls: AtomicUsize,
    pub process_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub reject_calls: AtomicUsize,
}

impl MockArchive {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_note_id: 100,
                ..Default::default()
            }),
            process_outcome: Mutex::new(Some(default_outcome())),
            upload_failures: AtomicUsize::new(0),
            process_fails: Mutex::new(false),
            process_gate: Mutex::new(None),
            upload_calls: AtomicUsize::new(0),
            process_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            reject_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_uploads(&self, n: usize) {
        self.upload_failures.store(n, Ordering::SeqCst);
    }

    pub fn set_process_fails(&self, fails: bool) {
        *self.process_fails.lock().unwrap() = fails;
    }

    /// Make process calls block until the returned gate is notified.
    pub fn gate_process(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.process_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn set_process_outcome(&self, outcome: ProcessOutcome) {
        *self.process_outcome.lock().unwrap() = Some(outcome);
    }

    /// Pre-seed an archived record so a later confirm collides with it.
    pub fn seed_record(&self, key: DuplicateKey, fields: BTreeMap<String, String>) {
        self.state
            .lock()
            .unwrap()
            .records
            .push(ArchivedRecord { key, fields });
    }

    /// Pre-seed server-side note state for refresh tests.
    pub fn seed_note(&self, note: RemoteNote) {
        self.state.lock().unwrap().notes.push(note);
    }

    pub fn record(&self, key: &DuplicateKey) -> Option<ArchivedRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| &r.key == key)
            .cloned()
    }

    fn record_key(fields: &BTreeMap<String, String>, entity_type: &str) -> DuplicateKey {
        DuplicateKey {
            site: fields.get("sito").cloned().unwrap_or_default(),
            area: fields.get("area").cloned().unwrap_or_default(),
            unit: fields.get("us").cloned().unwrap_or_default(),
            unit_type: entity_type.to_string(),
        }
    }
}

#[async_trait]
impl ArchiveApi for MockArchive {
    async fn upload(&self, _req: &UploadRequest, _media: Vec<u8>) -> Result<i64, RemoteError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.upload_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.upload_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RemoteError::Network("connection reset".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let id = state.next_note_id;
        state.next_note_id += 1;
        state.notes.push(RemoteNote {
            note_id: id,
            status: "uploaded".to_string(),
            transcription: None,
            detected_language: None,
            interpretation: None,
        });
        Ok(id)
    }

    async fn process(
        &self,
        note_id: i64,
        _force_reprocess: bool,
    ) -> Result<ProcessOutcome, RemoteError> {
        self.process_calls.fetch_add(1, Ordering::SeqCst);

        // clone the gate out so the lock is not held across the await
        let gate = self.process_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if *self.process_fails.lock().unwrap() {
            return Err(RemoteError::Server {
                status: 500,
                message: "transcription backend unavailable".to_string(),
            });
        }

        let outcome = self
            .process_outcome
            .lock()
            .unwrap()
            .clone()
            .ok_or(RemoteError::Server {
                status: 500,
                message: "no outcome configured".to_string(),
            })?;

        let mut state = self.state.lock().unwrap();
        if let Some(note) = state.notes.iter_mut().find(|n| n.note_id == note_id) {
            note.status = "processed".to_string();
            note.transcription = Some(outcome.transcription.clone());
            note.detected_language = outcome.detected_language.clone();
            note.interpretation = outcome.interpretation.clone();
        }
        Ok(outcome)
    }

    async fn confirm(&self, _note_id: i64, req: &ConfirmRequest) -> Result<(), RemoteError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);

        let key = Self::record_key(&req.extracted_fields, &req.entity_type);
        let mut state = self.state.lock().unwrap();

        let existing = state.records.iter_mut().find(|r| r.key == key);
        match (existing, req.force_action.as_deref()) {
            (Some(_), None) => Err(RemoteError::Conflict(key)),
            (Some(record), Some("merge")) => {
                // Field-level union: submitted values win, absent survive.
                for (k, v) in &req.extracted_fields {
                    record.fields.insert(k.clone(), v.clone());
                }
                Ok(())
            }
            (Some(record), Some("overwrite")) => {
                record.fields = req.extracted_fields.clone();
                Ok(())
            }
            (Some(_), Some(other)) => Err(RemoteError::Server {
                status: 400,
                message: format!("unknown force_action: {other}"),
            }),
            (None, _) => {
                state.records.push(ArchivedRecord {
                    key,
                    fields: req.extracted_fields.clone(),
                });
                Ok(())
            }
        }
    }

    async fn reject(&self, _note_id: i64) -> Result<(), RemoteError> {
        self.reject_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_notes(&self) -> Result<Vec<RemoteNote>, RemoteError> {
        Ok(self.state.lock().unwrap().notes.clone())
    }
}

pub fn default_outcome() -> ProcessOutcome {
    ProcessOutcome {
        transcription: "US 2045, strato di terra marrone".to_string(),
        detected_language: Some("it".to_string()),
        interpretation: Some(Interpretation {
            entity_type: "US".to_string(),
            target_table: "us_table".to_string(),
            confidence: 0.92,
            extracted_fields: BTreeMap::from([
                ("sito".to_string(), "Pompeii".to_string()),
                ("area".to_string(), "1".to_string()),
                ("us".to_string(), "2045".to_string()),
                (
                    "descrizione".to_string(),
                    "strato di terra marrone".to_string(),
                ),
            ]),
            relationships: Vec::new(),
            notes: String::new(),
        }),
    }
}

/// Write a media file into the temp dir and capture it into the store.
pub async fn capture_fixture(
    store: &Arc<LocalStore>,
    dir: &TempDir,
    kind: ArtifactKind,
    name: &str,
    bytes: &[u8],
) -> Artifact {
    let source = dir.path().join(name);
    tokio::fs::write(&source, bytes).await.unwrap();

    let media_dir = dir.path().join("media");
    tokio::fs::create_dir_all(&media_dir).await.unwrap();

    capture_file(
        store,
        kind,
        &source,
        &media_dir,
        CaptureRequest {
            site: "Pompeii".to_string(),
            recorded_by: Some("M. Rossi".to_string()),
            gps_lat: Some(40.75),
            gps_lon: Some(14.49),
        },
    )
    .await
    .unwrap()
}
