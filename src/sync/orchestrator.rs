//! Sync orchestrator: drains the pending queue against the archive.
//!
//! A run takes a snapshot of the queue and processes it sequentially.
//! Per item: decode payload, upload, persist the remote id immediately
//! (the durability point), invoke remote processing, persist the result.
//! One item's failure never aborts the run; the report carries a per-item
//! error list.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Artifact, ArtifactStatus, QueueEntry};
use crate::remote::{ArchiveApi, ProcessOutcome, RemoteError, UploadRequest};
use crate::store::{ArtifactPatch, LocalStore, StoreError};

use super::connectivity::ConnectivityNotifier;

/// Errors that abort a whole orchestrator operation
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("artifact {0} has no remote id; it must sync before reprocessing")]
    NotUploaded(String),
}

/// Per-item failure cause recorded in the batch report
#[derive(Debug, Error)]
pub enum SyncItemError {
    #[error("payload unreadable: {0}")]
    Payload(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which step of the per-item pipeline failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    /// Intake upload failed: the entry stays queued and retries next run.
    Upload,

    /// Upload succeeded but processing failed: the artifact is parked in
    /// `error_processed` and leaves the queue; only an explicit reprocess
    /// recovers it.
    Process,
}

/// One failed item in a sync run
#[derive(Debug)]
pub struct SyncFailure {
    pub entry: QueueEntry,
    pub stage: SyncStage,
    pub error: SyncItemError,
}

/// Aggregate result of one sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    pub total: usize,
    pub completed: usize,
    pub errors: Vec<SyncFailure>,
}

/// Progress notification emitted after each item
#[derive(Debug, Clone)]
pub struct SyncProgress {
    pub done: usize,
    pub total: usize,
    pub artifact_id: String,
}

/// Drains the capture queue against the remote archive
pub struct SyncOrchestrator {
    store: Arc<LocalStore>,
    archive: Arc<dyn ArchiveApi>,
    /// Serializes runs; a trigger while a run is active is discarded.
    run_lock: Mutex<()>,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<LocalStore>, archive: Arc<dyn ArchiveApi>) -> Self {
        Self {
            store,
            archive,
            run_lock: Mutex::new(()),
        }
    }

    /// Run one sync pass over the current queue snapshot.
    ///
    /// Returns `None` without touching anything when a run is already
    /// executing. `progress` fires once per drained item.
    #[instrument(skip(self, progress))]
    pub async fn run_sync<F>(&self, mut progress: F) -> Result<Option<SyncReport>, SyncError>
    where
        F: FnMut(SyncProgress),
    {
        let _guard = match self.run_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("sync already running, trigger discarded");
                return Ok(None);
            }
        };

        let snapshot = self.store.queue_snapshot()?;
        let mut report = SyncReport {
            total: snapshot.len(),
            ..Default::default()
        };

        if snapshot.is_empty() {
            return Ok(Some(report));
        }

        info!(pending = snapshot.len(), "sync run started");

        for (idx, entry) in snapshot.into_iter().enumerate() {
            let artifact_id = entry.artifact_id.clone();
            match self.sync_entry(&entry).await {
                Ok(()) => report.completed += 1,
                Err((stage, error)) => {
                    warn!(
                        artifact = %artifact_id,
                        ?stage,
                        %error,
                        "sync item failed"
                    );
                    report.errors.push(SyncFailure { entry, stage, error });
                }
            }
            progress(SyncProgress {
                done: idx + 1,
                total: report.total,
                artifact_id,
            });
        }

        info!(
            total = report.total,
            completed = report.completed,
            failed = report.errors.len(),
            "sync run finished"
        );
        Ok(Some(report))
    }

    /// Drive one queue entry through upload and processing.
    async fn sync_entry(&self, entry: &QueueEntry) -> Result<(), (SyncStage, SyncItemError)> {
        let artifact = match self.store.get(&entry.artifact_id) {
            Ok(artifact) => artifact,
            Err(StoreError::NotFound(_)) => {
                // Orphaned entry; the cascade should make this impossible,
                // but a stale entry must not wedge the queue.
                warn!(entry = %entry.id, "dropping queue entry with no artifact");
                return self
                    .store
                    .remove_entry(&entry.id)
                    .map_err(|e| (SyncStage::Upload, e.into()));
            }
            Err(e) => return Err((SyncStage::Upload, e.into())),
        };

        // An artifact that already has a remote id was uploaded by an
        // interrupted run; resume at the processing step, never re-upload.
        let remote_id = match artifact.remote_id {
            Some(id) => id,
            None => match self.upload(&artifact).await {
                Ok(id) => {
                    self.store
                        .set_remote_id(&artifact.id, id)
                        .map_err(|e| (SyncStage::Upload, e.into()))?;
                    id
                }
                Err(error) => {
                    if let Err(e) = self.store.increment_attempts(&entry.id) {
                        return Err((SyncStage::Upload, e.into()));
                    }
                    return Err((SyncStage::Upload, error));
                }
            },
        };

        match self.archive.process(remote_id, false).await {
            Ok(outcome) => {
                self.store
                    .finish_entry(&entry.id, &artifact.id, processed_patch(outcome))
                    .map_err(|e| (SyncStage::Process, e.into()))?;
                debug!(artifact = %artifact.id, remote_id, "processed");
                Ok(())
            }
            Err(error) => {
                // Processing failures do not re-enter the queue; recovery is
                // an explicit reprocess.
                self.store
                    .finish_entry(
                        &entry.id,
                        &artifact.id,
                        ArtifactPatch {
                            status: Some(ArtifactStatus::ErrorProcessed),
                            ..Default::default()
                        },
                    )
                    .map_err(|e| (SyncStage::Process, e.into()))?;
                Err((SyncStage::Process, error.into()))
            }
        }
    }

    /// Read the payload into transmission form and upload it.
    async fn upload(&self, artifact: &Artifact) -> Result<i64, SyncItemError> {
        let media = tokio::fs::read(&artifact.meta.media_path)
            .await
            .map_err(|e| {
                SyncItemError::Payload(format!(
                    "{}: {}",
                    artifact.meta.media_path.display(),
                    e
                ))
            })?;

        let request = UploadRequest {
            kind: artifact.kind,
            site: artifact.meta.site.clone(),
            recorded_by: artifact.meta.recorded_by.clone(),
            gps_lat: artifact.meta.gps_lat,
            gps_lon: artifact.meta.gps_lon,
            file_name: artifact.meta.file_name.clone(),
            idempotency_key: artifact.content_hash.clone(),
        };

        Ok(self.archive.upload(&request, media).await?)
    }

    /// Reconcile with authoritative server state: patch any artifact whose
    /// synchronous process call timed out but which the server has since
    /// finished. Returns the number of artifacts patched.
    #[instrument(skip(self))]
    pub async fn refresh_processed(&self) -> Result<usize, SyncError> {
        let notes = self.archive.list_notes().await?;
        let mut patched = 0;

        for artifact in self.store.list(&Default::default())? {
            let Some(remote_id) = artifact.remote_id else {
                continue;
            };
            if artifact.status == ArtifactStatus::Processed || artifact.status.is_terminal() {
                continue;
            }

            let Some(note) = notes.iter().find(|n| n.note_id == remote_id) else {
                continue;
            };
            if note.status != "processed" {
                continue;
            }

            let patch = ArtifactPatch {
                status: Some(ArtifactStatus::Processed),
                transcription: note.transcription.clone(),
                detected_language: note.detected_language.clone(),
                interpretation: note.interpretation.clone(),
                ..Default::default()
            };

            // An interrupted run may have left the queue entry behind.
            match self.store.entry_for_artifact(&artifact.id)? {
                Some(entry) => {
                    self.store.finish_entry(&entry.id, &artifact.id, patch)?;
                }
                None => {
                    self.store.update(&artifact.id, patch)?;
                }
            }
            info!(artifact = %artifact.id, remote_id, "reconciled from server state");
            patched += 1;
        }

        Ok(patched)
    }

    /// On-demand reprocess of an already-uploaded artifact. Distinct from
    /// the sync loop: never queued, never retried automatically.
    #[instrument(skip(self))]
    pub async fn reprocess(&self, artifact_id: &str) -> Result<Artifact, SyncError> {
        let artifact = self.store.get(artifact_id)?;
        let remote_id = artifact
            .remote_id
            .ok_or_else(|| SyncError::NotUploaded(artifact_id.to_string()))?;

        // Fail fast on terminal artifacts before any network call.
        if !crate::domain::transition_allowed(artifact.status, ArtifactStatus::Processed) {
            return Err(StoreError::InvalidTransition {
                from: artifact.status,
                to: ArtifactStatus::Processed,
            }
            .into());
        }

        let outcome = self.archive.process(remote_id, true).await?;
        Ok(self.store.update(artifact_id, processed_patch(outcome))?)
    }

    /// Subscribe to a connectivity notifier and run a sync exactly once per
    /// offline-to-online edge. A transition during an active run is
    /// discarded by the run lock, not queued.
    pub fn watch_connectivity(
        self: &Arc<Self>,
        notifier: &dyn ConnectivityNotifier,
    ) -> JoinHandle<()> {
        let mut rx = notifier.subscribe();
        let orchestrator = Arc::clone(self);

        tokio::spawn(async move {
            let mut online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let now = *rx.borrow();
                if now && !online {
                    info!("connectivity restored, starting sync");
                    match orchestrator.run_sync(|_| {}).await {
                        Ok(Some(report)) => {
                            debug!(completed = report.completed, "auto sync finished")
                        }
                        Ok(None) => debug!("auto sync skipped, run already active"),
                        Err(e) => error!(error = %e, "auto sync failed"),
                    }
                }
                online = now;
            }
        })
    }
}

fn processed_patch(outcome: ProcessOutcome) -> ArtifactPatch {
    ArtifactPatch {
        status: Some(ArtifactStatus::Processed),
        transcription: Some(outcome.transcription),
        detected_language: outcome.detected_language,
        interpretation: outcome.interpretation,
        ..Default::default()
    }
}
