//! Confirm-to-archive step and its duplicate-key resolution protocol.
//!
//! Confirmation writes the reviewed record into the permanent store keyed
//! by (site, area, unit, unit type). A collision is not a failure: it is
//! surfaced as a structured conflict for the reviewer, who resolves it
//! with an explicit merge, overwrite, or ignore.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{Artifact, ArtifactStatus};
use crate::remote::{ArchiveApi, ConfirmRequest, DuplicateKey, RemoteError};
use crate::store::{ArtifactPatch, LocalStore, StoreError};

/// The field a submission cannot be confirmed without.
const REQUIRED_FIELD: &str = "area";

/// Errors from confirm/reject
#[derive(Debug, Error)]
pub enum ConfirmError {
    /// Raised before any network interaction; never auto-retried.
    #[error("required field '{field}' is empty")]
    Validation { field: &'static str },

    /// The archive already holds a record under this natural key.
    /// Requires explicit human resolution.
    #[error("duplicate record: {0}")]
    Conflict(DuplicateKey),

    /// The artifact is not in a state this action is legal from.
    #[error("artifact {id} is {status}, cannot {action}")]
    InvalidState {
        id: String,
        status: ArtifactStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Remote(RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RemoteError> for ConfirmError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Conflict(key) => Self::Conflict(key),
            other => Self::Remote(other),
        }
    }
}

/// How to resolve a duplicate-key collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    /// Field-level union: existing values survive where the submission is
    /// silent, submitted values win where it is not. Never a full replace.
    Merge,

    /// Replace the remote record wholesale with the submission.
    Overwrite,

    /// Purely local: no network call, artifact state unchanged, still
    /// reviewable later.
    Ignore,
}

impl ResolutionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Overwrite => "overwrite",
            Self::Ignore => "ignore",
        }
    }
}

/// Reviewed data submitted for confirmation
#[derive(Debug, Clone)]
pub struct ConfirmSubmission {
    pub fields: BTreeMap<String, String>,
    pub entity_type: String,
    pub target_table: String,
}

/// Outcome of a confirm call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Record written; artifact is now validated (terminal).
    Confirmed,

    /// Ignore resolution chosen; nothing changed anywhere.
    Ignored,
}

/// Drives the confirm/reject review protocol
pub struct ConflictResolver {
    store: Arc<LocalStore>,
    archive: Arc<dyn ArchiveApi>,
}

impl ConflictResolver {
    pub fn new(store: Arc<LocalStore>, archive: Arc<dyn ArchiveApi>) -> Self {
        Self { store, archive }
    }

    /// Confirm a processed artifact into the permanent record store.
    ///
    /// The required field check and the state check both run before any
    /// network call. A natural-key collision surfaces as
    /// [`ConfirmError::Conflict`] carrying the existing record's key; the
    /// caller resolves by re-invoking with a `force` action.
    #[instrument(skip(self, submission), fields(artifact = %artifact_id))]
    pub async fn confirm(
        &self,
        artifact_id: &str,
        submission: &ConfirmSubmission,
        force: Option<ResolutionAction>,
    ) -> Result<ConfirmOutcome, ConfirmError> {
        if submission
            .fields
            .get(REQUIRED_FIELD)
            .map_or(true, |v| v.trim().is_empty())
        {
            return Err(ConfirmError::Validation {
                field: REQUIRED_FIELD,
            });
        }

        let artifact = self.store.get(artifact_id)?;
        if artifact.status != ArtifactStatus::Processed {
            return Err(ConfirmError::InvalidState {
                id: artifact.id,
                status: artifact.status,
                action: "confirm",
            });
        }

        if force == Some(ResolutionAction::Ignore) {
            info!("conflict ignored, artifact left reviewable");
            return Ok(ConfirmOutcome::Ignored);
        }

        let remote_id = artifact.remote_id.ok_or(ConfirmError::InvalidState {
            id: artifact.id.clone(),
            status: artifact.status,
            action: "confirm",
        })?;

        let request = ConfirmRequest {
            extracted_fields: submission.fields.clone(),
            entity_type: submission.entity_type.clone(),
            target_table: submission.target_table.clone(),
            force_action: force.map(|a| a.as_str().to_string()),
        };

        self.archive.confirm(remote_id, &request).await?;

        self.store.update(
            artifact_id,
            ArtifactPatch {
                status: Some(ArtifactStatus::Validated),
                ..Default::default()
            },
        )?;
        info!("artifact confirmed into archive");
        Ok(ConfirmOutcome::Confirmed)
    }

    /// Reject an artifact: terminal, no archive write. Legal from
    /// `processed` and `error_processed`, never from a terminal state.
    #[instrument(skip(self), fields(artifact = %artifact_id))]
    pub async fn reject(&self, artifact_id: &str) -> Result<Artifact, ConfirmError> {
        let artifact = self.store.get(artifact_id)?;
        if !matches!(
            artifact.status,
            ArtifactStatus::Processed | ArtifactStatus::ErrorProcessed
        ) {
            return Err(ConfirmError::InvalidState {
                id: artifact.id,
                status: artifact.status,
                action: "reject",
            });
        }

        if let Some(remote_id) = artifact.remote_id {
            self.archive.reject(remote_id).await?;
        }

        let updated = self.store.update(
            artifact_id,
            ArtifactPatch {
                status: Some(ArtifactStatus::Rejected),
                ..Default::default()
            },
        )?;
        info!("artifact rejected");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_action_wire_names() {
        assert_eq!(ResolutionAction::Merge.as_str(), "merge");
        assert_eq!(ResolutionAction::Overwrite.as_str(), "overwrite");
        assert_eq!(ResolutionAction::Ignore.as_str(), "ignore");
    }
}
