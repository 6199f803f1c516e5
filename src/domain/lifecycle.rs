//! Artifact lifecycle transition table.
//!
//! Enforced on every status write in the store rather than by a separate
//! tracking process, so no code path can move an artifact illegally.
//!
//! ```text
//! offline ──> processed ──────> validated (terminal)
//!    │             │  ^    └──> rejected  (terminal)
//!    │             │  │ (re-entrant reprocess)
//!    └──> error_processed ──> processed   (manual reprocess)
//!                  └────────> rejected
//! ```

use super::artifact::ArtifactStatus;

/// Whether `from -> to` is a legal status transition.
pub fn transition_allowed(from: ArtifactStatus, to: ArtifactStatus) -> bool {
    use ArtifactStatus::*;

    matches!(
        (from, to),
        (Offline, Processed)
            | (Offline, ErrorProcessed)
            | (Processed, Validated)
            | (Processed, Rejected)
            // on-demand reprocess, requires remote_id already set
            | (Processed, Processed)
            | (ErrorProcessed, Processed)
            | (ErrorProcessed, Rejected)
    )
}
