//! Sync orchestration: queue draining, reconciliation, and the
//! connectivity trigger.

pub mod connectivity;
pub mod orchestrator;

pub use connectivity::{ConnectivityNotifier, ManualConnectivity};
pub use orchestrator::{
    SyncError, SyncFailure, SyncItemError, SyncOrchestrator, SyncProgress, SyncReport, SyncStage,
};
