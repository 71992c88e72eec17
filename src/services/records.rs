//! Generation log — record queries and collection mutations.
//!
//! DESIGN
//! ======
//! Mirrors the ledger for the second entity type. Publish/unpublish and
//! deletion are unconditional here; gating and confirmation live in the bulk
//! coordinator. Unlike templates, generation records never carry a quota.

use tracing::info;
use uuid::Uuid;

use crate::state::{DashboardStats, GenerationRecord, ProcessingStatus, PublishStatus, SessionState, StatusFilter};

// =============================================================================
// QUERIES
// =============================================================================

/// Records matching the given processing-status filter, log order. This is
/// the visible list generation select-all operates on.
pub async fn filtered(state: &SessionState, filter: StatusFilter) -> Vec<GenerationRecord> {
    let log = state.generations.read().await;
    log.iter().filter(|r| filter.matches(r.status)).cloned().collect()
}

/// Counts for the generation-management dashboard.
pub async fn dashboard_stats(state: &SessionState) -> DashboardStats {
    let log = state.generations.read().await;
    let mut stats = DashboardStats { total: log.len(), completed: 0, processing: 0, failed: 0 };
    for record in log.iter() {
        match record.status {
            ProcessingStatus::Completed => stats.completed += 1,
            ProcessingStatus::Processing => stats.processing += 1,
            ProcessingStatus::Failed => stats.failed += 1,
        }
    }
    stats
}

/// Look up one record by id.
pub async fn get(state: &SessionState, record_id: Uuid) -> Option<GenerationRecord> {
    let log = state.generations.read().await;
    log.iter().find(|r| r.id == record_id).cloned()
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Set the publish status of the given records. Processing status is not
/// consulted: a record may be published before it completes.
pub async fn set_publish_status(state: &SessionState, ids: &[Uuid], status: PublishStatus) -> usize {
    let mut log = state.generations.write().await;
    let mut touched = 0;
    for record in log.iter_mut() {
        if ids.contains(&record.id) {
            record.publish_status = Some(status);
            touched += 1;
        }
    }
    info!(touched, ?status, "generation publish status updated");
    touched
}

/// Remove the given records. Always permitted, regardless of publish status.
pub async fn remove(state: &SessionState, ids: &[Uuid]) -> usize {
    let mut log = state.generations.write().await;
    let before = log.len();
    log.retain(|r| !ids.contains(&r.id));
    let removed = before - log.len();
    info!(removed, remaining = log.len(), "generation records removed");
    removed
}

// =============================================================================
// TESTS
// =============================================================================
