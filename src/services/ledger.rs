//! Template ledger — quota-gated admission and catalog mutations.
//!
//! DESIGN
//! ======
//! The ledger enforces three ceilings at admission: a per-file size cap, a
//! catalog count cap, and an aggregate storage cap. Quota checks are pure
//! functions of current state plus the candidate size. Status changes and
//! deletion are unconditional here; policy gating (offline-before-delete,
//! confirmation) lives in the bulk coordinator.
//!
//! Admitted templates go in at the head of the catalog (most-recent-first)
//! and are immediately `Online`, matching the upload flow's final step.

use tracing::info;
use uuid::Uuid;

use crate::notice::NoticeCode;
use crate::state::{LifecycleStatus, SessionState, Template, VoiceSyncMode, now_ms};

/// Catalog count ceiling.
pub const MAX_TEMPLATE_COUNT: usize = 20;

/// Aggregate storage ceiling: 500 MiB.
pub const MAX_STORAGE_BYTES: u64 = 500 * 1024 * 1024;

/// Per-file ceiling: 50 MiB, independent of remaining quota.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

// =============================================================================
// TYPES
// =============================================================================

/// Which ceiling a `QuotaExceeded` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    Count,
    Storage,
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaKind::Count => write!(f, "count"),
            QuotaKind::Storage => write!(f, "storage"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{kind} quota reached ({used}/{ceiling}); free up the catalog first")]
    QuotaExceeded { kind: QuotaKind, used: u64, ceiling: u64 },
    #[error("file too large: {size_bytes} bytes exceeds the {MAX_UPLOAD_BYTES}-byte per-upload ceiling")]
    FileTooLarge { size_bytes: u64 },
    #[error("not enough storage remaining: file is {size_bytes} bytes, {remaining_bytes} bytes left")]
    InsufficientQuota { size_bytes: u64, remaining_bytes: u64 },
}

impl NoticeCode for LedgerError {
    fn notice_code(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { kind: QuotaKind::Count, .. } => "E_QUOTA_COUNT",
            Self::QuotaExceeded { kind: QuotaKind::Storage, .. } => "E_QUOTA_STORAGE",
            Self::FileTooLarge { .. } => "E_FILE_TOO_LARGE",
            Self::InsufficientQuota { .. } => "E_INSUFFICIENT_QUOTA",
        }
    }

    fn blocking(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// A candidate template as it leaves the upload dialog.
#[derive(Debug, Clone)]
pub struct TemplateUpload {
    pub name: String,
    pub size_bytes: u64,
    pub tags: Vec<String>,
    pub duration: String,
    pub resolution: String,
    pub thumbnail_url: String,
    pub creator: Option<String>,
    pub supports_voice_sync: bool,
    pub voice_sync_mode: Option<VoiceSyncMode>,
    pub default_script: Option<String>,
}

/// Snapshot of quota usage for the admin quota card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub used_bytes: u64,
    pub count: usize,
    pub remaining_bytes: u64,
    pub count_full: bool,
    pub storage_full: bool,
}

// =============================================================================
// ADMISSION
// =============================================================================

/// Admit a candidate into the catalog.
///
/// # Errors
///
/// `FileTooLarge` if the candidate exceeds the per-file ceiling,
/// `QuotaExceeded(Count)` if the catalog is at capacity, and
/// `QuotaExceeded(Storage)` if the candidate would push aggregate storage
/// over the ceiling. On any error the catalog is left unchanged.
pub async fn admit(state: &SessionState, upload: TemplateUpload) -> Result<Template, LedgerError> {
    if upload.size_bytes > MAX_UPLOAD_BYTES {
        return Err(LedgerError::FileTooLarge { size_bytes: upload.size_bytes });
    }

    let mut catalog = state.templates.write().await;

    if catalog.len() >= MAX_TEMPLATE_COUNT {
        return Err(LedgerError::QuotaExceeded {
            kind: QuotaKind::Count,
            used: catalog.len() as u64,
            ceiling: MAX_TEMPLATE_COUNT as u64,
        });
    }

    let used_bytes: u64 = catalog.iter().map(|t| t.size_bytes).sum();
    if used_bytes + upload.size_bytes > MAX_STORAGE_BYTES {
        return Err(LedgerError::QuotaExceeded {
            kind: QuotaKind::Storage,
            used: used_bytes,
            ceiling: MAX_STORAGE_BYTES,
        });
    }

    let template = Template {
        id: Uuid::new_v4(),
        name: upload.name,
        size_bytes: upload.size_bytes,
        status: LifecycleStatus::Online,
        created_at_ms: now_ms(),
        tags: upload.tags,
        duration: upload.duration,
        resolution: upload.resolution,
        thumbnail_url: upload.thumbnail_url,
        creator: upload.creator,
        usage_count: 0,
        supports_voice_sync: upload.supports_voice_sync,
        voice_sync_mode: upload.voice_sync_mode,
        default_script: upload.default_script,
    };

    let stored = template.clone();
    catalog.insert(0, template);
    info!(template_id = %stored.id, size_bytes = stored.size_bytes, count = catalog.len(), "template admitted");

    Ok(stored)
}

/// Pre-upload gate: refuse before the dialog opens when a ceiling is already
/// reached.
///
/// # Errors
///
/// `QuotaExceeded` naming the ceiling that is full.
pub async fn check_capacity(state: &SessionState) -> Result<(), LedgerError> {
    let catalog = state.templates.read().await;

    if catalog.len() >= MAX_TEMPLATE_COUNT {
        return Err(LedgerError::QuotaExceeded {
            kind: QuotaKind::Count,
            used: catalog.len() as u64,
            ceiling: MAX_TEMPLATE_COUNT as u64,
        });
    }

    let used_bytes: u64 = catalog.iter().map(|t| t.size_bytes).sum();
    if used_bytes >= MAX_STORAGE_BYTES {
        return Err(LedgerError::QuotaExceeded {
            kind: QuotaKind::Storage,
            used: used_bytes,
            ceiling: MAX_STORAGE_BYTES,
        });
    }

    Ok(())
}

/// Upload-dialog validation for a picked file.
///
/// # Errors
///
/// `FileTooLarge` before any quota consideration; otherwise
/// `InsufficientQuota` when the file fits the per-file ceiling but not the
/// remaining ledger space.
pub async fn validate_candidate(state: &SessionState, size_bytes: u64) -> Result<(), LedgerError> {
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(LedgerError::FileTooLarge { size_bytes });
    }

    let remaining = remaining_bytes(state).await;
    if size_bytes > remaining {
        return Err(LedgerError::InsufficientQuota { size_bytes, remaining_bytes: remaining });
    }

    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

/// Storage ceiling minus used bytes, clamped at zero for display.
pub async fn remaining_bytes(state: &SessionState) -> u64 {
    let catalog = state.templates.read().await;
    let used_bytes: u64 = catalog.iter().map(|t| t.size_bytes).sum();
    MAX_STORAGE_BYTES.saturating_sub(used_bytes)
}

/// Usage snapshot for the admin quota card.
pub async fn storage_stats(state: &SessionState) -> StorageStats {
    let catalog = state.templates.read().await;
    let used_bytes: u64 = catalog.iter().map(|t| t.size_bytes).sum();
    let count = catalog.len();
    StorageStats {
        used_bytes,
        count,
        remaining_bytes: MAX_STORAGE_BYTES.saturating_sub(used_bytes),
        count_full: count >= MAX_TEMPLATE_COUNT,
        storage_full: used_bytes >= MAX_STORAGE_BYTES,
    }
}

/// Templates visible to consumers: `Online` only, catalog order.
pub async fn consumer_catalog(state: &SessionState) -> Vec<Template> {
    let catalog = state.templates.read().await;
    catalog
        .iter()
        .filter(|t| t.status == LifecycleStatus::Online)
        .cloned()
        .collect()
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Set the lifecycle status of the given templates. Unconditional at this
/// level; returns how many templates were touched.
pub async fn set_status(state: &SessionState, ids: &[Uuid], status: LifecycleStatus) -> usize {
    let mut catalog = state.templates.write().await;
    let mut touched = 0;
    for template in catalog.iter_mut() {
        if ids.contains(&template.id) {
            template.status = status;
            touched += 1;
        }
    }
    info!(touched, ?status, "template status updated");
    touched
}

/// Remove the given templates. Unconditional at this level; returns how many
/// were removed.
pub async fn remove(state: &SessionState, ids: &[Uuid]) -> usize {
    let mut catalog = state.templates.write().await;
    let before = catalog.len();
    catalog.retain(|t| !ids.contains(&t.id));
    let removed = before - catalog.len();
    info!(removed, remaining = catalog.len(), "templates removed");
    removed
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
