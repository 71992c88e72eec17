//! Shared session state.
//!
//! DESIGN
//! ======
//! `SessionState` is the single owned context for one studio session. It
//! holds the template catalog and the generation log behind `Arc<RwLock<..>>`
//! and is cloned into services and view-models rather than living as ambient
//! globals. Both collections are ordered most-recent-first: insertion happens
//! at the head, queries preserve order.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::naming::NameSuggester;
use crate::notice::NoticeHub;
use crate::usage::UsageMeter;

// =============================================================================
// STATUS ENUMS
// =============================================================================

/// Whether a template is visible in the consumer catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Online,
    Offline,
    Draft,
}

/// Progress of a generation job. Terminal states are `Completed` and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Terminal statuses end a job; the completion task never revisits them.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

/// Visibility of a generated video, independent of processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Online,
    Offline,
}

/// How voice sync is driven for a template that supports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceSyncMode {
    Original,
    Custom,
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// An uploaded short-video asset available for swap generation.
///
/// Size and content are fixed at admission; only `status` and bookkeeping
/// counters mutate afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub status: LifecycleStatus,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: i64,
    pub tags: Vec<String>,
    pub duration: String,
    pub resolution: String,
    pub thumbnail_url: String,
    pub creator: Option<String>,
    pub usage_count: u64,
    pub supports_voice_sync: bool,
    pub voice_sync_mode: Option<VoiceSyncMode>,
    pub default_script: Option<String>,
}

// =============================================================================
// GENERATION RECORD
// =============================================================================

/// One consumer swap applied to a template. The `template_name` is a snapshot
/// taken at submit time so renames or deletions upstream don't rewrite
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub template_id: Uuid,
    pub template_name: String,
    pub user_name: String,
    pub thumbnail_url: String,
    pub status: ProcessingStatus,
    /// Carried independently of `status`; a `Processing` record may already
    /// hold a publish status. The consumer feed only surfaces records that
    /// are both `Completed` and `Online`.
    pub publish_status: Option<PublishStatus>,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: i64,
    pub video_no: Option<String>,
    pub user_mobile: Option<String>,
    pub share_count: u64,
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Counts shown on the generation-management dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub failed: usize,
}

/// Filter for the generation list. The filtered view is the "visible list"
/// select-all operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(ProcessingStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: ProcessingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == wanted,
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Shared session state, cloned into services and view-models. All inner
/// fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct SessionState {
    pub templates: Arc<RwLock<Vec<Template>>>,
    pub generations: Arc<RwLock<Vec<GenerationRecord>>>,
    /// Per-user daily generation cap.
    pub usage: UsageMeter,
    /// Fan-out for transient user notices.
    pub notices: NoticeHub,
    /// Optional name-suggestion backend. `None` degrades to the fixed
    /// default label.
    pub naming: Option<Arc<dyn NameSuggester>>,
}

impl SessionState {
    #[must_use]
    pub fn new(naming: Option<Arc<dyn NameSuggester>>) -> Self {
        Self {
            templates: Arc::new(RwLock::new(Vec::new())),
            generations: Arc::new(RwLock::new(Vec::new())),
            usage: UsageMeter::new(),
            notices: NoticeHub::new(),
            naming,
        }
    }
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// TEST HELPERS
// =============================================================================


// =============================================================================
// TESTS
// =============================================================================
