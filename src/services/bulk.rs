//! Bulk action coordinator — gated group mutations with confirmation.
//!
//! DESIGN
//! ======
//! Each invoked action moves through `Requested → AwaitingConfirmation →
//! {Applied | Cancelled}`. `request` computes the effective target set (ids
//! whose current state differs from the requested target), silently drops
//! actions with nothing to do, and refuses rule violations before any
//! confirmation is shown. `confirm` applies the pending action atomically to
//! the owning collection; `cancel` mutates nothing.
//!
//! Rules: template deletion requires every selected template to be off the
//! catalog (`has_online` false). Generation-record deletion is always
//! permitted: administrative content can be purged, the safety rule protects
//! only what the consumer catalog depends on. Platform operators skip
//! confirmation for template status changes entirely.

use tracing::{info, warn};
use uuid::Uuid;

use crate::notice::{Notice, NoticeCode};
use crate::services::{ledger, records};
use crate::state::{LifecycleStatus, PublishStatus, SessionState};

// =============================================================================
// TYPES
// =============================================================================

/// A group mutation over one of the two owned collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    SetTemplateStatus(LifecycleStatus),
    DeleteTemplates,
    SetPublishStatus(PublishStatus),
    DeleteGenerations,
}

impl BulkAction {
    fn verb(self) -> &'static str {
        match self {
            Self::SetTemplateStatus(LifecycleStatus::Online) | Self::SetPublishStatus(PublishStatus::Online) => {
                "publish"
            }
            Self::SetTemplateStatus(LifecycleStatus::Offline) | Self::SetPublishStatus(PublishStatus::Offline) => {
                "unpublish"
            }
            Self::SetTemplateStatus(LifecycleStatus::Draft) => "move to draft",
            Self::DeleteTemplates | Self::DeleteGenerations => "delete",
        }
    }

    fn verb_past(self) -> &'static str {
        match self {
            Self::SetTemplateStatus(LifecycleStatus::Online) | Self::SetPublishStatus(PublishStatus::Online) => {
                "published"
            }
            Self::SetTemplateStatus(LifecycleStatus::Offline) | Self::SetPublishStatus(PublishStatus::Offline) => {
                "unpublished"
            }
            Self::SetTemplateStatus(LifecycleStatus::Draft) => "moved to draft",
            Self::DeleteTemplates | Self::DeleteGenerations => "deleted",
        }
    }

    fn noun(self, count: usize) -> &'static str {
        match self {
            Self::SetTemplateStatus(_) | Self::DeleteTemplates => {
                if count == 1 { "template" } else { "templates" }
            }
            Self::SetPublishStatus(_) | Self::DeleteGenerations => {
                if count == 1 { "generated video" } else { "generated videos" }
            }
        }
    }
}

/// Trust tier of the caller. Operators mutate template status without a
/// confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Admin,
    Operator,
}

#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("for safety, unpublish templates before deleting them")]
    ActionRefused,
    #[error("no action awaiting confirmation")]
    NothingPending,
}

impl NoticeCode for BulkError {
    fn notice_code(&self) -> &'static str {
        match self {
            Self::ActionRefused => "E_ACTION_REFUSED",
            Self::NothingPending => "E_NOTHING_PENDING",
        }
    }
}

/// An action held at the confirmation step.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: BulkAction,
    pub target_ids: Vec<Uuid>,
    /// Human-readable summary: action name plus affected count.
    pub summary: String,
}

/// Outcome of `request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Effective target set was empty; nothing shown to the user.
    Dropped,
    /// Held for confirmation; `confirm` or `cancel` resolves it.
    AwaitingConfirmation { summary: String, affected: usize },
    /// Operator bypass: mutation already applied.
    Applied { affected: usize },
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Per-session coordinator. At most one action is pending at a time; a new
/// request replaces an unconfirmed one.
#[derive(Debug, Default)]
pub struct BulkCoordinator {
    pending: Option<PendingAction>,
}

impl BulkCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self { pending: None }
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Validate a selection against the action's rules and stage it for
    /// confirmation (or apply it directly on the operator bypass path).
    ///
    /// # Errors
    ///
    /// `ActionRefused` when an admin attempts to delete templates while an
    /// online template is selected. The refusal notice is published here and
    /// the caller's selection must be left unchanged.
    pub async fn request(
        &mut self,
        state: &SessionState,
        action: BulkAction,
        selected: &[Uuid],
        tier: Tier,
    ) -> Result<RequestOutcome, BulkError> {
        let target_ids = match action {
            BulkAction::SetTemplateStatus(status) => {
                let catalog = state.templates.read().await;
                catalog
                    .iter()
                    .filter(|t| selected.contains(&t.id) && t.status != status)
                    .map(|t| t.id)
                    .collect::<Vec<_>>()
            }
            BulkAction::DeleteTemplates => {
                let catalog = state.templates.read().await;
                let chosen: Vec<_> = catalog.iter().filter(|t| selected.contains(&t.id)).collect();
                let has_online = chosen.iter().any(|t| t.status == LifecycleStatus::Online);
                if tier == Tier::Admin && has_online {
                    warn!(selected = chosen.len(), "bulk template delete refused: online template selected");
                    state.notices.publish(&Notice::error_from(&BulkError::ActionRefused));
                    return Err(BulkError::ActionRefused);
                }
                chosen.iter().map(|t| t.id).collect()
            }
            BulkAction::SetPublishStatus(status) => {
                let log = state.generations.read().await;
                log.iter()
                    .filter(|r| selected.contains(&r.id) && r.publish_status != Some(status))
                    .map(|r| r.id)
                    .collect::<Vec<_>>()
            }
            BulkAction::DeleteGenerations => {
                let log = state.generations.read().await;
                log.iter().filter(|r| selected.contains(&r.id)).map(|r| r.id).collect()
            }
        };

        if target_ids.is_empty() {
            // Nothing would change: drop without bothering the user.
            self.pending = None;
            return Ok(RequestOutcome::Dropped);
        }

        let affected = target_ids.len();

        // Reduced-friction trust tier: operators change template status
        // without the confirmation step.
        if tier == Tier::Operator && matches!(action, BulkAction::SetTemplateStatus(_)) {
            let applied = apply(state, action, &target_ids).await;
            return Ok(RequestOutcome::Applied { affected: applied });
        }

        let summary = format!("{} {} {}?", capitalize(action.verb()), affected, action.noun(affected));
        info!(affected, summary = %summary, "bulk action awaiting confirmation");
        self.pending = Some(PendingAction { action, target_ids, summary: summary.clone() });

        Ok(RequestOutcome::AwaitingConfirmation { summary, affected })
    }

    /// Apply the pending action atomically and notify success.
    ///
    /// # Errors
    ///
    /// `NothingPending` when no action is awaiting confirmation.
    pub async fn confirm(&mut self, state: &SessionState) -> Result<usize, BulkError> {
        let Some(pending) = self.pending.take() else {
            return Err(BulkError::NothingPending);
        };

        let affected = apply(state, pending.action, &pending.target_ids).await;
        let message = format!(
            "{} {} {}",
            capitalize(pending.action.verb_past()),
            affected,
            pending.action.noun(affected)
        );
        state.notices.publish(&Notice::success(message));

        Ok(affected)
    }

    /// Drop the pending action without mutating anything.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            info!("bulk action cancelled");
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn apply(state: &SessionState, action: BulkAction, target_ids: &[Uuid]) -> usize {
    match action {
        BulkAction::SetTemplateStatus(status) => ledger::set_status(state, target_ids, status).await,
        BulkAction::DeleteTemplates => ledger::remove(state, target_ids).await,
        BulkAction::SetPublishStatus(status) => records::set_publish_status(state, target_ids, status).await,
        BulkAction::DeleteGenerations => records::remove(state, target_ids).await,
    }
}

fn capitalize(verb: &str) -> String {
    let mut chars = verb.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "bulk_test.rs"]
mod tests;
