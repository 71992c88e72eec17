//! Admin panel — selection scoping and confirmation plumbing.
//!
//! DESIGN
//! ======
//! The panel is the management-session boundary the selections are scoped
//! to: switching tabs or toggling manage mode clears them, completing a bulk
//! action clears the acted-on selection, and a refused action leaves the
//! selection untouched so the operator can fix it up. Business rules stay in
//! the bulk coordinator; the panel only wires selections, tabs, and the
//! upload gate together.

use uuid::Uuid;

use crate::selection::{Selection, SelectionFlags};
use crate::services::bulk::{BulkAction, BulkCoordinator, BulkError, RequestOutcome, Tier};
use crate::services::ledger::{self, LedgerError, TemplateUpload};
use crate::state::{LifecycleStatus, PublishStatus, SessionState, StatusFilter, Template};
use crate::notice::Notice;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTab {
    Templates,
    Generations,
}

impl BulkAction {
    fn tab(self) -> AdminTab {
        match self {
            BulkAction::SetTemplateStatus(_) | BulkAction::DeleteTemplates => AdminTab::Templates,
            BulkAction::SetPublishStatus(_) | BulkAction::DeleteGenerations => AdminTab::Generations,
        }
    }
}

// =============================================================================
// PANEL
// =============================================================================

pub struct AdminPanel {
    state: SessionState,
    coordinator: BulkCoordinator,
    active_tab: AdminTab,
    template_manage: bool,
    generation_manage: bool,
    template_selection: Selection<Uuid>,
    generation_selection: Selection<Uuid>,
    generation_filter: StatusFilter,
}

impl AdminPanel {
    #[must_use]
    pub fn new(state: SessionState) -> Self {
        Self {
            state,
            coordinator: BulkCoordinator::new(),
            active_tab: AdminTab::Templates,
            template_manage: false,
            generation_manage: false,
            template_selection: Selection::new(),
            generation_selection: Selection::new(),
            generation_filter: StatusFilter::All,
        }
    }

    #[must_use]
    pub fn active_tab(&self) -> AdminTab {
        self.active_tab
    }

    #[must_use]
    pub fn is_managing(&self) -> bool {
        match self.active_tab {
            AdminTab::Templates => self.template_manage,
            AdminTab::Generations => self.generation_manage,
        }
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection(self.active_tab).len()
    }

    #[must_use]
    pub fn generation_filter(&self) -> StatusFilter {
        self.generation_filter
    }

    #[must_use]
    pub fn pending_summary(&self) -> Option<&str> {
        self.coordinator.pending().map(|p| p.summary.as_str())
    }

    // -------------------------------------------------------------------------
    // Tab and mode scoping
    // -------------------------------------------------------------------------

    /// Switch tabs. Both manage modes end and both selections clear.
    pub fn switch_tab(&mut self, tab: AdminTab) {
        self.active_tab = tab;
        self.template_manage = false;
        self.generation_manage = false;
        self.template_selection.clear();
        self.generation_selection.clear();
    }

    /// Toggle manage mode on the active tab. The tab's selection clears on
    /// every toggle, entering or exiting.
    pub fn toggle_manage_mode(&mut self) {
        match self.active_tab {
            AdminTab::Templates => {
                self.template_manage = !self.template_manage;
                self.template_selection.clear();
            }
            AdminTab::Generations => {
                self.generation_manage = !self.generation_manage;
                self.generation_selection.clear();
            }
        }
    }

    /// Change the generation list filter. The visible list changes; the
    /// selection is deliberately kept.
    pub fn set_generation_filter(&mut self, filter: StatusFilter) {
        self.generation_filter = filter;
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Toggle one id on the active tab's selection. Ignored outside manage
    /// mode.
    pub fn toggle_select(&mut self, id: Uuid) {
        if !self.is_managing() {
            return;
        }
        self.selection_mut(self.active_tab).toggle(id);
    }

    /// Select-all over the active tab's visible list: every template, or the
    /// generation records matching the current filter.
    pub async fn select_all(&mut self) {
        if !self.is_managing() {
            return;
        }
        let visible: Vec<Uuid> = match self.active_tab {
            AdminTab::Templates => {
                let catalog = self.state.templates.read().await;
                catalog.iter().map(|t| t.id).collect()
            }
            AdminTab::Generations => {
                let filter = self.generation_filter;
                let log = self.state.generations.read().await;
                log.iter().filter(|r| filter.matches(r.status)).map(|r| r.id).collect()
            }
        };
        self.selection_mut(self.active_tab).select_all_visible(&visible);
    }

    /// Derived flags for the active tab's selection.
    pub async fn selection_flags(&self) -> SelectionFlags {
        match self.active_tab {
            AdminTab::Templates => {
                let catalog = self.state.templates.read().await;
                self.template_selection.flags(
                    catalog.iter(),
                    |t| t.id,
                    |t| t.status == LifecycleStatus::Online,
                    |t| t.status == LifecycleStatus::Offline,
                )
            }
            AdminTab::Generations => {
                let log = self.state.generations.read().await;
                self.generation_selection.flags(
                    log.iter(),
                    |r| r.id,
                    |r| r.publish_status == Some(PublishStatus::Online),
                    |r| r.publish_status == Some(PublishStatus::Offline),
                )
            }
        }
    }

    // -------------------------------------------------------------------------
    // Bulk actions
    // -------------------------------------------------------------------------

    /// Run a bulk action against the selection that owns its entity type.
    /// A refused action leaves the selection unchanged.
    ///
    /// # Errors
    ///
    /// Forwards `ActionRefused` from the coordinator.
    pub async fn request_bulk(&mut self, action: BulkAction) -> Result<RequestOutcome, BulkError> {
        let selected = self.selection(action.tab()).ids();
        self.coordinator.request(&self.state, action, &selected, Tier::Admin).await
    }

    /// Confirm the pending action; on success the acted-on selection clears
    /// and its manage session ends.
    ///
    /// # Errors
    ///
    /// `NothingPending` if no action awaits confirmation.
    pub async fn confirm_pending(&mut self) -> Result<usize, BulkError> {
        let action = self.coordinator.pending().map(|p| p.action);
        let affected = self.coordinator.confirm(&self.state).await?;

        match action.map(BulkAction::tab) {
            Some(AdminTab::Templates) => {
                self.template_selection.clear();
                self.template_manage = false;
            }
            Some(AdminTab::Generations) => {
                self.generation_selection.clear();
                self.generation_manage = false;
            }
            None => {}
        }
        Ok(affected)
    }

    /// Dismiss the confirmation dialog. The selection survives.
    pub fn cancel_pending(&mut self) {
        self.coordinator.cancel();
    }

    // -------------------------------------------------------------------------
    // Upload
    // -------------------------------------------------------------------------

    /// Gate for the upload button. Publishes the blocking quota notice on
    /// refusal.
    ///
    /// # Errors
    ///
    /// `QuotaExceeded` naming the full ceiling.
    pub async fn request_upload(&self) -> Result<(), LedgerError> {
        if let Err(e) = ledger::check_capacity(&self.state).await {
            self.state.notices.publish(&Notice::error_from(&e));
            return Err(e);
        }
        Ok(())
    }

    /// Admit an upload from the dialog. Publishes the error notice on
    /// refusal.
    ///
    /// # Errors
    ///
    /// Forwards ledger admission errors.
    pub async fn admit_upload(&self, upload: TemplateUpload) -> Result<Template, LedgerError> {
        match ledger::admit(&self.state, upload).await {
            Ok(template) => Ok(template),
            Err(e) => {
                self.state.notices.publish(&Notice::error_from(&e));
                Err(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn selection(&self, tab: AdminTab) -> &Selection<Uuid> {
        match tab {
            AdminTab::Templates => &self.template_selection,
            AdminTab::Generations => &self.generation_selection,
        }
    }

    fn selection_mut(&mut self, tab: AdminTab) -> &mut Selection<Uuid> {
        match tab {
            AdminTab::Templates => &mut self.template_selection,
            AdminTab::Generations => &mut self.generation_selection,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "panel_test.rs"]
mod tests;
