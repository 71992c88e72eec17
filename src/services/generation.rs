//! Consumer generation flow — staged creation backed by real async jobs.
//!
//! DESIGN
//! ======
//! The flow walks `Idle → AwaitingSubjectImage → AwaitingCrop →
//! Submitted(Processing)`. Submit inserts a `Processing` record at the head
//! of the generation log and spawns one completion task per job: a sleep for
//! the configured delay raced via `tokio::select!` against the job's
//! cancellation signal. The record, not the flow, carries the terminal
//! state, so records outlive the view that created them.
//!
//! ERROR HANDLING
//! ==============
//! The daily usage gate is checked on entry to the flow; usage is recorded
//! exactly once, at submit. Cancellation (explicit, or the flow being
//! dropped) marks the record `Failed` and suppresses the completion notice:
//! a completion callback never fires into a view that is gone.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::notice::{Notice, NoticeCode};
use crate::state::{GenerationRecord, ProcessingStatus, PublishStatus, SessionState, Template, now_ms};
use crate::usage::UsageError;

const DEFAULT_COMPLETE_DELAY_MS: u64 = 3000;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    UsageLimited(#[from] UsageError),
    #[error("flow is not at the {expected} step")]
    WrongStage { expected: &'static str },
    #[error("unknown generation job: {0}")]
    UnknownJob(Uuid),
}

impl NoticeCode for FlowError {
    fn notice_code(&self) -> &'static str {
        match self {
            Self::UsageLimited(e) => e.notice_code(),
            Self::WrongStage { .. } => "E_WRONG_STAGE",
            Self::UnknownJob(_) => "E_UNKNOWN_JOB",
        }
    }

    fn blocking(&self) -> bool {
        matches!(self, Self::UsageLimited(_))
    }
}

/// Position in the creation flow. Submission returns the flow to `Idle`;
/// job progress lives on the generation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    AwaitingSubjectImage { template_id: Uuid, template_name: String },
    AwaitingCrop { template_id: Uuid, template_name: String, image_url: String },
}

impl FlowStage {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FlowStage::Idle => "idle",
            FlowStage::AwaitingSubjectImage { .. } => "subject image",
            FlowStage::AwaitingCrop { .. } => "crop",
        }
    }
}

/// One outstanding completion task.
struct Job {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

// =============================================================================
// FLOW
// =============================================================================

/// Per-consumer creation flow. Owns the cancellation signal for every job it
/// submitted; dropping the flow cancels what is still outstanding.
pub struct GenerationFlow {
    state: SessionState,
    user_id: Uuid,
    user_name: String,
    stage: FlowStage,
    jobs: HashMap<Uuid, Job>,
    complete_delay: Duration,
}

impl GenerationFlow {
    #[must_use]
    pub fn new(state: SessionState, user_id: Uuid, user_name: impl Into<String>) -> Self {
        let delay_ms = env_parse("GENERATION_COMPLETE_DELAY_MS", DEFAULT_COMPLETE_DELAY_MS);
        Self {
            state,
            user_id,
            user_name: user_name.into(),
            stage: FlowStage::Idle,
            jobs: HashMap::new(),
            complete_delay: Duration::from_millis(delay_ms),
        }
    }

    /// Override the completion delay (for tests).
    #[must_use]
    pub fn with_complete_delay(mut self, delay: Duration) -> Self {
        self.complete_delay = delay;
        self
    }

    #[must_use]
    pub fn stage(&self) -> &FlowStage {
        &self.stage
    }

    /// Generations the user has left today.
    #[must_use]
    pub fn remaining_uses(&self) -> usize {
        self.state.usage.remaining(self.user_id)
    }

    /// Enter the flow for a template. Gated on the daily usage limit; the
    /// counter itself is not touched until submit.
    ///
    /// # Errors
    ///
    /// `UsageLimited` at the daily cap, `WrongStage` if a creation is
    /// already underway.
    pub fn begin(&mut self, template: &Template) -> Result<(), FlowError> {
        if self.stage != FlowStage::Idle {
            return Err(FlowError::WrongStage { expected: "idle" });
        }
        self.state.usage.check(self.user_id)?;

        info!(template_id = %template.id, user_id = %self.user_id, "generation flow started");
        self.stage = FlowStage::AwaitingSubjectImage { template_id: template.id, template_name: template.name.clone() };
        Ok(())
    }

    /// Provide the subject image and move on to cropping.
    ///
    /// # Errors
    ///
    /// `WrongStage` unless the flow awaits a subject image.
    pub fn pick_image(&mut self, image_url: impl Into<String>) -> Result<(), FlowError> {
        match std::mem::replace(&mut self.stage, FlowStage::Idle) {
            FlowStage::AwaitingSubjectImage { template_id, template_name } => {
                self.stage = FlowStage::AwaitingCrop { template_id, template_name, image_url: image_url.into() };
                Ok(())
            }
            other => {
                self.stage = other;
                Err(FlowError::WrongStage { expected: "subject image" })
            }
        }
    }

    /// Step back one stage. No-op at `Idle`.
    pub fn back(&mut self) {
        self.stage = match std::mem::replace(&mut self.stage, FlowStage::Idle) {
            FlowStage::AwaitingCrop { template_id, template_name, .. } => {
                FlowStage::AwaitingSubjectImage { template_id, template_name }
            }
            FlowStage::AwaitingSubjectImage { .. } | FlowStage::Idle => FlowStage::Idle,
        };
    }

    /// Submit the creation: records usage, inserts a `Processing` record at
    /// the head of the log, and spawns its completion task. Returns the
    /// record id, which doubles as the job id.
    ///
    /// # Errors
    ///
    /// `WrongStage` unless the flow is at the crop step.
    pub async fn submit(&mut self) -> Result<Uuid, FlowError> {
        let (template_id, template_name, image_url) = match std::mem::replace(&mut self.stage, FlowStage::Idle) {
            FlowStage::AwaitingCrop { template_id, template_name, image_url } => {
                (template_id, template_name, image_url)
            }
            other => {
                self.stage = other;
                return Err(FlowError::WrongStage { expected: "crop" });
            }
        };

        // The one and only increment for this creation.
        self.state.usage.record(self.user_id);

        let record = GenerationRecord {
            id: Uuid::new_v4(),
            template_id,
            template_name,
            user_name: self.user_name.clone(),
            thumbnail_url: image_url,
            status: ProcessingStatus::Processing,
            publish_status: Some(PublishStatus::Online),
            created_at_ms: now_ms(),
            video_no: None,
            user_mobile: None,
            share_count: 0,
        };
        let record_id = record.id;

        {
            let mut log = self.state.generations.write().await;
            log.insert(0, record);
        }
        info!(%record_id, user_id = %self.user_id, "generation submitted");
        self.state
            .notices
            .publish(&Notice::info("Generation started — check back in a moment").with_record(record_id));

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let task_state = self.state.clone();
        let delay = self.complete_delay;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if finish_record(&task_state, record_id, ProcessingStatus::Completed).await {
                        info!(%record_id, "generation completed");
                        task_state
                            .notices
                            .publish(&Notice::success("Generation finished! Tap to view").with_record(record_id));
                    }
                }
                _ = cancel_rx.changed() => {
                    if finish_record(&task_state, record_id, ProcessingStatus::Failed).await {
                        info!(%record_id, "generation cancelled");
                    }
                }
            }
        });
        self.jobs.insert(record_id, Job { cancel_tx, handle });

        Ok(record_id)
    }

    /// Cancel an outstanding job. The record transitions to `Failed` and no
    /// completion notice is raised.
    ///
    /// # Errors
    ///
    /// `UnknownJob` if the job was never submitted by this flow or was
    /// already reaped.
    pub async fn cancel(&mut self, job_id: Uuid) -> Result<(), FlowError> {
        let job = self.jobs.remove(&job_id).ok_or(FlowError::UnknownJob(job_id))?;
        let _ = job.cancel_tx.send(true);
        // Wait for the task to observe the signal so the record's terminal
        // state is settled when we return.
        let _ = job.handle.await;
        Ok(())
    }

    /// Jobs submitted by this flow that have not reached a terminal state.
    #[must_use]
    pub fn pending_jobs(&self) -> usize {
        self.jobs.values().filter(|j| !j.handle.is_finished()).count()
    }
}

impl Drop for GenerationFlow {
    fn drop(&mut self) {
        for (record_id, job) in self.jobs.drain() {
            if !job.handle.is_finished() {
                warn!(%record_id, "generation flow dropped with job outstanding; cancelling");
                let _ = job.cancel_tx.send(true);
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Move a record from `Processing` to the given terminal status. Returns
/// false if the record is gone or already terminal, so each job settles at
/// most once.
async fn finish_record(state: &SessionState, record_id: Uuid, terminal: ProcessingStatus) -> bool {
    let mut log = state.generations.write().await;
    let Some(record) = log.iter_mut().find(|r| r.id == record_id) else {
        return false;
    };
    if record.status != ProcessingStatus::Processing {
        return false;
    }
    record.status = terminal;
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;
