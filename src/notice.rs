//! Notices — transient, dismissible user-facing messages.
//!
//! DESIGN
//! ======
//! Every user-visible outcome in the session (quota refusal, bulk success,
//! generation completion) is a `Notice`. Views subscribe to the `NoticeHub`
//! with a bounded channel; publication is best-effort `try_send`, so a view
//! that navigated away simply misses the notice instead of holding up the
//! mutation that produced it.
//!
//! Errors surface through the `NoticeCode` trait: a grepable code plus a
//! blocking flag (blocking notices render as a modal, the rest as toasts).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::state::now_ms;

/// Default per-subscriber channel capacity.
const NOTICE_CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// NOTICE CODES
// =============================================================================

/// Grepable code and blocking flag for errors surfaced as notices.
pub trait NoticeCode: std::fmt::Display {
    fn notice_code(&self) -> &'static str;

    /// Blocking notices render as a modal instead of a toast.
    fn blocking(&self) -> bool {
        false
    }
}

// =============================================================================
// NOTICE
// =============================================================================

/// Tone of a notice. Drives presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A single transient message to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub message: String,
    /// Grepable code when this notice carries an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Record a clickable notice navigates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    pub blocking: bool,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message.into())
    }

    /// Build an error notice from a typed error, carrying its code and
    /// blocking flag.
    pub fn error_from(err: &(impl NoticeCode + ?Sized)) -> Self {
        let mut notice = Self::new(NoticeKind::Error, err.to_string());
        notice.code = Some(err.notice_code().to_string());
        notice.blocking = err.blocking();
        notice
    }

    /// Attach the record this notice navigates to when clicked.
    #[must_use]
    pub fn with_record(mut self, record_id: Uuid) -> Self {
        self.record_id = Some(record_id);
        self
    }

    fn new(kind: NoticeKind, message: String) -> Self {
        Self { id: Uuid::new_v4(), kind, message, code: None, record_id: None, blocking: false, ts: now_ms() }
    }
}

// =============================================================================
// NOTICE HUB
// =============================================================================

/// Fan-out point for notices. Subscribers are keyed so a departing view can
/// unsubscribe; closed subscribers are pruned on publish.
#[derive(Clone)]
pub struct NoticeHub {
    subscribers: Arc<Mutex<HashMap<Uuid, mpsc::Sender<Notice>>>>,
}

impl NoticeHub {
    #[must_use]
    pub fn new() -> Self {
        Self { subscribers: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Register a subscriber. Returns its key and the receiving end.
    #[must_use]
    pub fn subscribe(&self) -> (Uuid, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(NOTICE_CHANNEL_CAPACITY);
        let key = Uuid::new_v4();
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.insert(key, tx);
        (key, rx)
    }

    /// Remove a subscriber. Safe to call for an unknown key.
    pub fn unsubscribe(&self, key: Uuid) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.remove(&key);
    }

    /// Best-effort delivery to every live subscriber. A full channel drops
    /// the notice for that subscriber; a closed channel removes it.
    pub fn publish(&self, notice: &Notice) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut closed = Vec::new();

        for (key, tx) in subscribers.iter() {
            match tx.try_send(notice.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(notice_id = %notice.id, subscriber = %key, "notice channel full; dropping notice");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed.push(*key);
                }
            }
        }

        for key in closed {
            subscribers.remove(&key);
        }
    }
}

impl Default for NoticeHub {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
