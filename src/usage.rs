//! Per-user daily generation limits.
//!
//! DESIGN
//! ======
//! Rolling-window counters backed by `HashMap<Uuid, VecDeque<Instant>>`.
//! One limit enforced: 10 generations per user per day by default. The gate
//! is checked when a user enters the creation flow; usage is recorded exactly
//! once, at submit, and never decremented.
//!
//! TRADE-OFFS
//! ==========
//! A rolling 24h window rather than a calendar-day reset: the prototype's
//! "come back tomorrow" copy maps to "oldest submission ages out of the
//! window", which avoids timezone bookkeeping entirely.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::notice::NoticeCode;

const DEFAULT_DAILY_LIMIT: usize = 10;
const DEFAULT_WINDOW_SECS: u64 = 86_400;

#[derive(Clone, Copy)]
struct UsageConfig {
    limit: usize,
    window: Duration,
}

impl UsageConfig {
    fn from_env() -> Self {
        let window_secs = env_parse("USAGE_WINDOW_SECS", DEFAULT_WINDOW_SECS);
        Self {
            limit: env_parse("DAILY_GENERATION_LIMIT", DEFAULT_DAILY_LIMIT),
            window: Duration::from_secs(window_secs),
        }
    }
}

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
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("daily generation limit reached (max {limit}/{window_secs}s)")]
    LimitReached { limit: usize, window_secs: u64 },
}

impl NoticeCode for UsageError {
    fn notice_code(&self) -> &'static str {
        match self {
            Self::LimitReached { .. } => "E_USAGE_LIMIT",
        }
    }

    fn blocking(&self) -> bool {
        true
    }
}

// =============================================================================
// USAGE METER
// =============================================================================

#[derive(Clone)]
pub struct UsageMeter {
    inner: Arc<Mutex<HashMap<Uuid, VecDeque<Instant>>>>,
    config: UsageConfig,
}

impl UsageMeter {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), config: UsageConfig::from_env() }
    }

    /// Gate for entering the creation flow: usage must be strictly below the
    /// limit.
    ///
    /// # Errors
    ///
    /// Returns `LimitReached` when the user has no submissions left in the
    /// current window.
    pub fn check(&self, user_id: Uuid) -> Result<(), UsageError> {
        self.check_at(user_id, Instant::now())
    }

    /// Internal: check with explicit timestamp (for testing).
    fn check_at(&self, user_id: Uuid, now: Instant) -> Result<(), UsageError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;

        let deque = inner.entry(user_id).or_default();
        prune_window(deque, now, cfg.window);
        if deque.len() >= cfg.limit {
            return Err(UsageError::LimitReached { limit: cfg.limit, window_secs: cfg.window.as_secs() });
        }
        Ok(())
    }

    /// Record one submission. Called exactly once per submit; never undone.
    pub fn record(&self, user_id: Uuid) {
        self.record_at(user_id, Instant::now());
    }

    fn record_at(&self, user_id: Uuid, now: Instant) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let window = self.config.window;

        let deque = inner.entry(user_id).or_default();
        prune_window(deque, now, window);
        deque.push_back(now);
    }

    /// Submissions counted against the user in the current window.
    #[must_use]
    pub fn used(&self, user_id: Uuid) -> usize {
        self.used_at(user_id, Instant::now())
    }

    fn used_at(&self, user_id: Uuid, now: Instant) -> usize {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let window = self.config.window;

        let deque = inner.entry(user_id).or_default();
        prune_window(deque, now, window);
        deque.len()
    }

    /// Submissions the user has left in the current window.
    #[must_use]
    pub fn remaining(&self, user_id: Uuid) -> usize {
        self.config.limit.saturating_sub(self.used(user_id))
    }

    /// The configured limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.config.limit
    }
}

impl Default for UsageMeter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "usage_test.rs"]
mod tests;
