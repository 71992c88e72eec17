//! SwapStudio — session-state core for a short-video template-swap app.
//!
//! This crate owns the in-memory session a studio UI renders from: a
//! quota-bounded template catalog, a generation log fed by async jobs, a
//! reusable bulk-selection abstraction, and a confirmation-gated bulk action
//! coordinator. It deliberately has no network or persistence layer; views
//! hold a [`state::SessionState`] and subscribe to the notice hub.

pub mod naming;
pub mod notice;
pub mod panel;
pub mod selection;
pub mod services;
pub mod state;
pub mod usage;

pub use notice::{Notice, NoticeHub, NoticeKind};
pub use selection::{Selection, SelectionFlags};
pub use state::{
    GenerationRecord, LifecycleStatus, ProcessingStatus, PublishStatus, SessionState, StatusFilter, Template,
};
