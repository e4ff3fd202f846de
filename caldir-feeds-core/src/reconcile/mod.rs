//! Reconciliation of feed events against persisted sync state.
//!
//! One pass per feed: fetch, classify, diff keys against the previous state,
//! create/delete destination events, then replace the stored key set with
//! the keys observed in this pass.

mod batch_diff;
mod diff_kind;
mod engine;
mod event_diff;
mod feed_diff;

pub use batch_diff::BatchDiff;
pub use diff_kind::DiffKind;
pub use engine::Reconciler;
pub use event_diff::EventDiff;
pub use feed_diff::{FailedChange, FeedDiff, FeedReport};
