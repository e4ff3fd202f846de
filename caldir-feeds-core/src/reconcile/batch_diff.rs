//! Aggregation over several feeds.

use crate::reconcile::{DiffKind, EventDiff, FeedDiff, FeedReport};

pub struct BatchDiff(pub Vec<FeedDiff>);

impl BatchDiff {
    fn count_by_kind<'a>(diffs: impl Iterator<Item = &'a EventDiff>) -> (usize, usize) {
        let mut created = 0;
        let mut deleted = 0;

        for diff in diffs {
            match diff.kind {
                DiffKind::Create => created += 1,
                DiffKind::Delete => deleted += 1,
            }
        }

        (created, deleted)
    }

    /// (created, deleted) over all feeds.
    pub fn counts(&self) -> (usize, usize) {
        Self::count_by_kind(self.0.iter().flat_map(|d| &d.changes))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(FeedDiff::is_empty)
    }

    /// (created, deleted, failed) over applied reports.
    pub fn report_counts(reports: &[FeedReport]) -> (usize, usize, usize) {
        reports.iter().fold((0, 0, 0), |(c, d, f), r| {
            (c + r.created.len(), d + r.deleted.len(), f + r.failed.len())
        })
    }
}
