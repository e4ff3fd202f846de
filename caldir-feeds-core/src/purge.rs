//! Bulk removal of everything the mirror has written.
//!
//! Matching here is looser than in reconciliation: besides provenance tags
//! it accepts descriptions with old-style metadata lines and titles starting
//! with a configured prefix. It is only run on explicit request.

use std::fmt;

use crate::config::FeedConfig;
use crate::date_range::DateRange;
use crate::error::{FeedsError, FeedsResult};
use crate::provenance::{has_legacy_metadata, has_marker};
use crate::state::SyncStateStore;
use crate::store::{CalendarStore, DestinationEvent};

/// Why an event was selected for purging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeReason {
    /// Structured provenance properties.
    Tagged(String),
    /// Description trailer marker.
    Marker,
    /// uid/start/end lines without a marker.
    LegacyMetadata,
    /// Title starts with this feed's prefix.
    Prefix(String),
}

impl fmt::Display for PurgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgeReason::Tagged(feed) => write!(f, "tagged for feed '{}'", feed),
            PurgeReason::Marker => write!(f, "provenance marker"),
            PurgeReason::LegacyMetadata => write!(f, "legacy metadata"),
            PurgeReason::Prefix(feed) => write!(f, "title prefix of feed '{}'", feed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PurgeTarget {
    pub event: DestinationEvent,
    pub reason: PurgeReason,
}

#[derive(Debug, Default)]
pub struct PurgeReport {
    pub deleted: Vec<PurgeTarget>,
    pub failed: Vec<(PurgeTarget, FeedsError)>,
    pub cleared_feeds: Vec<String>,
}

/// Decide whether `event` looks like something the mirror created.
///
/// Empty prefixes never match; they would select every event.
pub fn purge_reason(event: &DestinationEvent, feeds: &[FeedConfig]) -> Option<PurgeReason> {
    if let Some(ref provenance) = event.provenance {
        return Some(PurgeReason::Tagged(provenance.feed.clone()));
    }

    if let Some(ref description) = event.description {
        if has_marker(description) {
            return Some(PurgeReason::Marker);
        }
        if has_legacy_metadata(description) {
            return Some(PurgeReason::LegacyMetadata);
        }
    }

    feeds
        .iter()
        .find(|feed| !feed.prefix.is_empty() && event.title.starts_with(&feed.prefix))
        .map(|feed| PurgeReason::Prefix(feed.name.clone()))
}

/// Every destination event `purge` would delete.
pub fn find_targets<C>(store: &C, feeds: &[FeedConfig]) -> FeedsResult<Vec<PurgeTarget>>
where
    C: CalendarStore + ?Sized,
{
    Ok(store
        .list_events(&DateRange::unbounded())?
        .into_iter()
        .filter_map(|event| {
            purge_reason(&event, feeds).map(|reason| PurgeTarget { event, reason })
        })
        .collect())
}

/// Delete every matching destination event, then clear the stored state of
/// every configured feed.
///
/// Individual delete failures are collected; state is cleared regardless.
pub fn purge<C, S>(store: &C, state: &S, feeds: &[FeedConfig]) -> FeedsResult<PurgeReport>
where
    C: CalendarStore + ?Sized,
    S: SyncStateStore + ?Sized,
{
    let mut report = PurgeReport::default();

    for target in find_targets(store, feeds)? {
        match store.delete_event(&target.event.id) {
            Ok(()) => {
                tracing::debug!(id = %target.event.id, reason = %target.reason, "purged event");
                report.deleted.push(target);
            }
            Err(error) => {
                tracing::warn!(id = %target.event.id, %error, "could not purge event");
                report.failed.push((target, error));
            }
        }
    }

    for feed in feeds {
        state.clear(&feed.name)?;
        report.cleared_feeds.push(feed.name.clone());
    }

    tracing::info!(
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "purge finished"
    );

    Ok(report)
}
