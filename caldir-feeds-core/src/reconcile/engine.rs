//! The per-feed sync cycle: read state, fetch, diff, mutate, write state.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::candidate::ParsedFeed;
use crate::config::FeedConfig;
use crate::date_range::DateRange;
use crate::datetime::start_of_today;
use crate::error::{FeedsError, FeedsResult};
use crate::fetch::FeedFetcher;
use crate::reconcile::{FeedDiff, FeedReport};
use crate::state::SyncStateStore;
use crate::store::CalendarStore;

/// Runs sync passes against one destination calendar.
///
/// Feeds are processed one at a time; nothing here spawns, so two feeds never
/// interleave their scan-and-delete against the store.
pub struct Reconciler<'a, F, C, S> {
    fetcher: &'a F,
    store: &'a C,
    state: &'a S,
    zone: Tz,
}

impl<'a, F, C, S> Reconciler<'a, F, C, S>
where
    F: FeedFetcher,
    C: CalendarStore,
    S: SyncStateStore,
{
    pub fn new(fetcher: &'a F, store: &'a C, state: &'a S, zone: Tz) -> Self {
        Reconciler {
            fetcher,
            store,
            state,
            zone,
        }
    }

    /// Destination events from the start of `now`'s civil day onwards.
    ///
    /// Open-ended, since any future candidate may be created and must be
    /// found again for deletion and adoption.
    pub fn scan_window(&self, now: DateTime<Utc>) -> DateRange {
        DateRange::starting(start_of_today(self.zone, now))
    }

    /// Compute what a pass would do without touching store or state.
    ///
    /// A non-success fetch is `FetchFailure`.
    pub async fn plan(&self, feed: &FeedConfig, now: DateTime<Utc>) -> FeedsResult<FeedDiff> {
        let response = self.fetcher.fetch(&feed.url).await?;
        if !response.is_success() {
            tracing::warn!(feed = %feed.name, status = response.status, "feed fetch failed");
            return Err(FeedsError::FetchFailure {
                status: response.status,
            });
        }

        let today_start = start_of_today(self.zone, now);
        let parsed = ParsedFeed::parse(&response.body, self.zone, today_start);
        tracing::debug!(
            feed = %feed.name,
            candidates = parsed.candidates.len(),
            skipped = parsed.skipped.len(),
            not_single = parsed.not_single,
            past = parsed.past,
            "parsed feed"
        );

        let previous = self.state.load(&feed.name)?;
        let destination: Vec<_> = self
            .store
            .list_events(&self.scan_window(now))?
            .into_iter()
            .filter(|event| event.belongs_to(&feed.name))
            .collect();

        Ok(FeedDiff::compute(feed, &previous, parsed, &destination))
    }

    /// Run one full pass for `feed`. On `FetchFailure` the stored state is
    /// left as it was.
    pub async fn sync(&self, feed: &FeedConfig, now: DateTime<Utc>) -> FeedsResult<FeedReport> {
        let diff = self.plan(feed, now).await?;
        diff.apply(self.store, self.state)
    }
}
