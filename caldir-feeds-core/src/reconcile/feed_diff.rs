//! Per-feed diff computation and application.

use std::collections::HashMap;

use crate::candidate::{EventKey, ParsedFeed, SkippedRecord};
use crate::config::FeedConfig;
use crate::error::{FeedsError, FeedsResult};
use crate::reconcile::{DiffKind, EventDiff};
use crate::state::{KeySet, SyncStateStore};
use crate::store::{CalendarStore, DestinationEvent};

/// Everything one pass over a feed would do.
#[derive(Debug)]
pub struct FeedDiff {
    pub feed: String,
    /// Creates and deletes, in start order.
    pub changes: Vec<EventDiff>,
    /// Every key seen this pass. Becomes the new state once applied.
    pub observed: KeySet,
    /// Candidates whose key was already in the previous state.
    pub retained: usize,
    /// New keys that already have a tagged destination event (state was lost
    /// or stale); they go into state without creating anything.
    pub adopted: Vec<EventKey>,
    /// Removed keys with no destination event left in the scan window.
    pub vanished: Vec<EventKey>,
    pub duplicates: usize,
    pub skipped: Vec<SkippedRecord>,
    pub not_single: usize,
    pub past: usize,
}

/// A create or delete the store refused.
#[derive(Debug)]
pub struct FailedChange {
    pub diff: EventDiff,
    pub error: FeedsError,
}

/// Outcome of an applied `FeedDiff`.
#[derive(Debug)]
pub struct FeedReport {
    pub feed: String,
    pub created: Vec<EventDiff>,
    pub deleted: Vec<EventDiff>,
    pub failed: Vec<FailedChange>,
    pub retained: usize,
    pub adopted: usize,
    pub skipped: usize,
    /// Size of the stored key set.
    pub state_size: usize,
}

impl FeedReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl FeedDiff {
    /// Diff this pass's candidates against the previous key set.
    ///
    /// `destination` is the scan of existing destination events; only those
    /// tagged with this feed's name are considered.
    pub fn compute(
        feed: &FeedConfig,
        previous: &KeySet,
        parsed: ParsedFeed,
        destination: &[DestinationEvent],
    ) -> Self {
        let mut tagged: HashMap<&EventKey, Vec<&DestinationEvent>> = HashMap::new();
        for event in destination {
            if let Some(provenance) = event.provenance.as_ref().filter(|p| p.feed == feed.name) {
                tagged.entry(&provenance.key).or_default().push(event);
            }
        }

        let mut observed = KeySet::new();
        let mut changes = Vec::new();
        let mut retained = 0;
        let mut adopted = Vec::new();
        let mut duplicates = 0;

        for candidate in &parsed.candidates {
            let key = candidate.key();
            if !observed.insert(key.clone()) {
                tracing::debug!(feed = %feed.name, %key, "duplicate event in feed");
                duplicates += 1;
                continue;
            }

            if previous.contains(&key) {
                retained += 1;
            } else if tagged.contains_key(&key) {
                tracing::info!(feed = %feed.name, %key, "adopting existing destination event");
                adopted.push(key);
            } else {
                changes.push(EventDiff::create(feed, candidate));
            }
        }

        let mut vanished = Vec::new();
        for key in previous.difference(&observed) {
            match tagged.get(key) {
                Some(events) => {
                    for event in events {
                        changes.push(EventDiff::delete(key.clone(), (*event).clone()));
                    }
                }
                None => {
                    tracing::debug!(feed = %feed.name, %key, "removed event not in scan window");
                    vanished.push(key.clone());
                }
            }
        }

        changes.sort_by(|a, b| a.start().cmp(&b.start()).then_with(|| a.key.cmp(&b.key)));

        FeedDiff {
            feed: feed.name.clone(),
            changes,
            observed,
            retained,
            adopted,
            vanished,
            duplicates,
            skipped: parsed.skipped,
            not_single: parsed.not_single,
            past: parsed.past,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn creates(&self) -> impl Iterator<Item = &EventDiff> {
        self.changes.iter().filter(|d| d.kind == DiffKind::Create)
    }

    pub fn deletes(&self) -> impl Iterator<Item = &EventDiff> {
        self.changes.iter().filter(|d| d.kind == DiffKind::Delete)
    }

    /// Run the planned mutations and replace the feed's stored key set.
    ///
    /// A failed create leaves its key out of the new state and a failed
    /// delete keeps its key, so both are retried on the next pass.
    pub fn apply<C, S>(self, store: &C, state: &S) -> FeedsResult<FeedReport>
    where
        C: CalendarStore + ?Sized,
        S: SyncStateStore + ?Sized,
    {
        let mut next_state = self.observed;
        let mut created = Vec::new();
        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for diff in self.changes {
            let result = match diff.kind {
                DiffKind::Create => match diff.new {
                    Some(ref event) => store.create_event(event).map(|id| {
                        tracing::debug!(feed = %self.feed, key = %diff.key, %id, "created event");
                    }),
                    None => Err(FeedsError::Store("create without an event".into())),
                },
                DiffKind::Delete => match diff.old {
                    Some(ref event) => store.delete_event(&event.id).map(|()| {
                        tracing::debug!(feed = %self.feed, key = %diff.key, id = %event.id, "deleted event");
                    }),
                    None => Err(FeedsError::Store("delete without an event".into())),
                },
            };

            match (result, diff.kind) {
                (Ok(()), DiffKind::Create) => created.push(diff),
                (Ok(()), DiffKind::Delete) => deleted.push(diff),
                (Err(error), kind) => {
                    tracing::warn!(feed = %self.feed, key = %diff.key, %error, "{} failed", kind);
                    match kind {
                        DiffKind::Create => next_state.remove(&diff.key),
                        DiffKind::Delete => next_state.insert(diff.key.clone()),
                    };
                    failed.push(FailedChange { diff, error });
                }
            }
        }

        state.store(&self.feed, &next_state)?;

        tracing::info!(
            feed = %self.feed,
            created = created.len(),
            deleted = deleted.len(),
            failed = failed.len(),
            "feed synced"
        );

        Ok(FeedReport {
            feed: self.feed,
            created,
            deleted,
            failed,
            retained: self.retained,
            adopted: self.adopted.len(),
            skipped: self.skipped.len(),
            state_size: next_state.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::ParsedFeed;
    use crate::provenance::Provenance;
    use crate::testing::{MemoryState, MemoryStore};
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Tz;

    fn feed() -> FeedConfig {
        FeedConfig {
            name: "Work".to_string(),
            url: "https://example.com/work.ics".to_string(),
            color: None,
            prefix: "Work ".to_string(),
        }
    }

    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn event(uid: &str, start: &str) -> String {
        format!(
            "BEGIN:VEVENT\nUID:{uid}\nDTSTART:{start}\nDTEND:{start}\nSUMMARY:{uid}\nEND:VEVENT\n"
        )
    }

    fn parse(events: &[String]) -> ParsedFeed {
        let body = format!("BEGIN:VCALENDAR\n{}END:VCALENDAR\n", events.concat());
        ParsedFeed::parse(&body, Tz::UTC, today())
    }

    fn keys(keys: &[&str]) -> KeySet {
        keys.iter().map(|k| EventKey::from(*k)).collect()
    }

    fn tagged(id: &str, feed: &str, key: &str) -> DestinationEvent {
        DestinationEvent {
            id: id.to_string(),
            title: id.to_string(),
            start: today(),
            end: today(),
            all_day: false,
            description: None,
            provenance: Some(Provenance::new(feed, EventKey::from(key))),
        }
    }

    const K1: &str = "k1|SINGLE|20300615T090000Z";
    const K2: &str = "k2|SINGLE|20300616T090000Z";

    #[test]
    fn test_new_keys_are_created() {
        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let diff = FeedDiff::compute(&feed(), &KeySet::new(), parsed, &[]);

        assert_eq!(diff.creates().count(), 1);
        assert_eq!(diff.deletes().count(), 0);
        assert_eq!(diff.observed, keys(&[K1]));
    }

    #[test]
    fn test_known_keys_are_retained() {
        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let diff = FeedDiff::compute(&feed(), &keys(&[K1]), parsed, &[]);

        assert!(diff.is_empty());
        assert_eq!(diff.retained, 1);
    }

    #[test]
    fn test_missing_keys_are_deleted_by_tag() {
        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let destination = [
            tagged("a", "Work", K1),
            tagged("b", "Work", K2),
            tagged("c", "Other", K2),
        ];
        let diff = FeedDiff::compute(&feed(), &keys(&[K1, K2]), parsed, &destination);

        let deletes: Vec<_> = diff.deletes().collect();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].old.as_ref().unwrap().id, "b");
        assert_eq!(diff.observed, keys(&[K1]));
    }

    #[test]
    fn test_removed_key_outside_window_vanishes() {
        let diff = FeedDiff::compute(&feed(), &keys(&[K2]), parse(&[]), &[]);
        assert!(diff.is_empty());
        assert_eq!(diff.vanished, vec![EventKey::from(K2)]);
        assert!(diff.observed.is_empty());
    }

    #[test]
    fn test_tagged_destination_event_is_adopted() {
        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let diff = FeedDiff::compute(&feed(), &KeySet::new(), parsed, &[tagged("a", "Work", K1)]);

        assert!(diff.is_empty());
        assert_eq!(diff.adopted, vec![EventKey::from(K1)]);
        assert_eq!(diff.observed, keys(&[K1]));
    }

    #[test]
    fn test_other_feeds_are_not_adopted() {
        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let diff = FeedDiff::compute(&feed(), &KeySet::new(), parsed, &[tagged("a", "Other", K1)]);
        assert_eq!(diff.creates().count(), 1);
    }

    #[test]
    fn test_duplicate_keys_create_once() {
        let parsed = parse(&[event("k1", "20300615T090000Z"), event("k1", "20300615T090000Z")]);
        let diff = FeedDiff::compute(&feed(), &KeySet::new(), parsed, &[]);
        assert_eq!(diff.creates().count(), 1);
        assert_eq!(diff.duplicates, 1);
    }

    #[test]
    fn test_apply_replaces_state_with_observed_keys() {
        let store = MemoryStore::default();
        let state = MemoryState::default();
        let previous_event = store.insert(tagged("b", "Work", K2));

        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let diff = FeedDiff::compute(&feed(), &keys(&[K2]), parsed, &[previous_event]);
        let report = diff.apply(&store, &state).unwrap();

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.deleted.len(), 1);
        assert!(report.is_clean());
        assert_eq!(state.load("Work").unwrap(), keys(&[K1]));
        assert_eq!(store.titles(), vec!["Work k1".to_string()]);
    }

    #[test]
    fn test_failed_create_is_left_out_of_state() {
        let store = MemoryStore::default();
        store.fail_creates();
        let state = MemoryState::default();

        let parsed = parse(&[event("k1", "20300615T090000Z")]);
        let report = FeedDiff::compute(&feed(), &KeySet::new(), parsed, &[])
            .apply(&store, &state)
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(state.load("Work").unwrap().is_empty());
    }

    #[test]
    fn test_failed_delete_keeps_key() {
        let store = MemoryStore::default();
        store.fail_deletes();
        let state = MemoryState::default();

        let report = FeedDiff::compute(&feed(), &keys(&[K2]), parse(&[]), &[tagged("b", "Work", K2)])
            .apply(&store, &state)
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(state.load("Work").unwrap(), keys(&[K2]));
    }
}
