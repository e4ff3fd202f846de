//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::date_range::DateRange;
use crate::error::{FeedsError, FeedsResult};
use crate::fetch::{FeedFetcher, FetchedFeed};
use crate::state::{KeySet, SyncStateStore};
use crate::store::{CalendarStore, DestinationEvent, NewEvent};

#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<Vec<DestinationEvent>>,
    next_id: AtomicUsize,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, event: DestinationEvent) -> DestinationEvent {
        self.events.lock().unwrap().push(event.clone());
        event
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<DestinationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<_> = self.events().into_iter().map(|e| e.title).collect();
        titles.sort();
        titles
    }
}

impl CalendarStore for MemoryStore {
    fn create_event(&self, event: &NewEvent) -> FeedsResult<String> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(FeedsError::Store("create refused".into()));
        }
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.insert(DestinationEvent {
            id: id.clone(),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            all_day: event.all_day,
            description: Some(event.description.clone()),
            provenance: Some(event.provenance.clone()),
        });
        Ok(id)
    }

    fn list_events(&self, range: &DateRange) -> FeedsResult<Vec<DestinationEvent>> {
        Ok(self
            .events()
            .into_iter()
            .filter(|e| range.contains(e.start))
            .collect())
    }

    fn delete_event(&self, id: &str) -> FeedsResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(FeedsError::Store("delete refused".into()));
        }
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(FeedsError::Store(format!("no event {id}")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryState {
    feeds: Mutex<HashMap<String, KeySet>>,
}

impl SyncStateStore for MemoryState {
    fn load(&self, feed: &str) -> FeedsResult<KeySet> {
        Ok(self.feeds.lock().unwrap().get(feed).cloned().unwrap_or_default())
    }

    fn store(&self, feed: &str, keys: &KeySet) -> FeedsResult<()> {
        self.feeds.lock().unwrap().insert(feed.to_string(), keys.clone());
        Ok(())
    }

    fn clear(&self, feed: &str) -> FeedsResult<()> {
        self.feeds.lock().unwrap().remove(feed);
        Ok(())
    }
}

/// Serves whatever body was last set, with a fixed status.
pub struct StaticFetcher {
    status: u16,
    body: Mutex<String>,
}

impl StaticFetcher {
    pub fn new(body: &str) -> Self {
        StaticFetcher {
            status: 200,
            body: Mutex::new(body.to_string()),
        }
    }

    pub fn failing(status: u16) -> Self {
        StaticFetcher {
            status,
            body: Mutex::new(String::new()),
        }
    }

    pub fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = body.to_string();
    }
}

impl FeedFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> FeedsResult<FetchedFeed> {
        Ok(FetchedFeed {
            status: self.status,
            body: self.body.lock().unwrap().clone(),
        })
    }
}
