//! Destination calendar store.

mod dir;

pub use dir::DirCalendarStore;

use chrono::{DateTime, Utc};

use crate::date_range::DateRange;
use crate::error::FeedsResult;
use crate::provenance::Provenance;

/// An event to be created in the destination calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub location: Option<String>,
    pub color: Option<String>,
    pub description: String,
    pub provenance: Provenance,
}

/// An event as it exists in the destination calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub description: Option<String>,
    /// Feed/key tags, when the event was written by the mirror.
    pub provenance: Option<Provenance>,
}

impl DestinationEvent {
    /// Written by the mirror for `feed`.
    pub fn belongs_to(&self, feed: &str) -> bool {
        self.provenance.as_ref().is_some_and(|p| p.feed == feed)
    }
}

/// The calendar mirrored events are written to.
///
/// Implementations must store `NewEvent::provenance` so that it comes back
/// from `list_events`; the engine has no other way to find its own events.
pub trait CalendarStore {
    /// Create an event, returning its store-assigned id.
    fn create_event(&self, event: &NewEvent) -> FeedsResult<String>;

    /// Events whose start lies within `range`.
    fn list_events(&self, range: &DateRange) -> FeedsResult<Vec<DestinationEvent>>;

    fn delete_event(&self, id: &str) -> FeedsResult<()>;
}
