use std::fmt;

use chrono::{DateTime, Utc};

use crate::candidate::{EventCandidate, EventKey};
use crate::config::FeedConfig;
use crate::constants::UNTITLED_EVENT;
use crate::provenance::{Provenance, render_description};
use crate::reconcile::DiffKind;
use crate::store::{DestinationEvent, NewEvent};

/// One destination mutation planned for a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDiff {
    pub kind: DiffKind,
    pub key: EventKey,
    /// Set for `Create`.
    pub new: Option<NewEvent>,
    /// Set for `Delete`.
    pub old: Option<DestinationEvent>,
}

impl fmt::Display for EventDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.title())
    }
}

impl EventDiff {
    pub fn create(feed: &FeedConfig, candidate: &EventCandidate) -> Self {
        EventDiff {
            kind: DiffKind::Create,
            key: candidate.key(),
            new: Some(new_event(feed, candidate)),
            old: None,
        }
    }

    pub fn delete(key: EventKey, event: DestinationEvent) -> Self {
        EventDiff {
            kind: DiffKind::Delete,
            key,
            new: None,
            old: Some(event),
        }
    }

    pub fn title(&self) -> &str {
        self.new
            .as_ref()
            .map(|e| e.title.as_str())
            .or(self.old.as_ref().map(|e| e.title.as_str()))
            .unwrap_or_default()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.new
            .as_ref()
            .map(|e| e.start)
            .or(self.old.as_ref().map(|e| e.start))
    }
}

/// Destination event for a candidate: prefixed title, configured color and
/// the provenance description.
fn new_event(feed: &FeedConfig, candidate: &EventCandidate) -> NewEvent {
    let summary = if candidate.summary.is_empty() {
        UNTITLED_EVENT
    } else {
        candidate.summary.as_str()
    };

    NewEvent {
        title: format!("{}{}", feed.prefix, summary),
        start: candidate.start,
        end: candidate.end,
        all_day: candidate.all_day,
        location: candidate.location.clone(),
        color: feed.color.clone(),
        description: render_description(&feed.name, candidate),
        provenance: Provenance::new(&feed.name, candidate.key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::RawEventRecord;
    use chrono_tz::Tz;

    fn feed() -> FeedConfig {
        FeedConfig {
            name: "Work".to_string(),
            url: "https://example.com/work.ics".to_string(),
            color: Some("#0b8043".to_string()),
            prefix: "Work ".to_string(),
        }
    }

    fn candidate(summary: &str) -> EventCandidate {
        let text = format!(
            "UID:abc\nDTSTART:20300615T090000Z\nDTEND:20300615T100000Z\nSUMMARY:{summary}"
        );
        EventCandidate::from_record(&RawEventRecord::new(&text), Tz::UTC).unwrap()
    }

    #[test]
    fn test_create_prefixes_title_and_tags_provenance() {
        let diff = EventDiff::create(&feed(), &candidate("Standup"));
        let new = diff.new.as_ref().unwrap();

        assert_eq!(diff.kind, DiffKind::Create);
        assert_eq!(new.title, "Work Standup");
        assert_eq!(new.color.as_deref(), Some("#0b8043"));
        assert_eq!(new.provenance.feed, "Work");
        assert_eq!(new.provenance.key, diff.key);
        assert!(new.description.contains("key: abc|SINGLE|20300615T090000Z"));
        assert_eq!(diff.to_string(), "+: Work Standup");
    }

    #[test]
    fn test_empty_summary_gets_placeholder() {
        let diff = EventDiff::create(&feed(), &candidate(""));
        assert_eq!(diff.title(), "Work (No title)");
    }
}
