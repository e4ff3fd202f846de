//! Source events, their classification and identity keys.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::SINGLE_MARKER;
use crate::datetime::{parse_duration, parse_instant};
use crate::error::{FeedsError, FeedsResult};
use crate::ics::{RawEventRecord, split_records};
use crate::timezone::ResolvedTimezone;

/// Identity of a mirrored event: `uid|SINGLE|raw start value`.
///
/// The raw start text is used rather than the resolved instant, so the key
/// does not move when zone mappings change, but does move when the source
/// reschedules the event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    pub fn single(uid: &str, raw_start: &str) -> Self {
        EventKey(format!("{uid}|{SINGLE_MARKER}|{raw_start}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EventKey {
    fn from(key: String) -> Self {
        EventKey(key)
    }
}

impl From<&str> for EventKey {
    fn from(key: &str) -> Self {
        EventKey(key.to_string())
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Single,
    Recurring,
    RecurrenceException,
}

impl EventKind {
    /// Classify a record from its recurrence properties alone.
    pub fn of_record(record: &RawEventRecord) -> Self {
        if record.has_field("RECURRENCE-ID") {
            EventKind::RecurrenceException
        } else if record.has_field("RRULE") || record.has_field("RDATE") {
            EventKind::Recurring
        } else {
            EventKind::Single
        }
    }
}

/// A parsed source event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCandidate {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub has_recurrence_rule: bool,
    pub is_recurrence_exception: bool,

    // Provenance diagnostics
    /// DTSTART value exactly as written in the feed.
    pub raw_start: String,
    pub raw_start_line: String,
    pub raw_end_line: Option<String>,
    pub zone: Option<ResolvedTimezone>,
}

impl EventCandidate {
    /// Build a candidate from one record, resolving start/end against `destination`.
    pub fn from_record(record: &RawEventRecord, destination: Tz) -> FeedsResult<Self> {
        let uid = record
            .text("UID")
            .map(|uid| uid.trim().to_string())
            .filter(|uid| !uid.is_empty())
            .ok_or(FeedsError::FieldMissing("UID"))?;

        let start_field = record
            .field("DTSTART")
            .ok_or(FeedsError::FieldMissing("DTSTART"))?;
        let start = parse_instant(&start_field, destination)?;

        let end = match record.field("DTEND") {
            Some(end_field) => parse_instant(&end_field, destination)?.instant,
            None => {
                let duration = record
                    .field("DURATION")
                    .ok_or(FeedsError::FieldMissing("DTEND"))?;
                start.instant + parse_duration(&duration.value)?
            }
        };

        let kind = EventKind::of_record(record);

        Ok(EventCandidate {
            uid,
            start: start.instant,
            end,
            all_day: start.all_day,
            summary: record.text("SUMMARY").unwrap_or_default().trim().to_string(),
            location: record.text("LOCATION").filter(|l| !l.trim().is_empty()),
            description: record.text("DESCRIPTION").filter(|d| !d.trim().is_empty()),
            has_recurrence_rule: kind == EventKind::Recurring,
            is_recurrence_exception: kind == EventKind::RecurrenceException,
            raw_start: start_field.value.trim().to_string(),
            raw_start_line: record.line("DTSTART").unwrap_or_default().to_string(),
            raw_end_line: record
                .line("DTEND")
                .or_else(|| record.line("DURATION"))
                .map(String::from),
            zone: start.zone,
        })
    }

    /// Neither a recurrence master nor an override of one.
    pub fn is_single(&self) -> bool {
        !self.has_recurrence_rule && !self.is_recurrence_exception
    }

    pub fn key(&self) -> EventKey {
        EventKey::single(&self.uid, &self.raw_start)
    }

    /// Starts strictly before `today_start`.
    pub fn is_past(&self, today_start: DateTime<Utc>) -> bool {
        self.start < today_start
    }
}

impl fmt::Display for EventCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary.is_empty() {
            write!(f, "{}", crate::constants::UNTITLED_EVENT)
        } else {
            write!(f, "{}", self.summary)
        }
    }
}

/// A record that could not be turned into a candidate.
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub uid: Option<String>,
    pub reason: String,
}

/// The result of parsing and classifying one feed body.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    /// Single events starting today or later.
    pub candidates: Vec<EventCandidate>,
    pub skipped: Vec<SkippedRecord>,
    pub not_single: usize,
    pub past: usize,
}

impl ParsedFeed {
    /// Parse `body` and keep the single, non-past events.
    pub fn parse(body: &str, destination: Tz, today_start: DateTime<Utc>) -> Self {
        let mut parsed = ParsedFeed::default();

        for record in split_records(body) {
            if EventKind::of_record(&record) != EventKind::Single {
                parsed.not_single += 1;
                continue;
            }

            let candidate = match EventCandidate::from_record(&record, destination) {
                Ok(candidate) => candidate,
                Err(e) => {
                    let uid = record.text("UID");
                    tracing::warn!(uid = uid.as_deref().unwrap_or("?"), error = %e, "skipping event");
                    parsed.skipped.push(SkippedRecord {
                        uid,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !candidate.is_single() {
                parsed.not_single += 1;
            } else if candidate.is_past(today_start) {
                parsed.past += 1;
            } else {
                parsed.candidates.push(candidate);
            }
        }

        parsed
    }
}
