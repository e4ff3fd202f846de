//! ICS file generation for destination events.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::constants::{FEED_PROPERTY, KEY_PROPERTY};
use crate::error::FeedsResult;
use crate::store::NewEvent;

/// Generate .ics content for a new destination event.
///
/// All-day events are written as `VALUE=DATE` in the destination `zone`;
/// timed events are written in UTC.
pub fn generate_ics(event: &NewEvent, uid: &str, zone: Tz) -> FeedsResult<String> {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(uid);
    ics_event.summary(&event.title);
    ics_event.add_property("DTSTAMP", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

    add_datetime_property(&mut ics_event, "DTSTART", event.start, event.all_day, zone);
    add_datetime_property(&mut ics_event, "DTEND", event.end, event.all_day, zone);

    ics_event.description(&event.description);

    if let Some(ref location) = event.location {
        ics_event.location(location);
    }

    if let Some(ref color) = event.color {
        ics_event.add_property("COLOR", color);
    }

    // Structured provenance, read back by the store for deletions
    ics_event.add_property(FEED_PROPERTY, &event.provenance.feed);
    ics_event.add_property(KEY_PROPERTY, event.provenance.key.as_str());

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:CALDIR-FEEDS\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn add_datetime_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    instant: DateTime<Utc>,
    all_day: bool,
    zone: Tz,
) {
    if all_day {
        let date = instant.with_timezone(&zone).date_naive();
        let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
        prop.append_parameter(ValueType::Date);
        ics_event.append_property(prop);
    } else {
        ics_event.add_property(name, instant.format("%Y%m%dT%H%M%SZ").to_string());
    }
}
