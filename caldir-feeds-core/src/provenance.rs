//! Provenance metadata written into destination events.
//!
//! Every mirrored event carries its feed name and key twice: as structured
//! extended properties (`X-CALDIR-FEED`, `X-CALDIR-FEED-KEY`) and as a
//! trailer block in its description. Lookups use the properties; the trailer
//! keeps the event identifiable after a round trip through a client that
//! drops unknown properties.

use crate::candidate::{EventCandidate, EventKey};

/// First line of the description trailer.
pub const MARKER: &str = "-- caldir-feeds --";

const FEED_LABEL: &str = "feed: ";
const KEY_LABEL: &str = "key: ";
const UID_LABEL: &str = "uid: ";
const START_LABEL: &str = "start: ";
const END_LABEL: &str = "end: ";
const ZONE_LABEL: &str = "zone: ";

/// Which feed and key a destination event was created for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub feed: String,
    pub key: EventKey,
}

impl Provenance {
    pub fn new(feed: &str, key: EventKey) -> Self {
        Provenance {
            feed: feed.to_string(),
            key,
        }
    }

    /// Recover provenance from a description trailer.
    pub fn from_description(description: &str) -> Option<Self> {
        let trailer = trailer(description)?;
        let feed = labelled(trailer, FEED_LABEL)?;
        let key = labelled(trailer, KEY_LABEL)?;
        Some(Provenance::new(feed, EventKey::from(key)))
    }
}

/// Description for a new destination event: the source description followed
/// by the provenance trailer.
pub fn render_description(feed: &str, candidate: &EventCandidate) -> String {
    let mut lines = Vec::new();

    if let Some(ref description) = candidate.description {
        lines.push(description.clone());
        lines.push(String::new());
    }

    lines.push(MARKER.to_string());
    lines.push(format!("{FEED_LABEL}{feed}"));
    lines.push(format!("{KEY_LABEL}{}", candidate.key()));
    lines.push(format!("{UID_LABEL}{}", candidate.uid));
    lines.push(format!("{START_LABEL}{}", candidate.raw_start_line));
    if let Some(ref end) = candidate.raw_end_line {
        lines.push(format!("{END_LABEL}{end}"));
    }
    if let Some(ref zone) = candidate.zone {
        lines.push(format!("{ZONE_LABEL}{zone}"));
    }

    lines.join("\n")
}

/// Whether a description carries the provenance trailer.
pub fn has_marker(description: &str) -> bool {
    trailer(description).is_some()
}

/// Whether a description carries uid/start/end metadata lines, as written by
/// older versions that had no marker line.
pub fn has_legacy_metadata(description: &str) -> bool {
    [UID_LABEL, START_LABEL, END_LABEL]
        .iter()
        .all(|label| labelled(description, label).is_some())
}

fn trailer(description: &str) -> Option<&str> {
    let at = description.rfind(MARKER)?;
    Some(&description[at + MARKER.len()..])
}

fn labelled<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.trim_start().strip_prefix(label))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::RawEventRecord;
    use chrono_tz::Tz;

    fn candidate(description: Option<&str>) -> EventCandidate {
        let mut text = String::from(
            "UID:abc\nDTSTART;TZID=Pacific Standard Time:20300615T090000\nDTEND;TZID=Pacific Standard Time:20300615T100000\nSUMMARY:Demo",
        );
        if let Some(description) = description {
            text.push_str(&format!("\nDESCRIPTION:{description}"));
        }
        EventCandidate::from_record(&RawEventRecord::new(&text), Tz::UTC).unwrap()
    }

    #[test]
    fn test_rendered_description_round_trips_provenance() {
        let description = render_description("Work", &candidate(Some("Agenda\\nItem")));

        assert!(description.starts_with("Agenda\nItem\n\n"));
        assert!(description.contains("zone: Pacific Standard Time -> America/Los_Angeles"));
        assert!(has_marker(&description));

        let provenance = Provenance::from_description(&description).expect("provenance");
        assert_eq!(provenance.feed, "Work");
        assert_eq!(provenance.key.as_str(), "abc|SINGLE|20300615T090000");
    }

    #[test]
    fn test_source_description_cannot_spoof_trailer() {
        let description = render_description("Work", &candidate(Some("feed: Other\\nkey: x")));
        let provenance = Provenance::from_description(&description).expect("provenance");
        assert_eq!(provenance.feed, "Work");
    }

    #[test]
    fn test_plain_description_has_no_provenance() {
        assert!(Provenance::from_description("Just a note").is_none());
        assert!(!has_marker("Just a note"));
        assert!(!has_legacy_metadata("Just a note"));
    }

    #[test]
    fn test_legacy_metadata_detection() {
        let legacy = "Imported\nuid: abc\nstart: DTSTART:20300615T090000Z\nend: DTEND:20300615T100000Z";
        assert!(has_legacy_metadata(legacy));
        assert!(!has_marker(legacy));
        assert!(!has_legacy_metadata("uid: abc\nstart: DTSTART:20300615T090000Z"));
    }
}
