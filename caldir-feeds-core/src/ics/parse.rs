//! Reading destination .ics files back into `DestinationEvent`s, using the
//! icalendar crate's parser.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use crate::candidate::EventKey;
use crate::constants::{FEED_PROPERTY, KEY_PROPERTY};
use crate::datetime::{localize, start_of_day};
use crate::provenance::Provenance;
use crate::store::DestinationEvent;
use crate::timezone;

/// Parse the first VEVENT of `content` into a destination event with `id`.
///
/// Provenance comes from the structured properties when both are present,
/// otherwise from the description trailer.
pub fn parse_destination_event(id: &str, content: &str, zone: Tz) -> Option<DestinationEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let start = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let all_day = matches!(start, DatePerhapsTime::Date(_));
    let start = to_instant(start, zone);
    let end = match vevent.find_prop("DTEND") {
        Some(prop) => to_instant(DatePerhapsTime::try_from(prop).ok()?, zone),
        None => start,
    };

    let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());
    let description = text("DESCRIPTION");

    let tagged = match (vevent.find_prop(FEED_PROPERTY), vevent.find_prop(KEY_PROPERTY)) {
        (Some(feed), Some(key)) => Some(tag(feed, key)),
        _ => None,
    };
    let provenance = tagged.or_else(|| {
        description
            .as_deref()
            .and_then(Provenance::from_description)
    });

    Some(DestinationEvent {
        id: id.to_string(),
        title: text("SUMMARY").unwrap_or_default(),
        start,
        end,
        all_day,
        description,
        provenance,
    })
}

fn tag(feed: &Property, key: &Property) -> Provenance {
    Provenance::new(feed.val.as_str(), EventKey::from(key.val.as_str()))
}

/// Dates are local midnight in `zone`; zoned times fall back to `zone` when
/// their TZID is unknown.
fn to_instant(dpt: DatePerhapsTime, zone: Tz) -> DateTime<Utc> {
    match dpt {
        DatePerhapsTime::Date(date) => start_of_day(zone, date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => dt,
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => localize(zone, naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz = timezone::resolve(&tzid).tz().unwrap_or(zone);
            localize(tz, date_time)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_tagged_event() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:u\r\nSUMMARY:Work Demo\r\n\
DTSTART:20300615T160000Z\r\nDTEND:20300615T170000Z\r\n\
X-CALDIR-FEED:Work\r\nX-CALDIR-FEED-KEY:abc|SINGLE|20300615T090000\r\n\
END:VEVENT\r\nEND:VCALENDAR\r\n";

        let event = parse_destination_event("file-1", ics, Tz::UTC).expect("event");
        assert_eq!(event.id, "file-1");
        assert_eq!(event.title, "Work Demo");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2030, 6, 15, 16, 0, 0).unwrap());
        let provenance = event.provenance.expect("provenance");
        assert_eq!(provenance.feed, "Work");
        assert_eq!(provenance.key.as_str(), "abc|SINGLE|20300615T090000");
    }

    #[test]
    fn test_feed_tag_is_read_verbatim() {
        let ics = "BEGIN:VEVENT\nUID:u\nSUMMARY:x\nDTSTART:20300615T160000Z\n\
X-CALDIR-FEED: padded\nX-CALDIR-FEED-KEY:k\\,1\nEND:VEVENT\n";

        let provenance = parse_destination_event("f", ics, Tz::UTC)
            .and_then(|e| e.provenance)
            .expect("provenance");
        assert_eq!(provenance.feed, " padded");
        assert_eq!(provenance.key.as_str(), "k,1");
    }

    #[test]
    fn test_provenance_falls_back_to_description() {
        let ics = "BEGIN:VEVENT\nUID:u\nSUMMARY:x\nDTSTART:20300615T160000Z\nDTEND:20300615T170000Z\n\
DESCRIPTION:notes\\n\\n-- caldir-feeds --\\nfeed: Home\\nkey: k1\nEND:VEVENT\n";

        let event = parse_destination_event("file-2", ics, Tz::UTC).expect("event");
        assert!(event.description.as_deref().unwrap().starts_with("notes\n"));
        let provenance = event.provenance.expect("provenance");
        assert_eq!(provenance.feed, "Home");
        assert_eq!(provenance.key.as_str(), "k1");
    }

    #[test]
    fn test_untagged_all_day_event() {
        let ics = "BEGIN:VEVENT\nUID:u\nSUMMARY:Dentist\nDTSTART;VALUE=DATE:20300615\nDTEND;VALUE=DATE:20300616\nEND:VEVENT\n";
        let event = parse_destination_event("file-3", ics, Tz::Europe__Berlin).expect("event");
        assert!(event.provenance.is_none());
        assert!(event.all_day);
        assert_eq!(event.start, Utc.with_ymd_and_hms(2030, 6, 14, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_event_without_start_is_rejected() {
        assert!(parse_destination_event("x", "BEGIN:VEVENT\nUID:u\nEND:VEVENT\n", Tz::UTC).is_none());
    }
}
