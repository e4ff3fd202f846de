//! Conversion of raw DTSTART/DTEND values into absolute instants.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{FeedsError, FeedsResult};
use crate::ics::ParsedField;
use crate::timezone::{self, ResolvedTimezone};

/// An instant computed from one date field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstant {
    pub instant: DateTime<Utc>,
    /// Date-only value (all-day event).
    pub all_day: bool,
    /// Zone the wall-clock value was interpreted in, when it came from a TZID.
    pub zone: Option<ResolvedTimezone>,
}

/// Interpret a start/end field as an instant.
///
/// Order of precedence: date-only value (midnight in `destination`), UTC
/// marker, TZID parameter, and finally the destination zone for floating
/// values.
pub fn parse_instant(field: &ParsedField, destination: Tz) -> FeedsResult<ParsedInstant> {
    let value = field.value.trim();

    if field.is_date_only() {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .filter(|_| is_digits(value, 8))
            .ok_or_else(|| FeedsError::DateParse(format!("{}:{}", field.name, value)))?;
        return Ok(ParsedInstant {
            instant: start_of_day(destination, date),
            all_day: true,
            zone: None,
        });
    }

    if let Some(utc) = value.strip_suffix(['Z', 'z']) {
        let naive = parse_wall_clock(utc)
            .ok_or_else(|| FeedsError::DateParse(format!("{}:{}", field.name, value)))?;
        return Ok(ParsedInstant {
            instant: naive.and_utc(),
            all_day: false,
            zone: None,
        });
    }

    let naive = parse_wall_clock(value)
        .ok_or_else(|| FeedsError::DateParse(format!("{}:{}", field.name, value)))?;

    match field.tzid() {
        Some(tzid) => {
            let resolved = timezone::resolve(tzid);
            let tz = resolved.tz().ok_or_else(|| {
                FeedsError::DateParse(format!("unknown timezone '{}'", resolved.canonical))
            })?;
            Ok(ParsedInstant {
                instant: localize(tz, naive),
                all_day: false,
                zone: Some(resolved),
            })
        }
        None => Ok(ParsedInstant {
            instant: localize(destination, naive),
            all_day: false,
            zone: None,
        }),
    }
}

/// Start of the civil day containing `now` in `zone`.
pub fn start_of_today(zone: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(zone, now.with_timezone(&zone).date_naive())
}

/// Local midnight of `date` in `zone`.
pub fn start_of_day(zone: Tz, date: NaiveDate) -> DateTime<Utc> {
    localize(zone, date.and_time(chrono::NaiveTime::MIN))
}

/// Convert a wall-clock time in `zone` to UTC.
///
/// Ambiguous times (DST fold) take the earlier instant; non-existent times
/// (DST gap) are shifted forward by one hour.
pub fn localize(zone: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match zone.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => dt.with_timezone(&Utc),
                LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
                // No zone has back-to-back gaps; treat the wall clock as UTC offset-free.
                LocalResult::None => naive.and_utc(),
            }
        }
    }
}

/// Parse an ISO-8601 DURATION value (`PT1H30M`, `P1D`, `-PT15M`).
pub fn parse_duration(value: &str) -> FeedsResult<Duration> {
    let value = value.trim();
    let (negative, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let parsed = iso8601::duration(unsigned)
        .map_err(|e| FeedsError::DateParse(format!("DURATION:{value} ({e})")))?;
    let std_duration: std::time::Duration = parsed.into();
    let duration = Duration::from_std(std_duration)
        .map_err(|e| FeedsError::DateParse(format!("DURATION:{value} ({e})")))?;

    Ok(if negative { -duration } else { duration })
}

/// Strict `YYYYMMDDTHHMMSS` parse.
fn parse_wall_clock(value: &str) -> Option<NaiveDateTime> {
    let (date, time) = value.split_once(['T', 't'])?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}T{time}"), "%Y%m%dT%H%M%S").ok()
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}
