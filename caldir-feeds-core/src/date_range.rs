//! Date range for scanning destination events.

use chrono::{DateTime, Utc};

/// Date range for filtering events.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// `[from, to]`
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Everything starting at or after `from`.
    pub fn starting(from: DateTime<Utc>) -> Self {
        DateRange {
            from: Some(from),
            to: None,
        }
    }

    /// Every event, whenever it happens (used by purge).
    pub fn unbounded() -> Self {
        DateRange {
            from: None,
            to: None,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| instant >= from) && self.to.is_none_or(|to| instant <= to)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_bound = |bound: Option<DateTime<Utc>>| {
            bound
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "..".to_string())
        };
        write!(f, "{} - {}", fmt_bound(self.from), fmt_bound(self.to))
    }
}
