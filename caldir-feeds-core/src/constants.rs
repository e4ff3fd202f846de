//! Shared constants.

/// Marker placed between the uid and the raw start value of a single-event key.
pub const SINGLE_MARKER: &str = "SINGLE";

/// Title used when the source event has an empty SUMMARY.
pub const UNTITLED_EVENT: &str = "(No title)";

/// Extended property carrying the feed name on destination events.
pub const FEED_PROPERTY: &str = "X-CALDIR-FEED";

/// Extended property carrying the event key on destination events.
pub const KEY_PROPERTY: &str = "X-CALDIR-FEED-KEY";

/// Directory (inside the calendar dir) holding mirror state.
pub const STATE_DIR: &str = ".caldir-feeds";

/// File (inside `STATE_DIR`) holding the per-feed key sets.
pub const STATE_FILE: &str = "state.json";
