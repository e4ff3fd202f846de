//! TUI rendering traits for caldir-feeds types.
//!
//! Extension traits that add colored terminal rendering to
//! caldir-feeds-core types using owo_colors.

use caldir_feeds_core::config::FeedConfig;
use caldir_feeds_core::purge::PurgeTarget;
use caldir_feeds_core::reconcile::{DiffKind, EventDiff, FeedDiff, FeedReport};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        let symbol = self.to_string();
        match self {
            DiffKind::Create => symbol.green().to_string(),
            DiffKind::Delete => symbol.red().to_string(),
        }
    }
}

fn colorize_diff(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Create => text.green().to_string(),
        DiffKind::Delete => text.red().to_string(),
    }
}

impl Render for FeedConfig {
    fn render(&self) -> String {
        format!("📡 {}", self.name)
    }
}

/// Event start in the calendar's zone, `YYYY-MM-DD HH:MM`.
pub fn render_time(start: Option<DateTime<Utc>>, zone: Tz) -> String {
    start
        .map(|s| s.with_timezone(&zone).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn render_event_diff(diff: &EventDiff, zone: Tz) -> String {
    let title = colorize_diff(diff.kind, diff.title());
    let time = render_time(diff.start(), zone);
    format!("{} {} {}", diff.kind.render(), title, time.dimmed())
}

/// Show counts instead of individual events above this many changes
const COMPACT_THRESHOLD: usize = 5;

fn render_diff_list<'a>(
    diffs: impl Iterator<Item = &'a EventDiff> + Clone,
    zone: Tz,
    verbose: bool,
    lines: &mut Vec<String>,
) {
    let count = diffs.clone().count();

    if verbose || count <= COMPACT_THRESHOLD {
        for diff in diffs {
            lines.push(format!("   {}", render_event_diff(diff, zone)));
        }
    } else {
        let creates = diffs.clone().filter(|d| d.kind == DiffKind::Create).count();
        let deletes = diffs.filter(|d| d.kind == DiffKind::Delete).count();

        if creates > 0 {
            let label = format!("({} new {})", creates, pluralize("event", creates));
            lines.push(format!("   {} {}", "+".green(), label.green()));
        }
        if deletes > 0 {
            let label = format!("({} deleted {})", deletes, pluralize("event", deletes));
            lines.push(format!("   {} {}", "-".red(), label.red()));
        }
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Counts of events that were seen but not mirrored.
fn render_ignored(skipped: usize, not_single: usize, past: usize) -> Option<String> {
    let mut parts = Vec::new();
    if skipped > 0 {
        parts.push(format!("{} unparseable", skipped));
    }
    if not_single > 0 {
        parts.push(format!("{} recurring", not_single));
    }
    if past > 0 {
        parts.push(format!("{} past", past));
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("   Ignored: {}", parts.join(", ")).dimmed().to_string())
    }
}

pub trait FeedDiffRender {
    fn render(&self, zone: Tz, verbose: bool) -> String;
}

impl FeedDiffRender for FeedDiff {
    fn render(&self, zone: Tz, verbose: bool) -> String {
        let mut lines = Vec::new();

        if self.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        } else {
            render_diff_list(self.changes.iter(), zone, verbose, &mut lines);
        }

        if !self.adopted.is_empty() {
            lines.push(
                format!(
                    "   {} existing {} will be re-linked",
                    self.adopted.len(),
                    pluralize("event", self.adopted.len())
                )
                .dimmed()
                .to_string(),
            );
        }

        lines.extend(render_ignored(self.skipped.len(), self.not_single, self.past));

        if verbose {
            for skipped in &self.skipped {
                lines.push(format!(
                    "      {} {}",
                    skipped.uid.as_deref().unwrap_or("(no uid)").yellow(),
                    skipped.reason.dimmed()
                ));
            }
        }

        lines.join("\n")
    }
}

pub trait FeedReportRender {
    fn render(&self, zone: Tz, verbose: bool) -> String;
}

impl FeedReportRender for FeedReport {
    fn render(&self, zone: Tz, verbose: bool) -> String {
        let mut lines = Vec::new();

        if self.created.is_empty() && self.deleted.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        } else {
            render_diff_list(
                self.created.iter().chain(self.deleted.iter()),
                zone,
                verbose,
                &mut lines,
            );
        }

        for failed in &self.failed {
            lines.push(format!(
                "   {} {}: {}",
                "!".red(),
                failed.diff,
                failed.error.to_string().red()
            ));
        }

        let mut summary = format!("   {} unchanged", self.retained);
        if self.adopted > 0 {
            summary.push_str(&format!(", {} re-linked", self.adopted));
        }
        if self.skipped > 0 {
            summary.push_str(&format!(", {} unparseable", self.skipped));
        }
        lines.push(summary.dimmed().to_string());

        lines.join("\n")
    }
}

impl Render for PurgeTarget {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            "-".red(),
            self.event.title.red(),
            format!("({})", self.reason).dimmed()
        )
    }
}
