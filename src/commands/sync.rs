use anyhow::Result;
use caldir_feeds_core::config::{FeedConfig, FeedsConfig};
use caldir_feeds_core::reconcile::{BatchDiff, Reconciler};
use chrono::Utc;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::{FeedReportRender, Render};
use crate::utils::tui;

pub async fn run(config: &FeedsConfig, feeds: Vec<FeedConfig>, verbose: bool) -> Result<()> {
    let ctx = Context::from_config(config)?;
    let reconciler = Reconciler::new(&ctx.fetcher, &ctx.store, &ctx.state, ctx.zone);

    let mut reports = Vec::new();
    let mut feed_errors = 0usize;

    for (i, feed) in feeds.iter().enumerate() {
        let spinner = tui::create_spinner(feed.render());
        let result = reconciler.sync(feed, Utc::now()).await;
        spinner.finish_and_clear();

        println!("{}", feed.render());

        match result {
            Ok(report) => {
                println!("{}", report.render(ctx.zone, verbose));
                reports.push(report);
            }
            Err(e) => {
                feed_errors += 1;
                println!("   {}", e.to_string().red());
            }
        }

        if i < feeds.len() - 1 {
            println!();
        }
    }

    let (created, deleted, failed) = BatchDiff::report_counts(&reports);

    if created > 0 || deleted > 0 {
        println!("\nSynced: {} created, {} deleted", created, deleted);
    }

    if failed > 0 || feed_errors > 0 {
        println!(
            "{}",
            format!(
                "{} failed {}, {} failed {} (will retry next sync)",
                feed_errors,
                if feed_errors == 1 { "feed" } else { "feeds" },
                failed,
                if failed == 1 { "change" } else { "changes" }
            )
            .yellow()
        );
    }

    completion(feed_errors, failed)
}

/// Non-zero exit when any feed or change failed, so schedulers notice.
fn completion(feed_errors: usize, failed_changes: usize) -> Result<()> {
    if feed_errors > 0 || failed_changes > 0 {
        anyhow::bail!(
            "sync incomplete: {} failed feeds, {} failed changes",
            feed_errors,
            failed_changes
        );
    }
    Ok(())
}
