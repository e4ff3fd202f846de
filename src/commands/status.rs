use anyhow::Result;
use caldir_feeds_core::config::{FeedConfig, FeedsConfig};
use caldir_feeds_core::reconcile::{BatchDiff, Reconciler};
use chrono::Utc;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::{FeedDiffRender, Render};
use crate::utils::tui;

pub async fn run(config: &FeedsConfig, feeds: Vec<FeedConfig>, verbose: bool) -> Result<()> {
    let ctx = Context::from_config(config)?;
    let reconciler = Reconciler::new(&ctx.fetcher, &ctx.store, &ctx.state, ctx.zone);

    let mut diffs = Vec::new();

    for (i, feed) in feeds.iter().enumerate() {
        let spinner = tui::create_spinner(feed.render());
        let result = reconciler.plan(feed, Utc::now()).await;
        spinner.finish_and_clear();

        println!("{}", feed.render());

        match result {
            Ok(diff) => {
                println!("{}", diff.render(ctx.zone, verbose));
                diffs.push(diff);
            }
            Err(e) => println!("   {}", e.to_string().red()),
        }

        if i < feeds.len() - 1 {
            println!();
        }
    }

    let batch = BatchDiff(diffs);
    let (created, deleted) = batch.counts();

    if !batch.is_empty() {
        println!(
            "\nRun {} to apply: {} to create, {} to delete",
            "caldir-feeds sync".bold(),
            created,
            deleted
        );
    }

    Ok(())
}
