use anyhow::Result;
use caldir_feeds_core::config::FeedsConfig;
use caldir_feeds_core::purge::{find_targets, purge};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use super::Context;
use crate::render::Render;

/// Show counts instead of individual events above this many matches
const COMPACT_THRESHOLD: usize = 10;

pub fn run(config: &FeedsConfig, verbose: bool, yes: bool) -> Result<()> {
    let ctx = Context::from_config(config)?;

    let targets = find_targets(&ctx.store, &config.feeds)?;

    if targets.is_empty() {
        println!("{}", "Nothing to purge".dimmed());
    } else if verbose || targets.len() <= COMPACT_THRESHOLD {
        for target in &targets {
            println!("   {}", target.render());
        }
    } else {
        println!("   {}", format!("({} events)", targets.len()).red());
    }

    // Confirm unless --yes
    if !yes {
        println!();
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} {} and clear sync state for {} {}?",
                targets.len(),
                if targets.len() == 1 { "event" } else { "events" },
                config.feeds.len(),
                if config.feeds.len() == 1 { "feed" } else { "feeds" }
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    let report = purge(&ctx.store, &ctx.state, &config.feeds)?;

    for (target, error) in &report.failed {
        println!(
            "   {} {}: {}",
            "!".red(),
            target.event.title,
            error.to_string().red()
        );
    }

    println!(
        "\nPurged: {} deleted, {} failed, {} {} reset",
        report.deleted.len(),
        report.failed.len(),
        report.cleared_feeds.len(),
        if report.cleared_feeds.len() == 1 { "feed" } else { "feeds" }
    );

    Ok(())
}
