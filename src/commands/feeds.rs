use anyhow::Result;
use caldir_feeds_core::config::FeedsConfig;
use caldir_feeds_core::state::{JsonStateStore, SyncStateStore};
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(config: &FeedsConfig) -> Result<()> {
    if config.feeds.is_empty() {
        println!(
            "{}",
            format!("No feeds configured in {}", FeedsConfig::config_path()?.display()).dimmed()
        );
        return Ok(());
    }

    let state = JsonStateStore::new(config.state_path());

    for feed in &config.feeds {
        let synced = state.load(&feed.name)?.len();

        println!("{}", feed.render());
        println!("   {}", feed.url.dimmed());

        let mut details = vec![format!("{} synced", synced)];
        if !feed.prefix.is_empty() {
            details.push(format!("prefix \"{}\"", feed.prefix));
        }
        if let Some(ref color) = feed.color {
            details.push(format!("color {}", color));
        }
        println!("   {}", details.join(", ").dimmed());
    }

    println!(
        "\n{}",
        format!("Calendar: {}", config.data_path().display()).dimmed()
    );

    Ok(())
}
