mod commands;
mod render;
mod utils;

use anyhow::Result;
use caldir_feeds_core::config::{FeedConfig, FeedsConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "caldir-feeds")]
#[command(about = "Mirror ICS feed subscriptions into your caldir calendar")]
struct Cli {
    /// Show every event and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and delete events so the calendar matches the feeds
    Sync {
        /// Only operate on this feed (by name)
        #[arg(short, long)]
        feed: Option<String>,
    },
    /// Show what sync would change
    Status {
        /// Only operate on this feed (by name)
        #[arg(short, long)]
        feed: Option<String>,
    },
    /// Delete every event created from feeds and forget sync state
    Purge {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List configured feeds
    Feeds,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = FeedsConfig::load()?;
    tracing::debug!(
        calendar = %config.data_path().display(),
        feeds = config.feeds.len(),
        "loaded config"
    );

    match cli.command {
        Commands::Sync { feed } => {
            let feeds = resolve_feeds(&config, feed.as_deref())?;
            commands::sync::run(&config, feeds, cli.verbose).await
        }
        Commands::Status { feed } => {
            let feeds = resolve_feeds(&config, feed.as_deref())?;
            commands::status::run(&config, feeds, cli.verbose).await
        }
        Commands::Purge { yes } => {
            require_feeds(&config)?;
            commands::purge::run(&config, cli.verbose, yes)
        }
        Commands::Feeds => commands::feeds::run(&config),
    }
}

/// Logs go to stderr so stdout stays free for command output.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "caldir_feeds={default_level},caldir_feeds_core={default_level}"
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn require_feeds(config: &FeedsConfig) -> Result<()> {
    if config.feeds.is_empty() {
        let path = FeedsConfig::config_path()?;
        anyhow::bail!(
            "No feeds configured.\n\n\
            Add one to {}:\n\n  \
            [[feeds]]\n  \
            name = \"work\"\n  \
            url = \"webcal://example.com/calendar.ics\"",
            path.display()
        );
    }

    Ok(())
}

fn resolve_feeds(config: &FeedsConfig, feed_filter: Option<&str>) -> Result<Vec<FeedConfig>> {
    require_feeds(config)?;

    match feed_filter {
        Some(name) => match config.feed(name) {
            Ok(feed) => Ok(vec![feed.clone()]),
            Err(_) => {
                let available: Vec<_> = config.feeds.iter().map(|f| f.name.as_str()).collect();
                anyhow::bail!(
                    "Feed '{}' not found. Available: {}",
                    name,
                    available.join(", ")
                );
            }
        },
        None => Ok(config.feeds.clone()),
    }
}
