pub mod feeds;
pub mod purge;
pub mod status;
pub mod sync;

use anyhow::Result;
use caldir_feeds_core::config::FeedsConfig;
use caldir_feeds_core::fetch::HttpFetcher;
use caldir_feeds_core::state::JsonStateStore;
use caldir_feeds_core::store::DirCalendarStore;
use chrono_tz::Tz;

/// Collaborators built from the global config.
pub struct Context {
    pub zone: Tz,
    pub fetcher: HttpFetcher,
    pub store: DirCalendarStore,
    pub state: JsonStateStore,
}

impl Context {
    pub fn from_config(config: &FeedsConfig) -> Result<Self> {
        let zone = config.zone()?;

        Ok(Context {
            zone,
            fetcher: HttpFetcher::new()?,
            store: DirCalendarStore::new(config.data_path(), zone),
            state: JsonStateStore::new(config.state_path()),
        })
    }
}
