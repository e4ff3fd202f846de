//! Configuration for caldir-feeds.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{STATE_DIR, STATE_FILE};
use crate::error::{FeedsError, FeedsResult};

static DEFAULT_CALENDAR_DIR: &str = "~/calendar/feeds";

fn default_calendar_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_DIR)
}

/// One subscribed feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Unique name, also used as the state key and provenance tag.
    pub name: String,
    pub url: String,
    /// Color applied to created events.
    #[serde(default)]
    pub color: Option<String>,
    /// Prepended to every event title.
    #[serde(default)]
    pub prefix: String,
}

/// Global configuration at ~/.config/caldir-feeds/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Destination caldir calendar directory.
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: PathBuf,

    /// Civil zone of the destination calendar (IANA name). Defaults to the
    /// system zone.
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        FeedsConfig {
            calendar_dir: default_calendar_dir(),
            timezone: None,
            feeds: Vec::new(),
        }
    }
}

impl FeedsConfig {
    pub fn config_path() -> FeedsResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FeedsError::Config("Could not determine config directory".into()))?
            .join("caldir-feeds");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file first if
    /// none exists.
    pub fn load() -> FeedsResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit file, with `CALDIR_FEEDS_*` environment
    /// variables overriding scalar keys.
    pub fn load_from(path: &Path) -> FeedsResult<Self> {
        let config: FeedsConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("CALDIR_FEEDS"))
            .build()
            .map_err(|e| FeedsError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FeedsError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> FeedsResult<Self> {
        let config: FeedsConfig =
            toml::from_str(content).map_err(|e| FeedsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Feed names must be non-empty, unique and free of surrounding
    /// whitespace, since they are matched exactly against event tags.
    pub fn validate(&self) -> FeedsResult<()> {
        let mut seen = HashSet::new();
        for feed in &self.feeds {
            if feed.name.trim().is_empty() {
                return Err(FeedsError::Config(format!(
                    "Feed with url '{}' has an empty name",
                    feed.url
                )));
            }
            if feed.name.trim() != feed.name {
                return Err(FeedsError::Config(format!(
                    "Feed name '{}' has leading or trailing whitespace",
                    feed.name
                )));
            }
            if !seen.insert(feed.name.as_str()) {
                return Err(FeedsError::Config(format!(
                    "Feed name '{}' is used more than once",
                    feed.name
                )));
            }
        }
        if let Some(ref tz) = self.timezone {
            Tz::from_str(tz)
                .map_err(|_| FeedsError::Config(format!("Unknown timezone '{}'", tz)))?;
        }
        Ok(())
    }

    pub fn feed(&self, name: &str) -> FeedsResult<&FeedConfig> {
        self.feeds
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FeedsError::FeedNotFound(name.to_string()))
    }

    /// Calendar directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str =
            shellexpand::tilde(&self.calendar_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_path().join(STATE_DIR).join(STATE_FILE)
    }

    /// Destination civil zone: configured, else system, else UTC.
    pub fn zone(&self) -> FeedsResult<Tz> {
        if let Some(ref tz) = self.timezone {
            return Tz::from_str(tz)
                .map_err(|_| FeedsError::Config(format!("Unknown timezone '{}'", tz)));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(Tz::from_str(&name).unwrap_or_else(|_| {
                tracing::warn!(zone = %name, "system timezone not recognised, using UTC");
                Tz::UTC
            })),
            Err(e) => {
                tracing::warn!(error = %e, "could not determine system timezone, using UTC");
                Ok(Tz::UTC)
            }
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FeedsResult<()> {
        let contents = format!(
            "\
# caldir-feeds configuration

# Calendar directory mirrored events are written to:
# calendar_dir = \"{}\"

# Timezone of that calendar (defaults to the system timezone):
# timezone = \"Europe/Berlin\"

# [[feeds]]
# name = \"work\"
# url = \"webcal://example.com/calendar.ics\"
# color = \"#0b8043\"
# prefix = \"Work: \"
",
            DEFAULT_CALENDAR_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FeedsError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FeedsError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r##"
calendar_dir = "/tmp/feeds"
timezone = "America/Los_Angeles"

[[feeds]]
name = "work"
url = "webcal://example.com/work.ics"
color = "#0b8043"
prefix = "Work "

[[feeds]]
name = "school"
url = "https://example.com/school.ics"
"##;

    #[test]
    fn test_parse_config() {
        let config = FeedsConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feed("work").unwrap().prefix, "Work ");
        assert_eq!(config.feed("school").unwrap().prefix, "");
        assert_eq!(config.feed("school").unwrap().color, None);
        assert_eq!(config.zone().unwrap(), Tz::America__Los_Angeles);
        assert_eq!(
            config.state_path(),
            PathBuf::from("/tmp/feeds/.caldir-feeds/state.json")
        );
    }

    #[test]
    fn test_defaults() {
        let config = FeedsConfig::from_toml("").unwrap();
        assert!(config.feeds.is_empty());
        assert_eq!(config.calendar_dir, PathBuf::from(DEFAULT_CALENDAR_DIR));
    }

    #[test]
    fn test_duplicate_feed_names_are_rejected() {
        let toml = r#"
[[feeds]]
name = "a"
url = "https://example.com/1.ics"

[[feeds]]
name = "a"
url = "https://example.com/2.ics"
"#;
        assert!(matches!(FeedsConfig::from_toml(toml), Err(FeedsError::Config(_))));
    }

    #[test]
    fn test_padded_feed_name_is_rejected() {
        let toml = r#"
[[feeds]]
name = " work"
url = "https://example.com/work.ics"
"#;
        assert!(matches!(FeedsConfig::from_toml(toml), Err(FeedsError::Config(_))));
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        assert!(FeedsConfig::from_toml("timezone = \"Pacific Standard Time\"").is_err());
    }

    #[test]
    fn test_unknown_feed() {
        let config = FeedsConfig::from_toml(CONFIG).unwrap();
        assert!(matches!(config.feed("nope"), Err(FeedsError::FeedNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, CONFIG).unwrap();

        let config = FeedsConfig::load_from(&path).unwrap();
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.timezone.as_deref(), Some("America/Los_Angeles"));
    }

    #[test]
    fn test_default_config_file_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        FeedsConfig::create_default_config(&path).unwrap();

        let config = FeedsConfig::load_from(&path).unwrap();
        assert!(config.feeds.is_empty());
    }
}
