//! Settings loaded from an optional TOML file.
//!
//! Every key is optional; missing keys fall back to [`Config::default`].
//!
//! ```toml
//! destination = "/srv/wallpapers/gw2"
//! timeout_secs = 60
//! attempts = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawler::Site;
use crate::error::ConfigError;
use crate::fetcher::{UReqFetcher, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::run::RetryPolicy;

pub const MEDIA_URL: &str = "https://www.guildwars2.com/en/media/wallpapers/";
pub const RELEASES_URL: &str = "https://www.guildwars2.com/en/the-game/releases/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub media_url: Url,
    pub releases_url: Url,
    pub user_agent: String,
    /// Per-request timeout, connect through last byte.
    pub timeout_secs: u64,
    /// Attempts per wallpaper, including the first.
    pub attempts: u32,
    pub retry_delay_ms: u64,
    pub destination: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media_url: Url::parse(MEDIA_URL).expect("default media URL should be valid"),
            releases_url: Url::parse(RELEASES_URL).expect("default releases URL should be valid"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            attempts: RetryPolicy::default().max_attempts,
            retry_delay_ms: 500,
            destination: PathBuf::from("wallpapers"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("loaded config from {}: {config:?}", path.display());

        Ok(config)
    }

    pub fn site(&self) -> Site {
        Site {
            media: self.media_url.clone(),
            releases: self.releases_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.attempts.max(1),
            base_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn fetcher(&self) -> UReqFetcher {
        UReqFetcher::new(&self.user_agent, self.timeout())
    }
}
