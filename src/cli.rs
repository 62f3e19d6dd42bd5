use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gw2walls::{Config, Filter, Job, Resolution, Source};

/// Find and download Guild Wars 2 wallpapers.
#[derive(Debug, Parser)]
#[command(name = "gw2walls", version)]
#[command(about = "Find and download Guild Wars 2 wallpapers", long_about = None)]
pub struct Cli {
    /// Resolution of the wallpapers to download, e.g. 1920x1080.
    pub resolution: Resolution,

    /// Only download wallpapers of this release, e.g. "Escape from Lion's Arch".
    /// Repeat to pick several releases.
    #[arg(short, long)]
    pub release: Vec<String>,

    /// Only download wallpapers from the `media` page or from `release` pages.
    #[arg(short, long)]
    pub source: Option<Source>,

    /// Directory to save wallpapers to.
    #[arg(short, long = "dest")]
    pub destination: Option<PathBuf>,

    /// TOML file with settings; flags given here take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Attempts per wallpaper before giving up.
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings from the config file (if any) with flags applied on top.
    pub fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).context("failed to load configuration")?,
            None => Config::default(),
        };

        if let Some(destination) = &self.destination {
            config.destination = destination.clone();
        }

        if let Some(attempts) = self.attempts {
            config.attempts = attempts;
        }

        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }

        tracing::debug!("using config: {config:?}");

        Ok(config)
    }

    pub fn job(&self, config: &Config) -> Job {
        let mut filter = Filter::new(self.resolution);

        for release in &self.release {
            filter = filter.release(release.clone());
        }

        if let Some(source) = self.source {
            filter = filter.source(source);
        }

        Job {
            filter,
            retry: config.retry_policy(),
        }
    }
}
