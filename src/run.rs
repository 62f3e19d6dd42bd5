//! Crawl, filter, download: one complete run of the tool.

use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::{Filter, WallpaperEntry};
use crate::crawler::{Crawler, PageFailure, Site};
use crate::downloader::{Download, Downloader};
use crate::error::DownloadError;
use crate::fetcher::PageFetcher;

/// Exponential backoff for downloads that failed for a transient reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(8);

        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `f` until it succeeds, fails for good, or runs out of attempts.
    pub fn run<T>(
        &self,
        mut f: impl FnMut() -> Result<T, DownloadError>,
    ) -> Result<T, DownloadError> {
        let mut attempt = 1u32;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay(attempt);
                    warn!("attempt {attempt} failed: {err}; retrying in {delay:?}");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub filter: Filter,
    pub retry: RetryPolicy,
}

/// Something that went wrong during a run without stopping it.
#[derive(Debug)]
pub enum Failure {
    Page(PageFailure),
    Download {
        entry: WallpaperEntry,
        error: DownloadError,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Page(page) => write!(f, "page {}: {}", page.url, page.error),
            Failure::Download { entry, error } => write!(f, "{entry}: {error}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one wallpaper was written.
    Success,
    NoMatches,
    AllFailed,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub cataloged: usize,
    pub matched: usize,
    pub downloaded: Vec<Download>,
    pub failures: Vec<Failure>,
}

impl Summary {
    pub fn outcome(&self) -> Outcome {
        if self.matched == 0 {
            Outcome::NoMatches
        } else if self.downloaded.is_empty() {
            Outcome::AllFailed
        } else {
            Outcome::Success
        }
    }
}

/// Catalogs `site`, then downloads every entry matching `job` into `destination`.
///
/// Only a destination that can't be created stops the run; page and file
/// failures are collected into the returned [`Summary`].
pub fn run<F>(
    fetcher: F,
    site: Site,
    destination: impl AsRef<Path>,
    job: &Job,
) -> Result<Summary, DownloadError>
where
    F: PageFetcher,
{
    let downloader = Downloader::with_fetcher(destination, &fetcher)?;

    let mut crawler = Crawler::new(&fetcher, site);

    for release in &job.filter.releases {
        crawler = crawler.only_release(release.clone());
    }

    if let Some(source) = job.filter.source {
        crawler = crawler.only_source(source);
    }

    let crawl = crawler.crawl();
    let matches = crawl.catalog.filter(&job.filter);

    info!(
        "{} of {} wallpapers match {}",
        matches.len(),
        crawl.catalog.len(),
        job.filter.resolution
    );

    let mut summary = Summary {
        cataloged: crawl.catalog.len(),
        matched: matches.len(),
        downloaded: Vec::with_capacity(matches.len()),
        failures: crawl.failures.into_iter().map(Failure::Page).collect(),
    };

    for entry in matches {
        info!("downloading {}", entry.url());

        match job.retry.run(|| downloader.download(entry)) {
            Ok(download) => summary.downloaded.push(download),
            Err(error) => {
                warn!("failed to download {}: {error}", entry.url());
                summary.failures.push(Failure::Download {
                    entry: entry.clone(),
                    error,
                });
            }
        }
    }

    Ok(summary)
}
