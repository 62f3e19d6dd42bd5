//! Find and download Guild Wars 2 wallpapers.
//!
//! A run fetches the media page, the releases index and every release page,
//! catalogs the wallpaper links found there, keeps the ones matching a
//! [`Filter`] and streams each of them to disk.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod run;

pub use catalog::{Catalog, Filter, Resolution, Source, WallpaperEntry};
pub use config::Config;
pub use crawler::{Crawl, Crawler, Site};
pub use downloader::{Download, Downloader};
pub use error::{ConfigError, DownloadError, FetchError, PageError, ParseError};
pub use fetcher::{PageFetcher, UReqFetcher};
pub use run::{run, Job, Outcome, RetryPolicy, Summary};
