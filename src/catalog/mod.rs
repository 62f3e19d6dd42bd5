//! The in-memory catalog of wallpapers discovered during a run.

mod parser;
mod resolution;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;
use url::Url;

pub use parser::{date_from_url, page_title, parse, parse_release_index, ReleaseLink};
pub use resolution::{InvalidResolution, Resolution, MAX_DIMENSION};

/// Which part of the site a wallpaper was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The media wallpapers page.
    Media,
    /// A release page linked from the releases index.
    Release,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a wallpaper source, expected `media` or `release`")]
pub struct InvalidSource(String);

impl FromStr for Source {
    type Err = InvalidSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "media" => Ok(Self::Media),
            "release" | "releases" => Ok(Self::Release),
            _ => Err(InvalidSource(s.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Media => f.write_str("media"),
            Self::Release => f.write_str("release"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not an http(s) URL")]
pub struct UnsupportedUrl(String);

/// One downloadable variant of a wallpaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperEntry {
    release: String,
    resolution: Resolution,
    url: Url,
    source: Source,
    date: Option<NaiveDate>,
    section: Option<String>,
}

impl WallpaperEntry {
    pub fn new(
        release: impl Into<String>,
        resolution: Resolution,
        url: Url,
        source: Source,
    ) -> Result<Self, UnsupportedUrl> {
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(UnsupportedUrl(url.to_string()));
        }

        Ok(Self {
            release: release.into(),
            resolution,
            url,
            source,
            date: None,
            section: None,
        })
    }

    /// Stamps the date the release came out.
    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Stamps the index heading (usually the season) the release is listed under.
    pub fn with_section(mut self, section: Option<String>) -> Self {
        self.section = section.filter(|section| !section.trim().is_empty());
        self
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }
}

impl fmt::Display for WallpaperEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = self.date {
            write!(f, "{date} ")?;
        }

        if let Some(section) = &self.section {
            write!(f, "{section} / ")?;
        }

        write!(
            f,
            "{} [{}] {} <{}>",
            self.release, self.source, self.resolution, self.url
        )
    }
}

/// Selects the catalog entries worth downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub resolution: Resolution,
    /// Matched case-insensitively against [`WallpaperEntry::release`]. Any
    /// name matches; an empty list lets every release through.
    pub releases: Vec<String>,
    pub source: Option<Source>,
}

impl Filter {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            releases: Vec::new(),
            source: None,
        }
    }

    /// Adds `release` to the names that are let through.
    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.releases.push(release.into());
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn matches(&self, entry: &WallpaperEntry) -> bool {
        if entry.resolution != self.resolution {
            return false;
        }

        if let Some(source) = self.source {
            if entry.source != source {
                return false;
            }
        }

        self.releases.is_empty()
            || self
                .releases
                .iter()
                .any(|release| same_release(release, &entry.release))
    }
}

/// Case-insensitive exact comparison of release names.
pub fn same_release(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Wallpapers in the order they were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<WallpaperEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: WallpaperEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WallpaperEntry> {
        self.entries.iter()
    }

    pub fn filter(&self, filter: &Filter) -> Vec<&WallpaperEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                let keep = filter.matches(entry);
                if !keep {
                    tracing::trace!("skipping {entry}");
                }
                keep
            })
            .collect()
    }
}

impl Extend<WallpaperEntry> for Catalog {
    fn extend<I: IntoIterator<Item = WallpaperEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<WallpaperEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = WallpaperEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a WallpaperEntry;
    type IntoIter = std::slice::Iter<'a, WallpaperEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
