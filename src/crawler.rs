//! Walks the media page and every release page, building the catalog.

use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::{self, same_release, Catalog, ReleaseLink, Source, WallpaperEntry};
use crate::error::PageError;
use crate::fetcher::PageFetcher;

/// Release label given to wallpapers from the media page.
pub const MEDIA_RELEASE: &str = "Media";

/// Where the wallpapers are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub media: Url,
    pub releases: Url,
}

/// A page that could not contribute to the catalog.
#[derive(Debug)]
pub struct PageFailure {
    pub url: Url,
    pub error: PageError,
}

#[derive(Debug, Default)]
pub struct Crawl {
    pub catalog: Catalog,
    pub failures: Vec<PageFailure>,
}

pub struct Crawler<F: PageFetcher> {
    fetcher: F,
    site: Site,
    releases: Vec<String>,
    source: Option<Source>,
}

impl<F> Crawler<F>
where
    F: PageFetcher,
{
    pub fn new(fetcher: F, site: Site) -> Self {
        Self {
            fetcher,
            site,
            releases: Vec::new(),
            source: None,
        }
    }

    /// Skips release pages whose name on the index is none of the releases
    /// asked for. May be called more than once.
    pub fn only_release(mut self, release: impl Into<String>) -> Self {
        self.releases.push(release.into());
        self
    }

    /// Skips the part of the site that can't hold `source` wallpapers.
    pub fn only_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Fetches and catalogs every page, one after the other.
    ///
    /// A page that fails to fetch or parse is recorded in
    /// [`Crawl::failures`] and the remaining pages are still visited.
    pub fn crawl(&self) -> Crawl {
        let mut crawl = Crawl::default();

        if self.visits_media() {
            let url = &self.site.media;
            info!("getting media wallpapers from {url}");

            let entries = self
                .fetcher
                .fetch(url)
                .map_err(PageError::from)
                .and_then(|html| {
                    catalog::parse(&html, MEDIA_RELEASE, url, Source::Media).map_err(PageError::from)
                });

            record(&mut crawl, url, entries);
        }

        if self.visits(Source::Release) {
            let url = &self.site.releases;
            info!("getting releases from {url}");

            let links = self
                .fetcher
                .fetch(url)
                .map_err(PageError::from)
                .and_then(|html| catalog::parse_release_index(&html, url).map_err(PageError::from));

            match links {
                Ok(links) => {
                    for link in links {
                        if self.skips(&link) {
                            debug!("skipping release {} ({})", link.name, link.url);
                            continue;
                        }

                        let entries = self.release_page(&link);
                        record(&mut crawl, &link.url, entries);
                    }
                }
                Err(error) => {
                    warn!("failed to get releases from {url}: {error}");
                    crawl.failures.push(PageFailure {
                        url: url.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "cataloged {} wallpapers, {} pages failed",
            crawl.catalog.len(),
            crawl.failures.len()
        );

        crawl
    }

    fn release_page(&self, link: &ReleaseLink) -> Result<Vec<WallpaperEntry>, PageError> {
        info!("getting release {}", link.url);

        let html = self.fetcher.fetch(&link.url)?;

        let release = if link.name.is_empty() {
            catalog::page_title(&html).unwrap_or_else(|| fallback_name(&link.url))
        } else {
            link.name.clone()
        };

        let entries: Vec<_> = catalog::parse(&html, &release, &link.url, Source::Release)?
            .into_iter()
            .map(|entry| {
                entry
                    .with_date(link.date)
                    .with_section(link.section.clone())
            })
            .collect();

        Ok(entries)
    }

    fn visits(&self, source: Source) -> bool {
        self.source.map_or(true, |only| only == source)
    }

    fn visits_media(&self) -> bool {
        self.visits(Source::Media) && self.wants(MEDIA_RELEASE)
    }

    fn wants(&self, release: &str) -> bool {
        self.releases.is_empty()
            || self
                .releases
                .iter()
                .any(|wanted| same_release(wanted, release))
    }

    // Unnamed links are visited since their name only shows on the page itself.
    fn skips(&self, link: &ReleaseLink) -> bool {
        !link.name.is_empty() && !self.wants(&link.name)
    }
}

fn record(crawl: &mut Crawl, url: &Url, entries: Result<Vec<WallpaperEntry>, PageError>) {
    match entries {
        Ok(entries) => crawl.catalog.extend(entries),
        Err(error) => {
            warn!("skipping {url}: {error}");
            crawl.failures.push(PageFailure {
                url: url.clone(),
                error,
            });
        }
    }
}

/// Last non-empty path segment, e.g. `january-2013`.
fn fallback_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .unwrap_or("release")
        .to_string()
}
