//! Reads wallpaper links out of media and release pages.

use chrono::NaiveDate;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::{Resolution, Source, WallpaperEntry};
use crate::error::ParseError;

/// Elements the site wraps its per-resolution download links in.
const WALLPAPER_CONTAINERS: &str = "li.wallpaper, ul.wallpaper, ul.resolutions";

/// How release pages spell their date in the URL, e.g. `january-2013`.
const SLUG_DATE_FORMATS: [&str; 2] = ["%d-%B-%Y", "%B-%d-%Y"];

/// A release page linked from the releases index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLink {
    /// Heading shown on the index, empty when the index had none.
    pub name: String,
    pub url: Url,
    /// The `h4` of the index section the release is listed under.
    pub section: Option<String>,
    /// From the item's `<time datetime>`, else from the URL.
    pub date: Option<NaiveDate>,
}

/// Extracts every wallpaper link on a page, stamping each with `release`.
///
/// A link counts as a wallpaper when it sits inside one of the site's
/// wallpaper lists, or when its text or file name carries a `<w>x<h>`
/// label. Links whose resolution or address can't be made sense of are
/// logged and skipped; the rest of the page is still cataloged.
///
/// Relative addresses are resolved against the document's `<base>` if it has
/// one, `base` otherwise.
pub fn parse(
    html: &str,
    release: &str,
    base: &Url,
    source: Source,
) -> Result<Vec<WallpaperEntry>, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let document = Html::parse_document(html);
    let base = document_base(&document, base);

    let anchor_selector = Selector::parse("a[href]") //
        .expect("`a[href]` should be a valid selector");
    let container_selector = Selector::parse(WALLPAPER_CONTAINERS) //
        .expect("wallpaper container selector should be valid");

    let mut markers = 0usize;
    let mut entries = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        let label = label(&anchor);

        let in_container = anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|element| container_selector.matches(&element));

        let from_label = Resolution::find_in(&label);
        let from_href = Resolution::find_in(file_name(href));

        if !in_container && from_label.is_none() && from_href.is_none() {
            continue;
        }

        markers += 1;

        let resolution = match from_label.or(from_href) {
            Some(Ok(resolution)) => resolution,
            Some(Err(err)) => {
                warn!("skipping wallpaper link `{href}`: {err}");
                continue;
            }
            None => {
                warn!("skipping wallpaper link `{href}`: no resolution in `{label}`");
                continue;
            }
        };

        let url = match base.join(href) {
            Ok(url) => url,
            Err(err) => {
                warn!("skipping wallpaper link `{href}`: {err}");
                continue;
            }
        };

        match WallpaperEntry::new(release, resolution, url, source) {
            Ok(entry) => {
                debug!("found {entry}");
                entries.push(entry);
            }
            Err(err) => warn!("skipping wallpaper link `{href}`: {err}"),
        }
    }

    if markers == 0 {
        return Err(ParseError::NoWallpapers);
    }

    info!(
        "found {} wallpapers for {release} ({} skipped)",
        entries.len(),
        markers - entries.len()
    );

    Ok(entries)
}

/// Lists the release pages linked from the releases index.
pub fn parse_release_index(html: &str, base: &Url) -> Result<Vec<ReleaseLink>, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let document = Html::parse_document(html);
    let base = document_base(&document, base);

    let section_selector = Selector::parse("section.release-canvas") //
        .expect("`section.release-canvas` should be a valid selector");
    let item_selector = Selector::parse("li") //
        .expect("`li` should be a valid selector");
    let anchor_selector = Selector::parse("a[href]") //
        .expect("`a[href]` should be a valid selector");
    let name_selector = Selector::parse("h5") //
        .expect("`h5` should be a valid selector");
    let section_name_selector = Selector::parse("h4") //
        .expect("`h4` should be a valid selector");
    let time_selector = Selector::parse("time[datetime]") //
        .expect("`time[datetime]` should be a valid selector");

    let mut links = Vec::new();

    for section in document.select(&section_selector) {
        let section_name = section
            .select(&section_name_selector)
            .map(|heading| collapse(heading.text()))
            .find(|heading| !heading.is_empty());

        for item in section.select(&item_selector) {
            let Some(anchor) = item.select(&anchor_selector).next() else {
                continue;
            };

            let href = anchor.value().attr("href").unwrap_or_default().trim();

            let url = match base.join(href) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => url,
                Ok(url) => {
                    warn!("skipping release link `{url}`: not an http(s) page");
                    continue;
                }
                Err(err) => {
                    warn!("skipping release link `{href}`: {err}");
                    continue;
                }
            };

            let name = item
                .select(&name_selector)
                .map(|heading| collapse(heading.text()))
                .find(|heading| !heading.is_empty())
                .unwrap_or_else(|| collapse(anchor.text()));

            let date = item
                .select(&time_selector)
                .filter_map(|time| time.value().attr("datetime"))
                .find_map(parse_datetime)
                .or_else(|| date_from_url(&url));

            if date.is_none() {
                debug!("no release date for {url}");
            }

            links.push(ReleaseLink {
                name,
                url,
                section: section_name.clone(),
                date,
            });
        }
    }

    if links.is_empty() {
        return Err(ParseError::NoReleases);
    }

    let links = links
        .into_iter()
        .unique_by(|link| link.url.clone())
        .collect_vec();

    info!("found {} releases", links.len());

    Ok(links)
}

/// The page's `<title>`, without the trailing ` | site name`.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let selector = Selector::parse("title") //
        .expect("`title` should be a valid selector");

    let title = collapse(document.select(&selector).next()?.text());

    let title = match title.rsplit_once(" | ") {
        Some((head, _)) => head.trim().to_string(),
        None => title,
    };

    (!title.is_empty()).then_some(title)
}

/// Release date spelled in the last path segment of a release page, as in
/// `/releases/january-2013/` or `/releases/may-20-2014/`. Month-only dates
/// fall on the first.
pub fn date_from_url(url: &Url) -> Option<NaiveDate> {
    let slug = url.path_segments()?.rev().find(|segment| !segment.is_empty())?;

    let [day_first, month_first] = SLUG_DATE_FORMATS;

    NaiveDate::parse_from_str(&format!("1-{slug}"), day_first)
        .or_else(|_| NaiveDate::parse_from_str(slug, month_first))
        .ok()
}

/// The date part of a `datetime` attribute such as `2013-01-28` or
/// `2013-01-28T16:00:00Z`.
fn parse_datetime(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(..10)?;

    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn document_base(document: &Html, page: &Url) -> Url {
    let selector = Selector::parse("base[href]") //
        .expect("`base[href]` should be a valid selector");

    document
        .select(&selector)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page.join(href.trim()).ok())
        .unwrap_or_else(|| page.clone())
}

/// Visible text of a link, or the description of the image it wraps.
fn label(anchor: &ElementRef) -> String {
    let text = collapse(anchor.text());

    if !text.is_empty() {
        return text;
    }

    let image_selector = Selector::parse("img[alt]") //
        .expect("`img[alt]` should be a valid selector");

    anchor
        .select(&image_selector)
        .filter_map(|image| image.value().attr("alt"))
        .map(str::trim)
        .find(|alt| !alt.is_empty())
        .or_else(|| anchor.value().attr("title").map(str::trim))
        .unwrap_or_default()
        .to_string()
}

/// Last path segment of a link, ignoring query and fragment.
fn file_name(href: &str) -> &str {
    let path = href.split(['?', '#']).next().unwrap_or(href);

    path.rsplit('/').next().unwrap_or(path)
}

fn collapse<'a>(text: impl Iterator<Item = &'a str>) -> String {
    text.flat_map(str::split_whitespace).join(" ")
}
