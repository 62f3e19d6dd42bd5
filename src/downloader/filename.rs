//! Deterministic local file names for catalog entries.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use image::ImageFormat;
use url::Url;

use crate::catalog::WallpaperEntry;

/// Extension used when neither the URL nor the content says what the file is.
pub const FALLBACK_EXTENSION: &str = "data";

const MAX_COMPONENT_LEN: usize = 96;

/// `<date>_<release>_<resolution>_<url stem>_<url tag>.<extension>`, sanitized.
///
/// The date is left out when the release has none, the stem when the URL
/// has no file name. The tag is a short hash of the whole URL, so two
/// wallpapers only share a name when they share an address.
pub fn file_name(entry: &WallpaperEntry, extension: &str) -> String {
    let release = match sanitize(entry.release()) {
        release if release.is_empty() => "wallpaper".to_string(),
        release => release,
    };

    let mut parts = Vec::with_capacity(5);

    if let Some(date) = entry.date() {
        parts.push(date.format("%Y-%m-%d").to_string());
    }

    parts.push(release);
    parts.push(entry.resolution().to_string());

    let stem = sanitize(&url_stem(entry.url()));
    if !stem.is_empty() {
        parts.push(stem);
    }

    parts.push(url_tag(entry.url()));

    format!("{}.{extension}", parts.join("_"))
}

/// Eight hex digits derived from the URL, ignoring any fragment.
pub fn url_tag(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = DefaultHasher::new();
    url.as_str().hash(&mut hasher);

    format!("{:08x}", hasher.finish() as u32)
}

/// Lowercased extension of the URL's file name, if it names an image format.
pub fn url_extension(url: &Url) -> Option<String> {
    let (_, extension) = last_segment(url)?.rsplit_once('.')?;

    ImageFormat::from_extension(extension)?;

    Some(extension.to_ascii_lowercase())
}

/// Guesses an extension from the first bytes of a file.
pub fn sniff_extension(head: &[u8]) -> &'static str {
    image::guess_format(head)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or(FALLBACK_EXTENSION)
}

fn url_stem(url: &Url) -> String {
    let Some(segment) = last_segment(url) else {
        return String::new();
    };

    match url_extension(url) {
        Some(_) => segment
            .rsplit_once('.')
            .map_or(segment, |(stem, _)| stem)
            .to_string(),
        None => segment.to_string(),
    }
}

fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
}

/// Keeps letters, digits and `-_.()`, turns whitespace into `_` and drops the rest.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '(' | ')') {
            out.push(c);
        } else if (c.is_whitespace() || c == '_') && !out.ends_with('_') {
            out.push('_');
        }
    }

    out.trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(MAX_COMPONENT_LEN)
        .collect()
}
