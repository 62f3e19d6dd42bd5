use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Largest width or height accepted; anything beyond is a typo, not a wallpaper.
pub const MAX_DIMENSION: u32 = 32_768;

static EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<width>\d+)\s*[xX×]\s*(?P<height>\d+)\s*$")
        .expect("exact resolution pattern should compile")
});

static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9A-Za-z])(?P<width>\d+)\s*[xX×]\s*(?P<height>\d+)(?:[^0-9A-Za-z]|$)")
        .expect("embedded resolution pattern should compile")
});

/// Width and height of a wallpaper, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution {
    width: u32,
    height: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid resolution, expected something like `1920x1080`")]
pub struct InvalidResolution(String);

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, InvalidResolution> {
        if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
            return Err(InvalidResolution(format!("{width}x{height}")));
        }

        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Looks for a `<width>x<height>` label anywhere in `text`.
    ///
    /// Returns `None` when nothing resembling a resolution is present, and
    /// `Some(Err(..))` when something is present but out of range.
    pub fn find_in(text: &str) -> Option<Result<Self, InvalidResolution>> {
        let captures = EMBEDDED.captures(text)?;

        Some(from_parts(&captures["width"], &captures["height"], text))
    }
}

fn from_parts(width: &str, height: &str, label: &str) -> Result<Resolution, InvalidResolution> {
    let invalid = || InvalidResolution(label.trim().to_string());

    let width = width.parse::<u32>().map_err(|_| invalid())?;
    let height = height.parse::<u32>().map_err(|_| invalid())?;

    Resolution::new(width, height).map_err(|_| invalid())
}

impl FromStr for Resolution {
    type Err = InvalidResolution;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = EXACT
            .captures(s)
            .ok_or_else(|| InvalidResolution(s.trim().to_string()))?;

        from_parts(&captures["width"], &captures["height"], s)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
