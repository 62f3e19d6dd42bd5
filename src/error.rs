//! Errors raised while fetching pages, cataloging them and writing files.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure retrieving a page or file over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("failed to read the body of {url}")]
    Body {
        url: String,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Whether trying the same request again could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Transport { .. } | FetchError::Body { .. } => true,
        }
    }
}

/// The page does not look like something wallpapers can be read from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("no wallpaper links found")]
    NoWallpapers,

    #[error("no releases found")]
    NoReleases,
}

/// Failure fetching or parsing one page during a crawl.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failure transferring one wallpaper to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("transfer from {url} was interrupted after {received} bytes")]
    Transfer {
        url: String,
        received: u64,
        #[source]
        source: io::Error,
    },

    #[error("incomplete transfer from {url}: expected {expected} bytes, got {received}")]
    Incomplete {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create destination directory {}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    /// Transient network trouble is worth another attempt, local disk trouble is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Fetch(err) => err.is_retryable(),
            DownloadError::Transfer { .. } | DownloadError::Incomplete { .. } => true,
            DownloadError::Io { .. } | DownloadError::Directory { .. } => false,
        }
    }
}

/// The configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_retry_server_errors() {
        let err = FetchError::Status {
            url: "https://example.com/a.jpg".into(),
            status: 503,
        };

        assert!(err.is_retryable());
        assert!(DownloadError::Fetch(err).is_retryable());
    }

    #[test]
    fn should_not_retry_client_errors() {
        let err = FetchError::Status {
            url: "https://example.com/a.jpg".into(),
            status: 404,
        };

        assert!(!err.is_retryable());

        let throttled = FetchError::Status {
            url: "https://example.com/a.jpg".into(),
            status: 429,
        };

        assert!(throttled.is_retryable());
    }

    #[test]
    fn should_not_retry_disk_errors() {
        let err = DownloadError::Io {
            path: PathBuf::from("/tmp/x.jpg"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(!err.is_retryable());
    }
}
