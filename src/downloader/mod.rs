mod filename;

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

use crate::catalog::WallpaperEntry;
use crate::error::DownloadError;
use crate::fetcher::{PageFetcher, UReqFetcher};

pub use filename::{
    file_name, sanitize, sniff_extension, url_extension, url_tag, FALLBACK_EXTENSION,
};

/// Size of each read from the response body.
const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes kept from the start of the body to recognise the image format.
const SNIFF_LEN: usize = 32;

/// Mode requested for saved wallpapers, before the umask applies.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

pub struct Downloader<T: PageFetcher> {
    fetcher: T,
    path: PathBuf,
}

#[derive(Debug, PartialEq)]
pub struct Download {
    pub source: Url,
    pub file: PathBuf,
    pub bytes: u64,
}

impl Download {
    pub fn new(source: Url, file: PathBuf, bytes: u64) -> Self {
        Self {
            source,
            file,
            bytes,
        }
    }
}

impl<T> Downloader<T>
where
    T: PageFetcher,
{
    /// Writes into `path`, creating it if needed.
    pub fn with_fetcher(path: impl AsRef<Path>, fetcher: T) -> Result<Self, DownloadError> {
        let path = path.as_ref();

        let path = Self::create_path(path).map_err(|source| DownloadError::Directory {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Downloader { path, fetcher })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Streams `entry` to disk, replacing any earlier copy.
    ///
    /// The body goes to a temporary file next to the destination and is only
    /// moved into place once every declared byte has arrived, so a failed
    /// transfer never leaves a partial wallpaper behind.
    pub fn download(&self, entry: &WallpaperEntry) -> Result<Download, DownloadError> {
        let url = entry.url();

        let response = self.fetcher.get(url)?;
        let expected = response.content_length();

        let mut builder = tempfile::Builder::new();
        builder.prefix(".gw2walls-").suffix(".part");

        // Temporary files are created 0600, saved wallpapers get the usual mode.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(FILE_MODE));
        }

        let mut temp = builder
            .tempfile_in(&self.path)
            .map_err(|source| DownloadError::Io {
                path: self.path.clone(),
                source,
            })?;

        let temp_path = temp.path().to_path_buf();

        let (bytes, head) = Self::stream(url, response.into_body(), temp.as_file_mut(), &temp_path)?;

        if let Some(expected) = expected {
            if bytes != expected {
                return Err(DownloadError::Incomplete {
                    url: url.to_string(),
                    expected,
                    received: bytes,
                });
            }
        }

        temp.as_file_mut()
            .sync_all()
            .map_err(|source| DownloadError::Io {
                path: temp_path.clone(),
                source,
            })?;

        let extension = url_extension(url).unwrap_or_else(|| sniff_extension(&head).to_string());
        let file = self.path.join(file_name(entry, &extension));

        if file.exists() {
            debug!("overwriting {}", file.display());
        }

        temp.persist(&file).map_err(|err| DownloadError::Io {
            path: file.clone(),
            source: err.error,
        })?;

        info!("wrote {} ({bytes} bytes)", file.display());

        Ok(Download::new(url.clone(), file, bytes))
    }

    /// Copies `body` into `out` chunk by chunk, returning the byte count and
    /// the first few bytes.
    fn stream(
        url: &Url,
        mut body: impl Read,
        out: &mut impl Write,
        out_path: &Path,
    ) -> Result<(u64, Vec<u8>), DownloadError> {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut head = Vec::with_capacity(SNIFF_LEN);
        let mut received = 0u64;

        loop {
            let read = match body.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(DownloadError::Transfer {
                        url: url.to_string(),
                        received,
                        source,
                    })
                }
            };

            out.write_all(&buffer[..read])
                .map_err(|source| DownloadError::Io {
                    path: out_path.to_path_buf(),
                    source,
                })?;

            if head.len() < SNIFF_LEN {
                let take = (SNIFF_LEN - head.len()).min(read);
                head.extend_from_slice(&buffer[..take]);
            }

            received += read as u64;
        }

        Ok((received, head))
    }

    fn create_path(path: &Path) -> io::Result<PathBuf> {
        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()?.join(path)
        };

        if !absolute_path.exists() {
            fs::create_dir_all(&absolute_path)?;
            info!("created {}", absolute_path.display());
        }

        Ok(absolute_path)
    }
}

impl Downloader<UReqFetcher> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DownloadError> {
        Downloader::with_fetcher(path, UReqFetcher::default())
    }
}
