//! Retrieving pages and files over HTTP(S).

mod ureq_fetcher;

#[cfg(test)]
mod mock_fetcher;

use std::fmt;
use std::io::Read;

use url::Url;

use crate::error::FetchError;

pub use ureq_fetcher::{UReqFetcher, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

#[cfg(test)]
pub use mock_fetcher::{MockFetcher, MockResponse};

/// A successful response whose body has not been read yet.
pub struct Response {
    url: Url,
    content_length: Option<u64>,
    body: Box<dyn Read + Send>,
}

impl Response {
    pub fn new(url: Url, content_length: Option<u64>, body: Box<dyn Read + Send>) -> Self {
        Self {
            url,
            content_length,
            body,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Length declared by the server, if it sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn into_body(self) -> Box<dyn Read + Send> {
        self.body
    }

    /// Reads the whole body as text. Bytes that aren't UTF-8 become U+FFFD.
    pub fn into_text(mut self) -> Result<String, FetchError> {
        let mut bytes = Vec::new();

        self.body
            .read_to_end(&mut bytes)
            .map_err(|source| FetchError::Body {
                url: self.url.to_string(),
                source,
            })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.url.as_str())
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

pub trait PageFetcher {
    /// Issues a GET and hands back the streaming body.
    fn get(&self, url: &Url) -> Result<Response, FetchError>;

    /// Issues a GET and reads the body as HTML text.
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.get(url)?.into_text()
    }
}

impl<T> PageFetcher for &T
where
    T: PageFetcher + ?Sized,
{
    fn get(&self, url: &Url) -> Result<Response, FetchError> {
        (**self).get(url)
    }

    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_read_pages_that_are_not_utf8() {
        let url = "https://example.com/releases/";

        // "Lion's Arch é" in Latin-1.
        let mut page = b"<h5>Lion's Arch ".to_vec();
        page.push(0xE9);
        page.extend_from_slice(b"</h5>");

        let fetcher = MockFetcher::new(vec![(url, MockResponse::Ok(page))]);

        let text = fetcher.fetch(&Url::parse(url).unwrap()).unwrap();

        assert_eq!(text, "<h5>Lion's Arch \u{FFFD}</h5>");
    }

    #[test]
    fn should_report_body_that_breaks_off() {
        let url = "https://example.com/releases/";

        let fetcher = MockFetcher::new(vec![(
            url,
            MockResponse::Interrupted {
                body: b"<html>".to_vec(),
                declared: 100,
            },
        )]);

        let err = fetcher.fetch(&Url::parse(url).unwrap()).unwrap_err();

        assert!(matches!(err, FetchError::Body { .. }));
    }
}
