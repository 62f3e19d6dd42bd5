use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};

use url::Url;

use super::{PageFetcher, Response};
use crate::error::FetchError;

#[derive(Debug, Clone)]
pub enum MockResponse {
    Ok(Vec<u8>),
    Status(u16),
    NetworkError,
    /// Declares `declared` bytes, sends `body`, then the connection drops.
    Interrupted { body: Vec<u8>, declared: u64 },
    /// Declares `declared` bytes but the body ends cleanly after `body`.
    Truncated { body: Vec<u8>, declared: u64 },
}

impl MockResponse {
    pub fn html(html: &str) -> Self {
        Self::Ok(html.as_bytes().to_vec())
    }
}

/// Serves canned responses by URL and remembers every request made.
pub struct MockFetcher {
    routes: HashMap<String, MockResponse>,
    requests: RefCell<Vec<String>>,
}

impl PageFetcher for MockFetcher {
    fn get(&self, url: &Url) -> Result<Response, FetchError> {
        self.requests.borrow_mut().push(url.to_string());

        let Some(response) = self.routes.get(url.as_str()) else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        };

        match response.clone() {
            MockResponse::Ok(body) => Ok(Response::new(
                url.clone(),
                Some(body.len() as u64),
                Box::new(Cursor::new(body)),
            )),

            MockResponse::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),

            MockResponse::NetworkError => Err(FetchError::Transport {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),

            MockResponse::Interrupted { body, declared } => Ok(Response::new(
                url.clone(),
                Some(declared),
                Box::new(BrokenReader {
                    data: Cursor::new(body),
                }),
            )),

            MockResponse::Truncated { body, declared } => Ok(Response::new(
                url.clone(),
                Some(declared),
                Box::new(Cursor::new(body)),
            )),
        }
    }
}

impl MockFetcher {
    pub fn new<S: Into<String>>(routes: Vec<(S, MockResponse)>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(url, response)| (normalize(url.into()), response))
                .collect(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        let url = normalize(url.to_string());

        self.requests
            .borrow()
            .iter()
            .filter(|requested| **requested == url)
            .count()
    }
}

// Route keys go through `Url` so they compare equal to what the crawler requests.
fn normalize(url: String) -> String {
    Url::parse(&url).map(String::from).unwrap_or(url)
}

struct BrokenReader {
    data: Cursor<Vec<u8>>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            n => Ok(n),
        }
    }
}
