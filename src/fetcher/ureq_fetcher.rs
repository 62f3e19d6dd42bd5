use std::time::Duration;

use ureq::Error::{Status, Transport};
use url::Url;

use super::{PageFetcher, Response};
use crate::error::FetchError;

pub const DEFAULT_USER_AGENT: &str = concat!("gw2walls/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct UReqFetcher {
    agent: ureq::Agent,
}

impl PageFetcher for UReqFetcher {
    fn get(&self, url: &Url) -> Result<Response, FetchError> {
        tracing::debug!("GET {url}");

        let response = self.agent.get(url.as_str()).call();

        match response {
            Ok(response) => {
                // An encoded body is decoded by the agent, so the declared
                // length no longer matches what gets read.
                let content_length = match response.header("Content-Encoding") {
                    Some(_) => None,
                    None => response
                        .header("Content-Length")
                        .and_then(|len| len.trim().parse::<u64>().ok()),
                };

                // Redirects are followed by the agent, keep the address we ended up at.
                let final_url = Url::parse(response.get_url()).unwrap_or_else(|_| url.clone());

                tracing::debug!(
                    "{final_url} answered {} ({} bytes declared)",
                    response.status(),
                    content_length.map_or_else(|| "no".to_string(), |len| len.to_string())
                );

                Ok(Response::new(
                    final_url,
                    content_length,
                    Box::new(response.into_reader()),
                ))
            }

            Err(Status(status, _)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),

            Err(Transport(transport)) => Err(FetchError::Transport {
                url: url.to_string(),
                reason: transport.to_string(),
            }),
        }
    }
}

impl UReqFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build();

        UReqFetcher { agent }
    }
}

impl Default for UReqFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    /// `<p>hello</p>` gzipped.
    const GZIPPED: [u8; 32] = [
        0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xb3, 0x29, 0xb0, 0xcb, 0x48,
        0xcd, 0xc9, 0xc9, 0xb7, 0xd1, 0x2f, 0xb0, 0x03, 0x00, 0x44, 0xfb, 0xae, 0xd2, 0x0c, 0x00,
        0x00, 0x00,
    ];

    /// Answers a single request with `head` followed by `body`, after waiting `stall`.
    fn serve_once(head: String, body: Vec<u8>, stall: Duration) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };

            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut buffer) {
                    Ok(0) | Err(_) => return,
                    Ok(read) => request.extend_from_slice(&buffer[..read]),
                }
            }

            thread::sleep(stall);

            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        });

        url(addr)
    }

    fn respond(status: &str, headers: &[&str], body: &[u8]) -> Url {
        let mut head = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
        for header in headers {
            head.push_str(header);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        serve_once(head, body.to_vec(), Duration::ZERO)
    }

    fn url(addr: SocketAddr) -> Url {
        Url::parse(&format!("http://{addr}/en/media/wallpapers/")).unwrap()
    }

    fn fetcher() -> UReqFetcher {
        UReqFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5))
    }

    #[test]
    fn should_stream_body_with_declared_length() {
        let url = respond("200 OK", &["Content-Length: 12"], b"<p>hello</p>");

        let response = fetcher().get(&url).unwrap();

        assert_eq!(response.content_length(), Some(12));
        assert_eq!(response.url(), &url);
        assert_eq!(response.into_text().unwrap(), "<p>hello</p>");
    }

    #[test]
    fn should_not_trust_length_of_encoded_body() {
        let url = respond(
            "200 OK",
            &["Content-Encoding: gzip", "Content-Length: 32"],
            &GZIPPED,
        );

        let response = fetcher().get(&url).unwrap();

        assert_eq!(response.content_length(), None);
        assert_eq!(response.into_text().unwrap(), "<p>hello</p>");
    }

    #[test]
    fn should_map_not_found_to_status() {
        let url = respond("404 Not Found", &["Content-Length: 0"], b"");

        let err = fetcher().get(&url).unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn should_map_unavailable_to_retryable_status() {
        let url = respond("503 Service Unavailable", &["Content-Length: 0"], b"");

        let err = fetcher().fetch(&url).unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn should_map_refused_connection_to_transport() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let err = fetcher().get(&url(addr)).unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn should_give_up_on_stalled_server() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n".to_string(),
            b"ok".to_vec(),
            Duration::from_secs(3),
        );

        let fetcher = UReqFetcher::new(DEFAULT_USER_AGENT, Duration::from_millis(200));

        let err = fetcher.get(&url).unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
