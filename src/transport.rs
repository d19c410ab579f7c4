use std::{error::Error as _, fmt, time::Duration};

use reqwest::{Client, StatusCode, Url};
use tracing::{instrument, trace, warn};

use crate::config::ProbeMethod;

/// Why a request never produced an HTTP status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The URL (or another request argument) was rejected before anything was sent
    #[error("Value Error: {0}")]
    InvalidUrl(String),
    /// DNS, TLS, refused connection and friends
    #[error("URL Error: {0}")]
    Network(String),
    #[error("URL Error: timed out after {0:?}")]
    Timeout(Duration),
}

/// Outcome of exactly one HTTP attempt
#[derive(Debug)]
pub enum Fetched {
    Response {
        status: StatusCode,
        /// Only populated when the body was asked for, regardless of the status. Also `None` when
        /// the body could not be read after the status arrived
        body: Option<String>,
    },
    /// No status could be obtained
    Unreachable(FetchError),
}

impl Fetched {
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Unreachable(_) => None,
        }
    }

    /// Any 2xx status
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().is_some_and(|s| s.is_success())
    }

    /// Exactly `200 OK`, which is what a live stream answers
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status() == Some(StatusCode::OK)
    }

    /// Human readable reason, suitable for surfacing in logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Response { status, .. } => format!("HTTP Error: {status}"),
            Self::Unreachable(e) => e.to_string(),
        }
    }

    #[must_use]
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Response { body, .. } => body,
            Self::Unreachable(_) => None,
        }
    }
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Single-attempt HTTP access shared by every pipeline stage
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    timeout: Duration,
    probe_method: ProbeMethod,
}

impl Transport {
    #[must_use]
    pub const fn new(client: Client, timeout: Duration, probe_method: ProbeMethod) -> Self {
        Self {
            client,
            timeout,
            probe_method,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs one GET against `url`. Never retries and never errors out, failures are
    /// reported as [`Fetched::Unreachable`]
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str, want_body: bool) -> Fetched {
        self.send(ProbeMethod::Get, url, want_body).await
    }

    /// Checks a stream candidate without reading its body
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> Fetched {
        self.send(self.probe_method, url, false).await
    }

    async fn send(&self, method: ProbeMethod, url: &str, want_body: bool) -> Fetched {
        let url = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => return Fetched::Unreachable(FetchError::InvalidUrl(format!("{e}: {url}"))),
        };

        let req = match method {
            ProbeMethod::Get => self.client.get(url),
            ProbeMethod::Head => self.client.head(url),
        };

        let res = match req.timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) => return Fetched::Unreachable(self.classify(&e)),
        };

        let status = res.status();
        trace!("Got status {status}");
        if !want_body {
            return Fetched::Response { status, body: None };
        }

        let body = match res.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Got status {status} but could not read the body: {}", error_chain(&e));
                None
            }
        };
        Fetched::Response { status, body }
    }

    fn classify(&self, e: &reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if e.is_builder() {
            FetchError::InvalidUrl(error_chain(e))
        } else {
            FetchError::Network(error_chain(e))
        }
    }
}

/// reqwest keeps the interesting part (refused, DNS failure...) in the source chain
fn error_chain(e: &reqwest::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    fn transport(timeout: Duration, probe_method: ProbeMethod) -> Transport {
        Transport::new(Client::new(), timeout, probe_method)
    }

    #[tokio::test]
    async fn returns_body_when_asked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = transport(Duration::from_secs(5), ProbeMethod::Get)
            .fetch(&format!("{}/page", server.uri()), true)
            .await;

        assert!(fetched.is_ok());
        assert_eq!(fetched.into_body().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn keeps_status_and_body_of_error_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let fetched = transport(Duration::from_secs(5), ProbeMethod::Get)
            .fetch(&server.uri(), true)
            .await;

        assert_eq!(fetched.status(), Some(StatusCode::NOT_FOUND));
        assert!(!fetched.is_success());
        assert_eq!(fetched.describe(), "HTTP Error: 404 Not Found");
        assert_eq!(fetched.into_body().as_deref(), Some("gone"));
    }

    #[tokio::test]
    async fn skips_body_when_not_wanted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("audio bytes"))
            .mount(&server)
            .await;

        let fetched = transport(Duration::from_secs(5), ProbeMethod::Get)
            .fetch(&server.uri(), false)
            .await;

        assert!(fetched.is_ok());
        assert_eq!(fetched.into_body(), None);
    }

    #[tokio::test]
    async fn probe_uses_configured_method() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = transport(Duration::from_secs(5), ProbeMethod::Head)
            .probe(&format!("{}/stream", server.uri()))
            .await;

        assert!(fetched.is_ok());
    }

    #[tokio::test]
    async fn malformed_url_is_a_value_error() {
        let fetched = transport(Duration::from_secs(5), ProbeMethod::Get)
            .fetch("definitely not a url", true)
            .await;

        assert_eq!(fetched.status(), None);
        assert!(matches!(
            fetched,
            Fetched::Unreachable(FetchError::InvalidUrl(_))
        ));
        assert!(fetched.describe().starts_with("Value Error:"));
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Grab a free port, then close it so nothing listens there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let fetched = transport(Duration::from_secs(5), ProbeMethod::Get)
            .fetch(&format!("http://127.0.0.1:{port}/"), true)
            .await;

        assert!(matches!(fetched, Fetched::Unreachable(FetchError::Network(_))));
        assert!(fetched.describe().starts_with("URL Error:"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetched = transport(Duration::from_millis(100), ProbeMethod::Get)
            .fetch(&server.uri(), true)
            .await;

        assert!(matches!(
            fetched,
            Fetched::Unreachable(FetchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn truncated_body_keeps_the_status() {
        // Announces more bytes than it sends, then hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nshort")
                .await
                .ok();
        });

        let fetched = transport(Duration::from_secs(5), ProbeMethod::Get)
            .fetch(&format!("http://{addr}/"), true)
            .await;

        assert_eq!(fetched.status(), Some(StatusCode::OK));
        assert_eq!(fetched.into_body(), None);
    }
}
