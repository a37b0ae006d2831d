// src/crawl/fetch.rs
// =============================================================================
// This module fetches pages over HTTP.
//
// The crawler only needs one thing from the network: "GET this URL, give me
// the final status code and the body". That contract is the `Fetcher` trait,
// so tests can swap in an in-memory site and the server can share one
// connection-pooled reqwest client between requests.
//
// Redirects follow reqwest's default policy; only the final response counts.
//
// Rust concepts:
// - async-trait: async methods in a trait used as `dyn Fetcher`
// - thiserror: an error enum with Display and source() derived
// - From: lets `?` turn a reqwest::Error into a FetchError
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Per-request timeout used when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched page: final status code and, for 2xx responses, the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures. The crawler records their message per page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("too many redirects: {0}")]
    Redirect(#[source] reqwest::Error),

    #[error("{0}")]
    Request(#[source] reqwest::Error),
}

// Sorts reqwest errors into the cases worth telling apart in the error map
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(error)
        } else if error.is_redirect() {
            FetchError::Redirect(error)
        } else if error.is_connect() {
            FetchError::Connect(error)
        } else {
            FetchError::Request(error)
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// `Fetcher` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        // Error pages are never parsed, so don't download them
        if !status.is_success() {
            return Ok(Page {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = response.text().await?;
        Ok(Page {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();

        assert!(page.is_success());
        assert_eq!(page.body, "<a href=\"/x\">x</a>");
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();

        assert_eq!(page.status, 404);
        assert!(!page.is_success());
        assert!(page.body.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "moved");
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Take a free port from the OS, then close it again
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Connect(_)));
    }
}
