// src/client.rs
// =============================================================================
// Client side of the crawl service, plus the terminal rendering shared with
// the `local` subcommand.
//
// What happens here:
// 1. POST {"url": ...} to <server>/api/v1/crawl/
// 2. Map the HTTP status to an outcome (success / partial / failure / other)
// 3. Print the sitemap as an indented tree on stdout, errors on stderr
// 4. Return the process exit code for that outcome
//
// Rust concepts:
// - match on StatusCode constants: each status class is its own arm
// - Recursion with a borrowed stack (`branch`) to detect cycles
// - anyhow::Context: attach a readable message to lower-level errors
// =============================================================================

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;

use crate::crawl::{parse_normalized, CrawlOutcome, CrawlStatus, ErrorMap, Sitemap};

/// What a crawl request amounted to, from the caller's point of view.
/// Each variant maps to its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The whole crawl failed, or the service rejected the URL
    Failure,
    Partial,
    /// Anything unexpected (server down, unknown status, bad body)
    Other,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
            Outcome::Partial => 2,
            Outcome::Other => 3,
        }
    }
}

impl From<CrawlStatus> for Outcome {
    fn from(status: CrawlStatus) -> Self {
        match status {
            CrawlStatus::Success => Outcome::Success,
            CrawlStatus::PartialSuccess => Outcome::Partial,
            CrawlStatus::Failure => Outcome::Failure,
        }
    }
}

// Body of a 207 or 400 answer; 400s carry no sitemap
#[derive(Debug, Deserialize)]
struct ReportBody {
    #[serde(default)]
    sitemap: Sitemap,
    #[serde(default)]
    errors: ErrorMap,
}

/// Asks the service at `server` to crawl `url` and prints the result.
///
/// Returns the outcome; transport problems talking to the service are errors.
pub async fn crawl_remote(server: &str, url: &str, json_output: bool) -> Result<Outcome> {
    let endpoint = format!("{}/api/v1/crawl/", server.trim_end_matches('/'));
    tracing::debug!("POST {} for {}", endpoint, url);

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({ "url": url }))
        .send()
        .await
        .with_context(|| format!("Could not reach the crawl service at {}", endpoint))?;

    let status = response.status();
    let body = response.text().await.context("Failed to read the service response")?;

    if json_output {
        println!("{}", body);
    }

    let root = tree_root(url);
    let outcome = match status {
        StatusCode::OK => {
            let sitemap: Sitemap =
                serde_json::from_str(&body).context("Service returned an invalid sitemap")?;
            if !json_output {
                print!("{}", render_sitemap(&sitemap, &root));
            }
            Outcome::Success
        }
        StatusCode::MULTI_STATUS => {
            let report: ReportBody =
                serde_json::from_str(&body).context("Service returned an invalid report")?;
            if !json_output {
                print!("{}", render_sitemap(&report.sitemap, &root));
                print_errors(&report.errors);
            }
            Outcome::Partial
        }
        StatusCode::BAD_REQUEST => {
            let report: ReportBody =
                serde_json::from_str(&body).context("Service returned an invalid report")?;
            if !json_output {
                print_errors(&report.errors);
            }
            Outcome::Failure
        }
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::NOT_FOUND => {
            eprintln!("Error in the URL: {}", url);
            Outcome::Failure
        }
        other => {
            tracing::warn!("Unexpected status {} from the crawl service", other);
            eprintln!("Something went wrong, check the server/client logs");
            Outcome::Other
        }
    };

    Ok(outcome)
}

/// Prints a crawl done in this process, the same way `crawl_remote` does.
pub fn report_local(url: &str, outcome: &CrawlOutcome, json_output: bool) -> Result<Outcome> {
    let status = Outcome::from(outcome.status());

    if json_output {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(status);
    }

    if !outcome.sitemap.is_empty() {
        print!("{}", render_sitemap(&outcome.sitemap, &tree_root(url)));
    }
    print_errors(&outcome.errors);
    if outcome.truncated {
        eprintln!("(crawl stopped early: page or time budget reached)");
    }
    Ok(status)
}

// The service keys the sitemap by the normalized seed
fn tree_root(url: &str) -> String {
    parse_normalized(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

fn print_errors(errors: &ErrorMap) {
    if errors.is_empty() {
        return;
    }
    eprintln!("----- ERROR ------");
    for (url, reason) in errors {
        eprintln!("{} caused due to {}", url, reason);
    }
}

/// Renders a sitemap as a tree rooted at `root`, two spaces per level.
///
/// A page that already appears higher up on the same branch is printed but
/// not expanded again, so cycles terminate.
pub fn render_sitemap(sitemap: &Sitemap, root: &str) -> String {
    let mut out = String::new();
    let mut branch = Vec::new();
    render_node(sitemap, root, 0, &mut branch, &mut out);
    out
}

fn render_node<'a>(
    sitemap: &'a Sitemap,
    page: &'a str,
    depth: usize,
    branch: &mut Vec<&'a str>,
    out: &mut String,
) {
    // Writing to a String can't fail
    let _ = writeln!(out, "{}{}", " ".repeat(depth * 2), page);

    if branch.contains(&page) {
        return;
    }
    let Some(links) = sitemap.get(page) else {
        return;
    };

    branch.push(page);
    for link in links {
        render_node(sitemap, link, depth + 1, branch, out);
    }
    branch.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // A crawl service that answers every crawl request with `response`
    async fn service(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/crawl/"))
            .and(body_json(json!({ "url": "https://foo.com/" })))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    async fn remote_outcome(response: ResponseTemplate) -> Result<Outcome> {
        let server = service(response).await;
        crawl_remote(&server.uri(), "https://foo.com/", false).await
    }

    fn sitemap(entries: &[(&str, &[&str])]) -> Sitemap {
        entries
            .iter()
            .map(|(page, links)| {
                (
                    page.to_string(),
                    links.iter().map(|link| link.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_render_tree() {
        let map = sitemap(&[
            ("https://foo.com/", &["https://foo.com/a", "https://foo.com/b"]),
            ("https://foo.com/a", &["https://foo.com/a/1"]),
        ]);

        assert_eq!(
            render_sitemap(&map, "https://foo.com/"),
            "https://foo.com/\n  https://foo.com/a\n    https://foo.com/a/1\n  https://foo.com/b\n"
        );
    }

    #[test]
    fn test_render_cycle_terminates() {
        let map = sitemap(&[
            ("https://foo.com/a", &["https://foo.com/b"]),
            ("https://foo.com/b", &["https://foo.com/a"]),
        ]);

        assert_eq!(
            render_sitemap(&map, "https://foo.com/a"),
            "https://foo.com/a\n  https://foo.com/b\n    https://foo.com/a\n"
        );
    }

    #[test]
    fn test_render_missing_root() {
        assert_eq!(render_sitemap(&Sitemap::new(), "https://foo.com/"), "https://foo.com/\n");
    }

    #[test]
    fn test_tree_root_is_normalized() {
        assert_eq!(tree_root("https://foo.com"), "https://foo.com/");
        assert_eq!(tree_root("https://foo.com/a?b=c"), "https://foo.com/a");
        assert_eq!(tree_root("garbage"), "garbage");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            Outcome::Success.exit_code(),
            Outcome::Failure.exit_code(),
            Outcome::Partial.exit_code(),
            Outcome::Other.exit_code(),
        ];
        assert_eq!(codes, [0, 1, 2, 3]);
        assert_eq!(Outcome::from(CrawlStatus::PartialSuccess), Outcome::Partial);
    }

    #[test]
    fn test_report_body_without_sitemap() {
        let body: ReportBody =
            serde_json::from_str(r#"{"status":"failure","errors":{"https://foo.com/":"x"}}"#)
                .unwrap();
        assert!(body.sitemap.is_empty());
        assert_eq!(body.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_success() {
        let response = ResponseTemplate::new(200).set_body_json(json!({
            "https://foo.com/": ["https://foo.com/a"],
            "https://foo.com/a": [],
        }));
        let outcome = remote_outcome(response).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_remote_partial_success() {
        let response = ResponseTemplate::new(207).set_body_json(json!({
            "status": "partial_success",
            "sitemap": { "https://foo.com/": ["https://foo.com/gone"] },
            "errors": { "https://foo.com/gone": "Failed with status code 404" },
        }));
        let outcome = remote_outcome(response).await.unwrap();

        assert_eq!(outcome, Outcome::Partial);
        assert_eq!(outcome.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let response = ResponseTemplate::new(400).set_body_json(json!({
            "status": "failure",
            "errors": { "https://foo.com/": "Failed with status code 500" },
        }));
        let outcome = remote_outcome(response).await.unwrap();

        assert_eq!(outcome, Outcome::Failure);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_remote_rejected_url() {
        let response = ResponseTemplate::new(422).set_body_json(json!({
            "status": "invalid_request",
            "detail": "url must start with http:// or https://",
        }));
        let outcome = remote_outcome(response).await.unwrap();

        assert_eq!(outcome, Outcome::Failure);
    }

    #[tokio::test]
    async fn test_remote_not_found_is_a_url_error() {
        let outcome = remote_outcome(ResponseTemplate::new(404)).await.unwrap();
        assert_eq!(outcome, Outcome::Failure);
    }

    #[tokio::test]
    async fn test_remote_unexpected_status() {
        let response = ResponseTemplate::new(500).set_body_string("boom");
        let outcome = remote_outcome(response).await.unwrap();

        assert_eq!(outcome, Outcome::Other);
        assert_eq!(outcome.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_remote_invalid_sitemap_is_an_error() {
        let response = ResponseTemplate::new(200).set_body_string("<html>not json</html>");
        let err = remote_outcome(response).await.unwrap_err();

        assert!(err.to_string().contains("invalid sitemap"));
    }

    #[tokio::test]
    async fn test_remote_invalid_report_is_an_error() {
        let response = ResponseTemplate::new(207).set_body_string("{\"sitemap\": 3}");
        let err = remote_outcome(response).await.unwrap_err();

        assert!(err.to_string().contains("invalid report"));
    }

    #[tokio::test]
    async fn test_remote_trailing_slash_on_server() {
        let server = service(ResponseTemplate::new(200).set_body_json(json!({}))).await;
        let base = format!("{}/", server.uri());

        let outcome = crawl_remote(&base, "https://foo.com/", true).await.unwrap();

        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let server = format!("http://127.0.0.1:{}", port);

        let result = crawl_remote(&server, "https://foo.com/", false).await;

        assert!(result.is_err());
    }
}
