// src/server/routes.rs
// =============================================================================
// HTTP handlers for the crawl service.
//
// Answers to POST /api/v1/crawl/:
//   200  no page failed          -> the sitemap object itself
//   207  some pages failed       -> {"status": "partial_success", "sitemap", "errors"}
//   400  nothing could be crawled -> {"status": "failure", "errors"}
//   422  url isn't http(s)://... -> {"status": "invalid_request", "detail"}
//
// Rust concepts:
// - Extractors: State(..) and Json(..) pull typed values out of a request
// - IntoResponse: a (StatusCode, Json) tuple is already a response
// =============================================================================

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::crawl::CrawlStatus;

static SEED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("seed pattern is valid"));

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
}

pub async fn crawl_handler(
    State(state): State<AppState>,
    Json(request): Json<CrawlRequest>,
) -> Response {
    if !SEED_PATTERN.is_match(&request.url) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "status": "invalid_request",
                "detail": "url must start with http:// or https://",
            })),
        )
            .into_response();
    }

    let outcome = state.crawler.crawl(&request.url).await;

    // The status field is the CrawlStatus itself, in snake_case
    let status = outcome.status();
    match status {
        CrawlStatus::Success => (StatusCode::OK, Json(outcome.sitemap)).into_response(),
        CrawlStatus::PartialSuccess => (
            StatusCode::MULTI_STATUS,
            Json(json!({
                "status": status,
                "sitemap": outcome.sitemap,
                "errors": outcome.errors,
            })),
        )
            .into_response(),
        CrawlStatus::Failure => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": status,
                "errors": outcome.errors,
            })),
        )
            .into_response(),
    }
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
