//! HTTP control plane: three JSON endpoints over the crawler.
//!
//! `POST /api/domains` registers a seed for crawling, `GET
//! /api/domains/{domain}` returns the finished tree, and `GET
//! /api/domains/{domain}/status` reports crawl progress. The `{domain}`
//! path parameter is the fully URL-encoded seed; it is decoded and then
//! parsed-and-restringified so it matches the canonical registration key.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;
use url::Url;

use crate::crawler::Crawler;
use crate::worker::WorkerStatus;

/// Builds the control-plane router over a shared crawler.
pub fn router(crawler: Arc<Crawler>) -> Router {
    Router::new()
        .route("/api/domains", post(create_domain))
        .route("/api/domains/{domain}", get(get_domain))
        .route("/api/domains/{domain}/status", get(get_domain_status))
        .with_state(crawler)
}

/// Request and response body for domain registration and status.
#[derive(Debug, Serialize, Deserialize)]
pub struct Domain {
    pub domain: String,
    #[serde(default, skip_serializing_if = "depth_is_unset")]
    pub depth: usize,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkerStatus>,
}

fn depth_is_unset(depth: &usize) -> bool {
    *depth == 0
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Whether the request advertises an `application/json` body.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .map(|media_type| {
            media_type.type_() == mime::APPLICATION && media_type.subtype() == mime::JSON
        })
        .unwrap_or(false)
}

/// The registration key for a decoded path parameter: the canonical string
/// form the seed was stored under.
fn registry_key(domain: &str) -> String {
    Url::parse(domain)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| domain.to_string())
}

/// `POST /api/domains` with `{"domain": "<url>", "depth": <int?>}`.
///
/// Answers 415 unless the content type is `application/json`, 400 when the
/// body does not parse or registration fails, and 202 with the accepted
/// domain otherwise.
async fn create_domain(
    State(crawler): State<Arc<Crawler>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !has_json_content_type(&headers) {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let mut domain: Domain = match serde_json::from_slice(&body) {
        Ok(domain) => domain,
        Err(e) => {
            error!("failed to unmarshal domain: {e}");
            return bad_request(e.to_string());
        }
    };

    if let Err(e) = crawler.crawl(&domain.domain, domain.depth).await {
        error!("cannot initialise crawler; error: {e}");
        return bad_request(e.to_string());
    }

    domain.status = Some(WorkerStatus::Initialised);
    (StatusCode::ACCEPTED, Json(domain)).into_response()
}

/// `GET /api/domains/{domain}`: the crawl tree as a single-element array.
///
/// Answers 404 for an unknown domain and 204 while the crawl has not yet
/// completed.
async fn get_domain(
    State(crawler): State<Arc<Crawler>>,
    Path(domain): Path<String>,
) -> Response {
    let Some(worker) = crawler.worker(&registry_key(&domain)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if worker.status() != WorkerStatus::Complete {
        return StatusCode::NO_CONTENT.into_response();
    }

    let tree = worker.tree_json().unwrap_or(serde_json::Value::Null);
    (StatusCode::OK, Json(vec![tree])).into_response()
}

/// `GET /api/domains/{domain}/status`: registration status and effective
/// depth.
async fn get_domain_status(
    State(crawler): State<Arc<Crawler>>,
    Path(domain): Path<String>,
) -> Response {
    let Some(worker) = crawler.worker(&registry_key(&domain)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let status = Domain {
        domain,
        depth: worker.crawl_depth(),
        status: Some(worker.status()),
    };
    (StatusCode::OK, Json(status)).into_response()
}
