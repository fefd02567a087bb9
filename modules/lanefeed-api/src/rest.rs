use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::{error, info};

use crate::AppState;

// --- Public feed ---

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// Aggregated feed, newest first. The common case is a pure cache read;
/// `?refresh=true` forces a refetch from all platforms.
pub async fn api_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    let posts = state.aggregator.fetch_all_posts(query.refresh).await;
    Json(posts)
}

// --- Admin control surface ---

pub async fn feed_refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }

    if state.aggregator.platform_count() == 0 {
        return (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "Feed is disabled or no platforms are configured",
                "count": 0,
            })),
        )
            .into_response();
    }

    let posts = state.aggregator.fetch_all_posts(true).await;
    info!(count = posts.len(), "Admin-triggered feed refresh");
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": format!("Feed refreshed: {} posts cached", posts.len()),
            "count": posts.len(),
        })),
    )
        .into_response()
}

pub async fn feed_clear_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }

    match state.aggregator.clear_cache().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "Feed cache cleared"})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to clear feed cache");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"status": "Failed to clear feed cache"})),
            )
                .into_response()
        }
    }
}

pub async fn feed_stats_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Some(denied) = require_admin(&state, &headers) {
        return denied;
    }

    let stats = state.aggregator.cache_stats().await;
    Json(stats).into_response()
}

// --- Basic auth ---

fn require_admin(state: &AppState, headers: &axum::http::HeaderMap) -> Option<axum::response::Response> {
    if check_admin_auth(headers, &state.config.admin_username, &state.config.admin_password) {
        None
    } else {
        Some(
            axum::response::Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header(header::WWW_AUTHENTICATE, "Basic realm=\"admin\"")
                .body(axum::body::Body::from("Unauthorized"))
                .unwrap()
                .into_response(),
        )
    }
}

fn check_admin_auth(headers: &axum::http::HeaderMap, username: &str, password: &str) -> bool {
    use base64::Engine;

    let Some(auth) = headers.get(header::AUTHORIZATION) else {
        return false;
    };
    let Ok(auth_str) = auth.to_str() else {
        return false;
    };
    if !auth_str.starts_with("Basic ") {
        return false;
    }

    let encoded = &auth_str[6..];
    let decoded_bytes = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(b) => b,
        Err(_) => return false,
    };
    let decoded = match String::from_utf8(decoded_bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };

    let expected = format!("{username}:{password}");
    constant_time_eq(decoded.as_bytes(), expected.as_bytes())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
