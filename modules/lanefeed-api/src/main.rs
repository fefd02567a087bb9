use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lanefeed_common::Config;
use lanefeed_feed::FeedAggregator;
use lanefeed_store::FeedStore;

mod rest;

pub struct AppState {
    pub aggregator: FeedAggregator,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lanefeed=info".parse()?))
        .init();

    let config = Config::from_env();

    let store = FeedStore::open(&config.database_url).await?;
    let aggregator = FeedAggregator::from_config(&config, store);
    info!(
        platforms = aggregator.platform_count(),
        ttl_minutes = config.cache_ttl_minutes,
        "Feed aggregator ready"
    );

    let host = config.api_host.clone();
    let port = config.api_port;
    let refresh_interval = config.refresh_interval_minutes;

    let state = Arc::new(AppState { aggregator, config });

    if let Some(minutes) = refresh_interval {
        start_refresh_interval(state.clone(), minutes);
    }

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Public feed
        .route("/api/feed", get(rest::api_feed))
        // Admin control surface
        .route("/admin/feed/refresh", post(rest::feed_refresh_handler))
        .route("/admin/feed/clear", post(rest::feed_clear_handler))
        .route("/admin/feed/stats", get(rest::feed_stats_handler))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // The feed endpoint manages its own freshness; downstream caches must
        // not hold onto responses.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{host}:{port}");
    info!("LaneFeed API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Background warm-refresh loop: forces a feed refresh at a fixed interval so
/// interactive reads rarely pay the upstream fetch cost.
fn start_refresh_interval(state: Arc<AppState>, interval_minutes: u64) {
    info!(interval_minutes, "Starting background feed refresh loop");

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(interval_minutes * 60)).await;
            let posts = state.aggregator.fetch_all_posts(true).await;
            info!(count = posts.len(), "Background feed refresh complete");
        }
    });
}
