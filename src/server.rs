use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router`: metrics reads, feed lifecycle, and an
/// optional static directory for the dashboard page.
pub fn create_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/view", get(stream::get_view))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        // ── Feed lifecycle (view shown / dismissed) ─────────────
        .route("/api/feed/start", post(handlers::feed::start_feed))
        .route("/api/feed/stop", post(handlers::feed::stop_feed))
        .route("/api/feed/status", get(handlers::feed::feed_status))
        // ── Provide shared state to all routes above ────────────
        .with_state(state);

    // ── Serve the dashboard directory if one was given ──────────
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    // ── Global middleware (applied bottom-up) ───────────────────
    router
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
