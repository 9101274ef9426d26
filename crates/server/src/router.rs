//! HTTP router construction.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with request tracing and a per-request
/// timeout that answers `408 Request Timeout`.
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/notice", get(api::list_notices).post(api::create_notice))
        .route("/notice/notification", post(api::send_notification))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}
