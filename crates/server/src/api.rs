//! Notice endpoints and error-to-status mapping.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::service::{NoticeSummary, ServiceError};
use crate::state::AppState;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wraps [`ServiceError`] so handlers can return it directly.
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Delivery(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request rejected");
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

// ── Health ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Notices ──────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeView {
    pub id: String,
    pub subject: String,
    pub deadline: NaiveDateTime,
    pub days_left: i64,
}

impl From<NoticeSummary> for NoticeView {
    fn from(summary: NoticeSummary) -> Self {
        Self {
            id: summary.notice.id.to_string(),
            subject: summary.notice.subject,
            deadline: summary.notice.deadline,
            days_left: summary.days_left,
        }
    }
}

/// `POST /notice`: body is decoded by the service so malformed JSON maps
/// to a validation error rather than an extractor rejection.
pub async fn create_notice(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    state.service.create_notice(&body).await?;
    Ok(StatusCode::CREATED)
}

/// `POST /notice/notification`
pub async fn send_notification(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.service.send_notice_notification().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /notice`
pub async fn list_notices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NoticeView>>, ApiError> {
    let notices = state.service.list_notices().await?;
    Ok(Json(notices.into_iter().map(NoticeView::from).collect()))
}
