//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// `GET /health` — 200 when the database answers, 503 otherwise.
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> axum::response::Response {
    if state.store.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
            .into_response()
    }
}
