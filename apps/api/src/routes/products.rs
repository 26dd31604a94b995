//! Catalog reads.
//!
//! The transaction core does not own the catalog; these routes expose the
//! read contract only (no price or metadata mutation).

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use gearbox_checkout::Catalog;

use crate::dto::ProductQuery;
use crate::error::checkout_error_response;
use crate::state::AppState;

pub fn router() -> Router {
    Router::new().route("/products", get(list_products))
}

/// `GET /products?active_only=true`
pub async fn list_products(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> axum::response::Response {
    let result = if query.active_only {
        state.catalog.active_products().await
    } else {
        state.catalog.all_products().await.map_err(Into::into)
    };

    match result {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(err) => checkout_error_response(&err),
    }
}
