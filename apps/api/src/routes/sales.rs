//! Sale routes: the write side of the transaction core, plus reads.
//!
//! `POST /sales` rebuilds a checkout session from the request body (catalog
//! lookups, advisory stock checks, price snapshots), then hands the frozen
//! snapshot to the coordinator. The ledger at finalize time remains the
//! authority; a stale advisory check surfaces as 409 rather than an
//! oversold sale.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use gearbox_checkout::{CartManager, SaleStore};
use gearbox_core::PaymentMethod;

use crate::dto::CreateSaleRequest;
use crate::error::{checkout_error_response, json_error};
use crate::state::AppState;

pub fn router() -> Router {
    Router::new()
        .route("/sales", post(create_sale).get(list_sales))
        .route("/sales/:id", get(get_sale))
        .route("/sales/:id/refund", post(refund_sale))
}

/// `POST /sales` — cart in, finalized sale out.
pub async fn create_sale(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<CreateSaleRequest>,
) -> axum::response::Response {
    let Some(payment_method) = PaymentMethod::parse(&body.payment_method) else {
        return json_error(
            StatusCode::BAD_REQUEST,
            "invalid_payment_method",
            "payment_method must be one of: cash, card, mobile_wallet, bank_transfer",
        );
    };

    let mut session = CartManager::new(state.catalog.clone());
    for line in &body.lines {
        if let Err(err) = session.add_item(&line.sku, line.qty).await {
            return checkout_error_response(&err);
        }
        if line.line_discount_cents != 0 {
            if let Err(err) = session.update_line_discount(&line.sku, line.line_discount_cents) {
                return checkout_error_response(&err);
            }
        }
    }
    if let Some(discount) = body.discount {
        session.set_aggregate_discount(discount);
    }
    session.set_customer_ref(body.customer_ref);
    session.set_notes(body.notes);

    match state
        .coordinator
        .finalize(&session.snapshot(), payment_method)
        .await
    {
        Ok(sale) => {
            info!(sale_id = %sale.id, grand_total = sale.grand_total_cents, "sale created");
            (StatusCode::CREATED, Json(sale)).into_response()
        }
        Err(err) => checkout_error_response(&err),
    }
}

/// `POST /sales/:id/refund` — full reversal, at most once.
pub async fn refund_sale(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match state.refunds.refund(&id).await {
        Ok(sale) => (StatusCode::OK, Json(sale)).into_response(),
        Err(err) => checkout_error_response(&err),
    }
}

/// `GET /sales/:id`
pub async fn get_sale(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match state.sales.fetch(&id).await {
        Ok(Some(sale)) => (StatusCode::OK, Json(sale)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "sale_not_found", format!("sale not found: {id}")),
        Err(err) => checkout_error_response(&err),
    }
}

/// `GET /sales` — newest first.
pub async fn list_sales(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Response {
    match state.sales.list().await {
        Ok(sales) => (StatusCode::OK, Json(sales)).into_response(),
        Err(err) => checkout_error_response(&err),
    }
}
