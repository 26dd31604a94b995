//! Request DTOs and JSON mapping helpers.
//!
//! Responses serialize the domain types directly (they carry stable
//! snake_case serde forms); only requests need dedicated shapes here.

use serde::Deserialize;

use gearbox_core::AggregateDiscount;

/// Body of `POST /sales`.
///
/// ```json
/// {
///   "customer_ref": "walk-in",
///   "lines": [ { "sku": "BRK-001", "qty": 3 } ],
///   "discount": { "kind": "fixed", "value": 1000 },
///   "payment_method": "cash",
///   "notes": "counter 2"
/// }
/// ```
///
/// Discount units follow the discount kind: basis points for `percentage`
/// (1500 = 15%), cents for `fixed`.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_ref: Option<String>,
    pub lines: Vec<SaleLineRequest>,
    #[serde(default)]
    pub discount: Option<AggregateDiscount>,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// One requested line: quantity of a sku, with an optional per-line
/// discount in cents (clamped server-side to the line subtotal).
#[derive(Debug, Deserialize)]
pub struct SaleLineRequest {
    pub sku: String,
    pub qty: i64,
    #[serde(default)]
    pub line_discount_cents: i64,
}

/// Query string of `GET /products`.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Defaults to true; pass `active_only=false` for the full catalog.
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}
