//! HTTP routes, one module per domain area:
//! - `sales`: create, refund, read sales
//! - `products`: catalog reads
//! - `system`: health

use axum::Router;

pub mod products;
pub mod sales;
pub mod system;

/// Builds the full route table.
pub fn router() -> Router {
    Router::new()
        .merge(sales::router())
        .merge(products::router())
        .merge(system::router())
}
