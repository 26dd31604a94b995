//! # Error Types
//!
//! Domain error taxonomy for the transaction core.
//!
//! ## Propagation Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Error Propagation                                 │
//! │                                                                         │
//! │  Validation errors (ProductNotFound, InvalidQuantity,                   │
//! │  InvalidDiscount, EmptyCart)                                            │
//! │      └── surfaced immediately, stock ledger never touched               │
//! │                                                                         │
//! │  Stock / persistence errors (InsufficientStock, Persistence)            │
//! │      └── full rollback first, then surfaced — no partial state          │
//! │                                                                         │
//! │  Persistence is the only class that is safe to retry at the caller's    │
//! │  discretion: rollback has already released every reservation.           │
//! │                                                                         │
//! │  Every failure is a typed variant distinguishable from a Sale.          │
//! │  Nothing is swallowed or logged-only.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Checkout Error
// =============================================================================

/// Errors produced by the cart-to-sale pipeline.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// SKU unknown to the catalog, or product inactive.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Not enough stock to satisfy the requested quantity.
    ///
    /// `available` is the count observed at the moment the reservation was
    /// refused; another terminal may change it immediately afterwards.
    #[error("insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Quantity must be at least 1 (use remove instead of zero).
    #[error("invalid quantity {quantity} for {sku}")]
    InvalidQuantity { sku: String, quantity: i64 },

    /// Aggregate discount out of bounds (percentage outside [0, 100%],
    /// fixed amount negative).
    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    /// Finalize called on a cart with no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The backing store failed. Rollback has already run; the caller may
    /// retry the whole operation.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// No sale with the given id.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// The sale has already been refunded; the transition happens at most
    /// once.
    #[error("sale already refunded: {0}")]
    AlreadyRefunded(String),

    /// A reservation or status transition lost a race with a concurrent
    /// writer. Not retried internally, to avoid duplicate side effects.
    #[error("concurrent modification on {0}, retry the operation")]
    ConcurrentModification(String),
}

impl CheckoutError {
    /// Short machine-readable code, used by the HTTP layer and logs.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::ProductNotFound(_) => "product_not_found",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::InvalidQuantity { .. } => "invalid_quantity",
            CheckoutError::InvalidDiscount(_) => "invalid_discount",
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::Persistence(_) => "persistence_failure",
            CheckoutError::SaleNotFound(_) => "sale_not_found",
            CheckoutError::AlreadyRefunded(_) => "already_refunded",
            CheckoutError::ConcurrentModification(_) => "concurrent_modification",
        }
    }
}

/// Convenience type alias for Results within the transaction core.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CheckoutError::InsufficientStock {
            sku: "BRK-001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for BRK-001: available 3, requested 5"
        );
        assert_eq!(err.code(), "insufficient_stock");
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(CheckoutError::EmptyCart.code(), "empty_cart");
        assert_eq!(
            CheckoutError::AlreadyRefunded("x".into()).code(),
            "already_refunded"
        );
    }
}
