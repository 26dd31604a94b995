//! Consistent JSON error responses.
//!
//! Every failure body has the same base shape:
//! ```json
//! { "error": "<stable_code>", "message": "<human readable>" }
//! ```
//!
//! `insufficient_stock` additionally carries `sku`, `available`, and
//! `requested` so terminals can react per line without parsing the message.
//!
//! ## Status Mapping
//! ```text
//! insufficient_stock, already_refunded,
//! concurrent_modification                      → 409 CONFLICT
//! product_not_found, invalid_quantity,
//! invalid_discount, empty_cart                 → 400 BAD REQUEST
//! sale_not_found                               → 404 NOT FOUND
//! persistence_failure                          → 500 INTERNAL SERVER ERROR
//! ```

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gearbox_core::CheckoutError;

/// Maps a checkout failure onto an HTTP response with a stable error code.
pub fn checkout_error_response(err: &CheckoutError) -> axum::response::Response {
    let status = match err {
        CheckoutError::InsufficientStock { .. }
        | CheckoutError::AlreadyRefunded(_)
        | CheckoutError::ConcurrentModification(_) => StatusCode::CONFLICT,

        CheckoutError::ProductNotFound(_)
        | CheckoutError::InvalidQuantity { .. }
        | CheckoutError::InvalidDiscount(_)
        | CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,

        CheckoutError::SaleNotFound(_) => StatusCode::NOT_FOUND,

        CheckoutError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut body = json!({
        "error": err.code(),
        "message": err.to_string(),
    });

    if let CheckoutError::InsufficientStock {
        sku,
        available,
        requested,
    } = err
    {
        body["sku"] = json!(sku);
        body["available"] = json!(available);
        body["requested"] = json!(requested);
    }

    (status, axum::Json(body)).into_response()
}

/// Builds a JSON error response with the standard body shape.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let conflict = checkout_error_response(&CheckoutError::InsufficientStock {
            sku: "BRK-001".into(),
            available: 2,
            requested: 5,
        });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let bad = checkout_error_response(&CheckoutError::EmptyCart);
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = checkout_error_response(&CheckoutError::SaleNotFound("x".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let broken = checkout_error_response(&CheckoutError::Persistence("io".into()));
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_insufficient_stock_body_carries_the_shortage() {
        let resp = checkout_error_response(&CheckoutError::InsufficientStock {
            sku: "BRK-001".into(),
            available: 5,
            requested: 6,
        });
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["sku"], "BRK-001");
        assert_eq!(body["available"], 5);
        assert_eq!(body["requested"], 6);
    }

    #[tokio::test]
    async fn test_other_errors_keep_the_base_shape() {
        let resp = checkout_error_response(&CheckoutError::EmptyCart);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "empty_cart");
        assert!(body.get("sku").is_none());
    }
}
