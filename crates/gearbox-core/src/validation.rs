//! # Validation Module
//!
//! Business-rule validation for checkout input.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Request deserialization (typed DTOs reject malformed JSON)   │
//! │  Layer 2: THIS MODULE — business rule validation, before any I/O       │
//! │  Layer 3: Stock ledger at finalize — the only authoritative stock gate │
//! │                                                                         │
//! │  Validation failures surface immediately and never touch the ledger.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::cart::CartSnapshot;
use crate::error::{CheckoutError, CheckoutResult};
use crate::types::AggregateDiscount;
use crate::MAX_LINE_QUANTITY;

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens and underscores
///
/// ```rust
/// use gearbox_core::validation::validate_sku;
///
/// assert!(validate_sku("BRK-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("no spaces").is_err());
/// ```
pub fn validate_sku(sku: &str) -> CheckoutResult<()> {
    let trimmed = sku.trim();

    if trimmed.is_empty()
        || trimmed.len() > 50
        || !trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CheckoutError::ProductNotFound(sku.to_string()));
    }

    Ok(())
}

/// Validates a line quantity: 1 ..= [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(sku: &str, quantity: i64) -> CheckoutResult<()> {
    if quantity < 1 || quantity > MAX_LINE_QUANTITY {
        return Err(CheckoutError::InvalidQuantity {
            sku: sku.to_string(),
            quantity,
        });
    }
    Ok(())
}

/// Validates aggregate discount bounds: percentage ∈ [0, 100%] (bps),
/// fixed amount ≥ 0.
pub fn validate_aggregate_discount(discount: AggregateDiscount) -> CheckoutResult<()> {
    match discount {
        AggregateDiscount::Percentage(bps) if bps > 10_000 => Err(CheckoutError::InvalidDiscount(
            format!("percentage discount {bps} bps exceeds 100%"),
        )),
        AggregateDiscount::Fixed(cents) if cents < 0 => Err(CheckoutError::InvalidDiscount(
            format!("fixed discount {cents} is negative"),
        )),
        _ => Ok(()),
    }
}

/// Validates a snapshot is fit to finalize: non-empty, discount in bounds,
/// every line within its invariants.
///
/// This is the coordinator's `Validating` step; nothing here touches the
/// stock ledger.
pub fn validate_cart_for_checkout(snapshot: &CartSnapshot) -> CheckoutResult<()> {
    if snapshot.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    validate_aggregate_discount(snapshot.aggregate_discount)?;

    for line in &snapshot.lines {
        validate_quantity(&line.sku, line.quantity)?;
        let line_subtotal = line.quantity * line.unit_price_cents;
        if line.line_discount_cents < 0 || line.line_discount_cents > line_subtotal {
            return Err(CheckoutError::InvalidDiscount(format!(
                "line discount for {} outside [0, {line_subtotal}]",
                line.sku
            )));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
