//! # Cart Module
//!
//! The mutable, single-session shopping cart and its immutable snapshot.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │  Terminal Action            Cart Mutation                               │
//! │  ───────────────            ─────────────                               │
//! │  Scan / pick product ─────► add_item(&product, qty)   (merges by sku)  │
//! │  Change quantity ─────────► update_quantity(&product, qty)             │
//! │  Remove line ─────────────► remove_item(sku)          (idempotent)     │
//! │  Line discount ───────────► update_line_discount(sku, cents) (clamped) │
//! │  Cart discount ───────────► set_aggregate_discount(..) (verbatim)      │
//! │                                                                         │
//! │  Checkout ────────────────► snapshot() ──► PricingEngine / finalize    │
//! │                                                                         │
//! │  Totals are NEVER recomputed implicitly on mutation. Any caller gets   │
//! │  identical results from identical snapshots, on demand.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock checks in this module are advisory, against the catalog's
//! last-known availability. The stock ledger at finalize time is the only
//! authoritative check.

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use crate::types::{AggregateDiscount, PaymentMethod, Product};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the shopping cart.
///
/// The unit price is captured when the product is first added and is immune
/// to later catalog price changes (snapshot pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// SKU of the product this line refers to.
    pub sku: String,

    /// Product name at time of adding (frozen, for display and receipts).
    pub name: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity in cart, always ≥ 1.
    pub quantity: i64,

    /// Line-level discount in cents, always within
    /// `[0, quantity × unit_price_cents]`.
    pub line_discount_cents: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.unit_price_cents,
            quantity,
            line_discount_cents: 0,
        }
    }

    /// quantity × unit price, before the line discount.
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// quantity × unit price − line discount.
    pub fn line_total(&self) -> Money {
        self.line_subtotal() - Money::from_cents(self.line_discount_cents)
    }

    /// Re-applies the discount clamp after a quantity change.
    ///
    /// A quantity decrease can leave the stored discount above the new line
    /// subtotal; the clamp policy caps it rather than erroring.
    fn reclamp_discount(&mut self) {
        let cap = self.line_subtotal();
        self.line_discount_cents = Money::from_cents(self.line_discount_cents)
            .clamp_to(Money::zero(), cap)
            .cents();
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The mutable checkout-session aggregate.
///
/// ## Invariants
/// - Lines are unique by sku (adding the same product merges quantities)
/// - Every line has quantity ≥ 1
/// - Every line discount is within `[0, quantity × unit_price]`
/// - Maximum lines: [`MAX_CART_LINES`], maximum quantity per line:
///   [`MAX_LINE_QUANTITY`]
///
/// The cart is never persisted; it is discarded on finalize or abandonment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Optional reference to a customer in the embedding system.
    pub customer_ref: Option<String>,

    /// Ordered lines. Order is irrelevant to totals, relevant to display.
    lines: Vec<CartLine>,

    /// Cart-wide discount, stored verbatim until finalize validation.
    pub aggregate_discount: AggregateDiscount,

    /// Selected tender, if any has been chosen yet.
    pub payment_method: Option<PaymentMethod>,

    /// Free-form note for the sale record.
    pub notes: Option<String>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product to the cart, merging with an existing line for the
    /// same sku.
    ///
    /// Fails with [`CheckoutError::ProductNotFound`] for inactive products
    /// and [`CheckoutError::InsufficientStock`] when the resulting quantity
    /// exceeds the catalog's last-known availability (advisory check).
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CheckoutResult<()> {
        if quantity < 1 || quantity > MAX_LINE_QUANTITY {
            return Err(CheckoutError::InvalidQuantity {
                sku: product.sku.clone(),
                quantity,
            });
        }
        if !product.is_active {
            return Err(CheckoutError::ProductNotFound(product.sku.clone()));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.sku == product.sku) {
            let merged = line.quantity + quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(CheckoutError::InvalidQuantity {
                    sku: product.sku.clone(),
                    quantity: merged,
                });
            }
            if merged > product.available_stock {
                return Err(CheckoutError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: product.available_stock,
                    requested: merged,
                });
            }
            line.quantity = merged;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CheckoutError::InvalidQuantity {
                sku: product.sku.clone(),
                quantity,
            });
        }
        if quantity > product.available_stock {
            return Err(CheckoutError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.available_stock,
                requested: quantity,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Removes the line for `sku` unconditionally. No error if absent.
    pub fn remove_item(&mut self, sku: &str) {
        self.lines.retain(|l| l.sku != sku);
    }

    /// Sets the quantity of an existing line.
    ///
    /// Fails with [`CheckoutError::InvalidQuantity`] for qty ≤ 0 (callers
    /// should use [`Cart::remove_item`] instead) and
    /// [`CheckoutError::InsufficientStock`] beyond known availability.
    /// The line discount is re-clamped to the new line subtotal.
    pub fn update_quantity(&mut self, product: &Product, quantity: i64) -> CheckoutResult<()> {
        if quantity <= 0 || quantity > MAX_LINE_QUANTITY {
            return Err(CheckoutError::InvalidQuantity {
                sku: product.sku.clone(),
                quantity,
            });
        }
        if quantity > product.available_stock {
            return Err(CheckoutError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.available_stock,
                requested: quantity,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.sku == product.sku)
            .ok_or_else(|| CheckoutError::ProductNotFound(product.sku.clone()))?;

        line.quantity = quantity;
        line.reclamp_discount();
        Ok(())
    }

    /// Sets a line discount, silently clamped to `[0, line subtotal]`.
    ///
    /// The clamp is a documented policy ("cap discount at line subtotal"),
    /// not an error. Fails only if the line does not exist.
    pub fn update_line_discount(&mut self, sku: &str, discount_cents: i64) -> CheckoutResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.sku == sku)
            .ok_or_else(|| CheckoutError::ProductNotFound(sku.to_string()))?;

        let cap = line.line_subtotal();
        line.line_discount_cents = Money::from_cents(discount_cents)
            .clamp_to(Money::zero(), cap)
            .cents();
        Ok(())
    }

    /// Stores the aggregate discount verbatim. Bounds are validated at
    /// finalize time, not here.
    pub fn set_aggregate_discount(&mut self, discount: AggregateDiscount) {
        self.aggregate_discount = discount;
    }

    /// Selects the tender for this cart.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    /// Attaches a customer reference.
    pub fn set_customer_ref(&mut self, customer_ref: Option<String>) {
        self.customer_ref = customer_ref;
    }

    /// Attaches a free-form note.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Read access to the lines, in display order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns an immutable copy of the cart for pricing and finalize use.
    ///
    /// This is the only way cart contents leave the session; there are no
    /// hidden recomputation triggers.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            customer_ref: self.customer_ref.clone(),
            lines: self.lines.clone(),
            aggregate_discount: self.aggregate_discount,
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// Cart Snapshot
// =============================================================================

/// An immutable copy of a cart, taken at a single point in time.
///
/// Pricing and finalize operate exclusively on snapshots, so mid-checkout
/// cart mutations can never bleed into a running transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub customer_ref: Option<String>,
    pub lines: Vec<CartLine>,
    pub aggregate_discount: AggregateDiscount,
    pub notes: Option<String>,
}

impl CartSnapshot {
    /// Checks if the snapshot has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(sku: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            sku: sku.to_string(),
            name: format!("Part {sku}"),
            unit_price_cents: price_cents,
            available_stock: stock,
            min_stock: 0,
            unit: "piece".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.lines()[0].line_total().cents(), 30_000);
    }

    #[test]
    fn test_add_same_sku_merges() {
        let mut cart = Cart::new();
        let p = product("OIL-5W30", 4_500, 10);
        cart.add_item(&p, 2).unwrap();
        cart.add_item(&p, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_beyond_known_stock_fails() {
        let mut cart = Cart::new();
        let p = product("BRK-001", 10_000, 5);
        cart.add_item(&p, 3).unwrap();

        let err = cart.add_item(&p, 3).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
        // Failed merge leaves the line untouched
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_inactive_product_fails() {
        let mut cart = Cart::new();
        let mut p = product("OLD-001", 100, 5);
        p.is_active = false;

        assert!(matches!(
            cart.add_item(&p, 1),
            Err(CheckoutError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 1).unwrap();

        cart.remove_item("BRK-001");
        cart.remove_item("BRK-001"); // second remove is a no-op
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_rejects_non_positive() {
        let mut cart = Cart::new();
        let p = product("BRK-001", 10_000, 5);
        cart.add_item(&p, 2).unwrap();

        assert!(matches!(
            cart.update_quantity(&p, 0),
            Err(CheckoutError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            cart.update_quantity(&p, -1),
            Err(CheckoutError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_line_discount_clamps_silently() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 2).unwrap();

        // Line subtotal is 20_000; requesting 25_000 caps at the subtotal
        cart.update_line_discount("BRK-001", 25_000).unwrap();
        assert_eq!(cart.lines()[0].line_discount_cents, 20_000);

        // Negative requests clamp to zero
        cart.update_line_discount("BRK-001", -500).unwrap();
        assert_eq!(cart.lines()[0].line_discount_cents, 0);
    }

    #[test]
    fn test_quantity_change_reclamps_discount() {
        let mut cart = Cart::new();
        let p = product("BRK-001", 10_000, 5);
        cart.add_item(&p, 3).unwrap();
        cart.update_line_discount("BRK-001", 25_000).unwrap();

        // Dropping to 1 unit caps the stored discount at the new subtotal
        cart.update_quantity(&p, 1).unwrap();
        assert_eq!(cart.lines()[0].line_discount_cents, 10_000);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut cart = Cart::new();
        let p = product("BRK-001", 10_000, 5);
        cart.add_item(&p, 2).unwrap();

        let snap = cart.snapshot();
        cart.update_quantity(&p, 5).unwrap();

        assert_eq!(snap.lines[0].quantity, 2);
        assert_eq!(cart.lines()[0].quantity, 5);
    }
}
