//! # Checkout Session
//!
//! `CartManager` maintains one active cart per checkout session and is the
//! only writer to it. Stock checks here are advisory (the catalog's
//! last-known availability, for fast terminal feedback); the stock ledger
//! at finalize time is the only check that matters for correctness, and it
//! is never skipped.

use std::sync::Arc;

use tracing::debug;

use gearbox_core::validation::validate_sku;
use gearbox_core::{
    AggregateDiscount, Cart, CartSnapshot, CheckoutError, CheckoutResult, PaymentMethod, Product,
};

use crate::traits::Catalog;

/// One mutable cart, bound to one catalog view, for one checkout session.
///
/// Cart state is invisible outside the session except through
/// [`CartManager::snapshot`].
pub struct CartManager {
    catalog: Arc<dyn Catalog>,
    cart: Cart,
}

impl CartManager {
    /// Opens a new session with an empty cart.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        CartManager {
            catalog,
            cart: Cart::new(),
        }
    }

    /// Adds `quantity` units of `sku`, merging with an existing line.
    ///
    /// Looks up the catalog for the unit price snapshot. Fails with
    /// `ProductNotFound` for unknown or inactive skus, `InsufficientStock`
    /// if the resulting quantity exceeds last-known availability.
    pub async fn add_item(&mut self, sku: &str, quantity: i64) -> CheckoutResult<()> {
        validate_sku(sku)?;
        let product = self.active_product(sku).await?;
        debug!(sku = %sku, quantity, "cart add");
        self.cart.add_item(&product, quantity)
    }

    /// Removes the line for `sku`. Idempotent; absent lines are fine.
    pub fn remove_item(&mut self, sku: &str) {
        debug!(sku = %sku, "cart remove");
        self.cart.remove_item(sku);
    }

    /// Sets the quantity of an existing line. Fails with `InvalidQuantity`
    /// for qty ≤ 0 (use [`CartManager::remove_item`] instead).
    pub async fn update_quantity(&mut self, sku: &str, quantity: i64) -> CheckoutResult<()> {
        let product = self.active_product(sku).await?;
        debug!(sku = %sku, quantity, "cart quantity update");
        self.cart.update_quantity(&product, quantity)
    }

    /// Sets a line discount, silently clamped to `[0, line subtotal]`.
    pub fn update_line_discount(&mut self, sku: &str, discount_cents: i64) -> CheckoutResult<()> {
        self.cart.update_line_discount(sku, discount_cents)
    }

    /// Stores the aggregate discount verbatim; validated at finalize time.
    pub fn set_aggregate_discount(&mut self, discount: AggregateDiscount) {
        self.cart.set_aggregate_discount(discount);
    }

    /// Selects the tender for this session.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.cart.set_payment_method(method);
    }

    /// Attaches a customer reference.
    pub fn set_customer_ref(&mut self, customer_ref: Option<String>) {
        self.cart.set_customer_ref(customer_ref);
    }

    /// Attaches a free-form note.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.cart.set_notes(notes);
    }

    /// Read access to the underlying cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Returns an immutable copy of the cart for pricing and finalize use.
    pub fn snapshot(&self) -> CartSnapshot {
        self.cart.snapshot()
    }

    async fn active_product(&self, sku: &str) -> CheckoutResult<Product> {
        self.catalog
            .product(sku)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CheckoutError::ProductNotFound(sku.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
