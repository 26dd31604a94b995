//! # Pricing Engine
//!
//! Pure, side-effect-free totals computation from a cart snapshot and a
//! pricing policy.
//!
//! ## The Arithmetic (fixed, no hidden multipliers)
//! ```text
//! subtotal       = Σ(line.quantity × line.unit_price − line.line_discount)
//! discount_total = percentage → half_up(subtotal × bps / 10000)
//!                  fixed      → min(value, subtotal)
//! tax_total      = half_up((subtotal − discount_total) × tax_rate)
//! grand_total    = subtotal − discount_total + tax_total
//! ```
//!
//! The source system this core replaces contained an undocumented gesture
//! path that substituted a fixed discount of one-third of the total under
//! certain payment methods, silently underreporting revenue and tax. That
//! path is a defect, not a discount-policy variant, and is deliberately
//! absent here: every discount flows through the two documented kinds
//! above and nothing else touches the totals.

use serde::{Deserialize, Serialize};

use crate::cart::CartSnapshot;
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use crate::types::{AggregateDiscount, TaxRate};
use crate::DEFAULT_TAX_RATE_BPS;

// =============================================================================
// Pricing Policy
// =============================================================================

/// Parameters the engine prices against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Tax rate applied to (subtotal − discount).
    pub tax_rate: TaxRate,
}

impl Default for PricingPolicy {
    /// Default policy: 15% tax.
    fn default() -> Self {
        PricingPolicy {
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// The computed totals for one cart snapshot.
///
/// Satisfies, by construction:
/// - `0 ≤ discount_total ≤ subtotal`
/// - `grand_total = subtotal − discount_total + tax_total ≥ 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal_cents: i64,
    pub discount_total_cents: i64,
    pub tax_total_cents: i64,
    pub grand_total_cents: i64,
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Stateless totals computation.
///
/// Identical snapshots produce identical totals — there is no caching, no
/// reactive recomputation, and no dependence on anything but the arguments.
pub struct PricingEngine;

impl PricingEngine {
    /// Computes totals for a snapshot under the given policy.
    ///
    /// Validates the aggregate discount bounds (percentage ∈ [0, 100%],
    /// fixed ≥ 0); line discounts are assumed already clamped by the cart,
    /// and are re-checked defensively.
    ///
    /// ```rust
    /// use gearbox_core::cart::Cart;
    /// use gearbox_core::pricing::{PricingEngine, PricingPolicy};
    ///
    /// let cart = Cart::new();
    /// let totals = PricingEngine::compute(&cart.snapshot(), &PricingPolicy::default());
    /// assert!(totals.is_ok());
    /// assert_eq!(totals.unwrap().grand_total_cents, 0);
    /// ```
    pub fn compute(snapshot: &CartSnapshot, policy: &PricingPolicy) -> CheckoutResult<Totals> {
        let mut subtotal = Money::zero();
        for line in &snapshot.lines {
            let line_total = line.line_total();
            if line_total.is_negative() || line.line_discount_cents < 0 {
                return Err(CheckoutError::InvalidDiscount(format!(
                    "line discount for {} outside [0, line subtotal]",
                    line.sku
                )));
            }
            subtotal += line_total;
        }

        let discount_total = Self::aggregate_discount(subtotal, snapshot.aggregate_discount)?;
        let taxable = subtotal - discount_total;
        let tax_total = taxable.calculate_tax(policy.tax_rate);
        let grand_total = taxable + tax_total;

        Ok(Totals {
            subtotal_cents: subtotal.cents(),
            discount_total_cents: discount_total.cents(),
            tax_total_cents: tax_total.cents(),
            grand_total_cents: grand_total.cents(),
        })
    }

    /// Resolves the aggregate discount to an amount within
    /// `[0, subtotal]`.
    fn aggregate_discount(subtotal: Money, discount: AggregateDiscount) -> CheckoutResult<Money> {
        match discount {
            AggregateDiscount::Percentage(bps) => {
                if bps > 10_000 {
                    return Err(CheckoutError::InvalidDiscount(format!(
                        "percentage discount {bps} bps exceeds 100%"
                    )));
                }
                Ok(subtotal.percentage_of(bps))
            }
            AggregateDiscount::Fixed(cents) => {
                if cents < 0 {
                    return Err(CheckoutError::InvalidDiscount(format!(
                        "fixed discount {cents} is negative"
                    )));
                }
                // Never exceeds the subtotal, mirroring the line-level clamp
                Ok(Money::from_cents(cents).min(subtotal))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::types::Product;
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

    fn policy_15() -> PricingPolicy {
        PricingPolicy {
            tax_rate: TaxRate::from_bps(1500),
        }
    }

    /// The worked reference scenario: 3 × $100.00, fixed $10.00 discount,
    /// 15% tax.
    #[test]
    fn test_reference_scenario() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 3).unwrap();
        cart.set_aggregate_discount(AggregateDiscount::Fixed(1_000));

        let totals = PricingEngine::compute(&cart.snapshot(), &policy_15()).unwrap();

        assert_eq!(totals.subtotal_cents, 30_000); // $300.00
        assert_eq!(totals.discount_total_cents, 1_000); // $10.00
        assert_eq!(totals.tax_total_cents, 4_350); // round($290 × 0.15)
        assert_eq!(totals.grand_total_cents, 33_350); // $333.50
    }

    #[test]
    fn test_percentage_discount() {
        let mut cart = Cart::new();
        cart.add_item(&product("OIL-5W30", 4_500, 20), 4).unwrap(); // 18_000
        cart.set_aggregate_discount(AggregateDiscount::Percentage(1000)); // 10%

        let totals = PricingEngine::compute(&cart.snapshot(), &policy_15()).unwrap();

        assert_eq!(totals.subtotal_cents, 18_000);
        assert_eq!(totals.discount_total_cents, 1_800);
        assert_eq!(totals.tax_total_cents, 2_430); // 16_200 × 0.15
        assert_eq!(totals.grand_total_cents, 18_630);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let mut cart = Cart::new();
        cart.add_item(&product("CLP-014", 250, 10), 2).unwrap(); // 500
        cart.set_aggregate_discount(AggregateDiscount::Fixed(9_999));

        let totals = PricingEngine::compute(&cart.snapshot(), &policy_15()).unwrap();

        assert_eq!(totals.discount_total_cents, 500);
        assert_eq!(totals.tax_total_cents, 0);
        assert_eq!(totals.grand_total_cents, 0); // never negative
    }

    #[test]
    fn test_line_discounts_fold_into_subtotal() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 2).unwrap();
        cart.update_line_discount("BRK-001", 2_000).unwrap();

        let totals = PricingEngine::compute(&cart.snapshot(), &policy_15()).unwrap();

        // subtotal already nets the line discount; aggregate stays zero
        assert_eq!(totals.subtotal_cents, 18_000);
        assert_eq!(totals.discount_total_cents, 0);
        assert_eq!(totals.grand_total_cents, 18_000 + 2_700);
    }

    #[test]
    fn test_invalid_percentage_rejected() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 1).unwrap();
        cart.set_aggregate_discount(AggregateDiscount::Percentage(10_001));

        assert!(matches!(
            PricingEngine::compute(&cart.snapshot(), &policy_15()),
            Err(CheckoutError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_negative_fixed_rejected() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 1).unwrap();
        cart.set_aggregate_discount(AggregateDiscount::Fixed(-1));

        assert!(matches!(
            PricingEngine::compute(&cart.snapshot(), &policy_15()),
            Err(CheckoutError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_totals_invariants_hold() {
        // A spread of carts; every result must satisfy the bound invariants
        let cases: Vec<(i64, i64, AggregateDiscount)> = vec![
            (10_000, 1, AggregateDiscount::Percentage(0)),
            (10_000, 3, AggregateDiscount::Percentage(10_000)),
            (999, 7, AggregateDiscount::Fixed(0)),
            (1, 1, AggregateDiscount::Fixed(1)),
            (333, 3, AggregateDiscount::Percentage(3_333)),
        ];

        for (price, qty, discount) in cases {
            let mut cart = Cart::new();
            cart.add_item(&product("X-1", price, 1000), qty).unwrap();
            cart.set_aggregate_discount(discount);

            let t = PricingEngine::compute(&cart.snapshot(), &policy_15()).unwrap();
            assert!(t.discount_total_cents >= 0);
            assert!(t.discount_total_cents <= t.subtotal_cents);
            assert!(t.grand_total_cents >= 0);
            assert_eq!(
                t.grand_total_cents,
                t.subtotal_cents - t.discount_total_cents + t.tax_total_cents
            );
        }
    }

    #[test]
    fn test_identical_snapshots_identical_totals() {
        let mut cart = Cart::new();
        cart.add_item(&product("BRK-001", 10_000, 5), 3).unwrap();
        let snap = cart.snapshot();

        let a = PricingEngine::compute(&snap, &policy_15()).unwrap();
        let b = PricingEngine::compute(&snap, &policy_15()).unwrap();
        assert_eq!(a, b);
    }
}
