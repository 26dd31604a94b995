//! # Domain Types
//!
//! Core domain types used throughout Gearbox POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (business) │   │  id (UUID)      │   │  sku_snapshot   │       │
//! │  │  name           │   │  status         │   │  quantity       │       │
//! │  │  unit_price     │   │  totals         │   │  line_total     │       │
//! │  │  available_stock│   │  payment_method │   │  line_discount  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │    TaxRate      │   │   SaleStatus     │   │ AggregateDiscount│     │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────  │     │
//! │  │  bps (u32)      │   │  Completed       │   │  Percentage(bps) │     │
//! │  │  1500 = 15%     │   │  Refunded        │   │  Fixed(cents)    │     │
//! │  └─────────────────┘   └──────────────────┘   └──────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Sale` is created exactly once at finalize time and is immutable except
//! for the single `Completed → Refunded` status transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15% (the default policy rate for this core)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

// =============================================================================
// Product (Catalog view)
// =============================================================================

/// A product as seen through the catalog read contract.
///
/// Owned by the external inventory service; this core only reads it.
/// `available_stock` here is the catalog's last-known value and is advisory:
/// the stock ledger is the single authority at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Stock Keeping Unit - the business identifier and lookup key.
    pub sku: String,

    /// Display name (e.g. "Brake Pad Set - Front").
    pub name: String,

    /// Unit price in cents.
    pub unit_price_cents: i64,

    /// Last-known available stock.
    pub available_stock: i64,

    /// Reorder threshold, carried through the read contract for display.
    pub min_stock: i64,

    /// Unit of measure ("piece", "litre", "set", ...).
    pub unit: String,

    /// Whether the product can currently be sold.
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Advisory check against the catalog's last-known stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && quantity <= self.available_stock
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a finalized sale.
///
/// There is no draft state: a sale record only comes into existence at the
/// moment a cart is finalized, already complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and persisted.
    Completed,
    /// Sale was reversed; stock has been restored.
    Refunded,
}

impl SaleStatus {
    /// Stable string form used for storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Refunded => "refunded",
        }
    }

    /// Parses the stable string form back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(SaleStatus::Completed),
            "refunded" => Some(SaleStatus::Refunded),
            _ => None,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// The tender used to settle a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Mobile wallet / QR payment.
    MobileWallet,
    /// Direct bank transfer.
    BankTransfer,
}

impl PaymentMethod {
    /// Stable string form used for storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileWallet => "mobile_wallet",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    /// Parses the stable string form back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "mobile_wallet" => Some(PaymentMethod::MobileWallet),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }
}

// =============================================================================
// Aggregate Discount
// =============================================================================

/// A single cart-wide discount applied to the subtotal after line discounts.
///
/// Stored verbatim on the cart; bounds are validated at finalize time
/// (percentage ∈ [0, 10000] bps, fixed amount ≥ 0). A fixed discount larger
/// than the subtotal is capped at the subtotal during pricing, mirroring the
/// line-level clamp policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AggregateDiscount {
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    Percentage(u32),
    /// Fixed amount in cents.
    Fixed(i64),
}

impl AggregateDiscount {
    /// No discount.
    pub const fn none() -> Self {
        AggregateDiscount::Fixed(0)
    }
}

impl Default for AggregateDiscount {
    fn default() -> Self {
        AggregateDiscount::none()
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable record of a finalized transaction.
///
/// Created once by the transaction coordinator; the only permitted mutation
/// afterwards is the `Completed → Refunded` status transition performed by
/// the refund processor. Pricing fields never change, even on refund, so the
/// financial history stays intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    /// Unique identifier (UUID v4), generated at commit.
    pub id: String,
    /// Optional reference to a customer in the embedding system.
    pub customer_ref: Option<String>,
    /// Frozen line snapshots.
    pub lines: Vec<SaleLine>,
    /// Σ(quantity × unit price − line discount), in cents.
    pub subtotal_cents: i64,
    /// The aggregate discount actually applied, in cents.
    pub discount_total_cents: i64,
    /// Tax on (subtotal − discount), half-up rounded, in cents.
    pub tax_total_cents: i64,
    /// subtotal − discount + tax, in cents. Never negative.
    pub grand_total_cents: i64,
    /// How the sale was settled.
    pub payment_method: PaymentMethod,
    /// Completed or refunded.
    pub status: SaleStatus,
    /// Free-form note captured at checkout.
    pub notes: Option<String>,
    /// When the sale was finalized.
    pub created_at: DateTime<Utc>,
    /// When the sale was refunded, if ever.
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item frozen into a sale.
///
/// Uses the snapshot pattern: sku, name and unit price are copied from the
/// cart line at finalize time, so later catalog changes never rewrite
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen at add-to-cart).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Discount applied to this line, in cents.
    pub line_discount_cents: i64,
    /// quantity × unit price − line discount, in cents.
    pub line_total_cents: i64,
}

impl SaleLine {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Stock Reservation
// =============================================================================

/// Lifecycle state of a stock reservation.
///
/// ```text
///          reserve              commit
///   ───────────────►  Held  ───────────►  Committed
///                      │                      │
///                      │ release              │ release (refund/abort)
///                      ▼                      ▼
///                            Released
/// ```
///
/// A reservation exists only for the duration of the finalize critical
/// section (plus its audit trail); committed reservations are permanent
/// stock decrements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// Stock decremented, not yet part of a persisted sale.
    Held,
    /// Stock decrement made permanent by a persisted sale.
    Committed,
    /// Decrement reversed; stock restored.
    Released,
}

impl ReservationState {
    /// Stable string form used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Held => "held",
            ReservationState::Committed => "committed",
            ReservationState::Released => "released",
        }
    }

    /// Parses the stable string form back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "held" => Some(ReservationState::Held),
            "committed" => Some(ReservationState::Committed),
            "released" => Some(ReservationState::Released),
            _ => None,
        }
    }
}

/// An ephemeral hold against available stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReservation {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// SKU the hold applies to.
    pub sku: String,
    /// Units held.
    pub quantity: i64,
    /// Current lifecycle state.
    pub state: ReservationState,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1500);
        assert_eq!(rate.bps(), 1500);
        assert!((rate.percentage() - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_payment_method_round_trip() {
        for m in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::MobileWallet,
            PaymentMethod::BankTransfer,
        ] {
            assert_eq!(PaymentMethod::parse(m.as_str()), Some(m));
        }
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }

    #[test]
    fn test_product_can_sell() {
        let now = Utc::now();
        let product = Product {
            sku: "BRK-001".to_string(),
            name: "Brake Pad Set".to_string(),
            unit_price_cents: 10_000,
            available_stock: 5,
            min_stock: 2,
            unit: "set".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(product.can_sell(5));
        assert!(!product.can_sell(6));

        let inactive = Product {
            is_active: false,
            ..product
        };
        assert!(!inactive.can_sell(1));
    }

    #[test]
    fn test_default_discount_is_zero_fixed() {
        assert_eq!(AggregateDiscount::default(), AggregateDiscount::Fixed(0));
    }
}
