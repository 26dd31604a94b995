//! # gearbox-core: Pure Business Logic for Gearbox POS
//!
//! This crate is the heart of the Gearbox POS transaction core. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Gearbox POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │        POST /sales, POST /sales/:id/refund, GET /products       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  gearbox-checkout (services)                    │   │
//! │  │    CartManager · TransactionCoordinator · RefundProcessor       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gearbox-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  pricing  │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │  Totals   │  │   │
//! │  │   │   Sale    │  │  TaxCalc  │  │ CartLine  │  │  compute  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 gearbox-store (SQLite layer)                    │   │
//! │  │        catalog reads, stock ledger, sale records                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: identical snapshots produce identical totals
//! 2. **No I/O**: database, network, file system access is forbidden here
//! 3. **Integer Money**: every monetary value is i64 cents, half-up rounding
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartSnapshot};
pub use error::{CheckoutError, CheckoutResult};
pub use money::Money;
pub use pricing::{PricingEngine, PricingPolicy, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate in basis points (1500 = 15%).
///
/// Used when the embedding service does not configure a rate. The pricing
/// policy is the single place a rate enters a computation.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1500;

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps finalize's reservation loop bounded.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
