//! # Storage Traits
//!
//! The seams between the checkout pipeline and its collaborators.
//!
//! ## Who Implements What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trait          Production (gearbox-store)     Tests (this crate)       │
//! │  ───────        ──────────────────────────     ─────────────────        │
//! │  Catalog        SqliteCatalog                  InMemoryInventory        │
//! │  StockLedger    SqliteStockLedger              InMemoryInventory        │
//! │  SaleStore      SqliteSaleStore                InMemorySaleStore        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method returns `CheckoutResult`, so the coordinator and refund
//! processor never see backend-specific error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gearbox_core::{CheckoutResult, Product, Sale};

/// Read-only view of products, supplied by the external inventory service.
///
/// The transaction core only reads through this contract; product ownership
/// and mutation live elsewhere.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Looks up a product by sku. `None` for unknown skus; inactive products
    /// are returned as-is and filtered by callers that require active ones.
    async fn product(&self, sku: &str) -> CheckoutResult<Option<Product>>;

    /// All currently active products, sku-ascending.
    async fn active_products(&self) -> CheckoutResult<Vec<Product>>;
}

/// Single source of truth for per-SKU availability.
///
/// ## Contract
/// - `reserve` atomically decrements the available count and records a
///   `held` reservation; it is serialized per sku, so two concurrent
///   finalize attempts can never both succeed when their combined quantity
///   exceeds availability.
/// - `commit` flips `held → committed` and makes the decrement permanent.
/// - `release` reverses a `held` or `committed` reservation, restoring the
///   available count. Releasing an already-released reservation is a no-op,
///   never a double credit.
/// - All three are idempotent under retry of the same reservation id.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Non-authoritative fast check, for advisory UX feedback.
    async fn check_available(&self, sku: &str, quantity: i64) -> CheckoutResult<bool>;

    /// Atomically holds `quantity` units of `sku`. Returns the reservation
    /// id, or `InsufficientStock` naming the sku.
    async fn reserve(&self, sku: &str, quantity: i64) -> CheckoutResult<String>;

    /// Marks a held reservation committed. Idempotent.
    async fn commit(&self, reservation_id: &str) -> CheckoutResult<()>;

    /// Reverses a held or committed reservation, restoring stock.
    /// Idempotent: a released reservation stays released.
    async fn release(&self, reservation_id: &str) -> CheckoutResult<()>;

    /// Issues a fresh stock increase, unconnected to any reservation.
    ///
    /// Used by refunds: the original reservation may be long gone, so the
    /// reversal is an independent credit of the sold quantity.
    async fn restock(&self, sku: &str, quantity: i64) -> CheckoutResult<()>;
}

/// Durable storage for finalized sales.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Persists a completed sale and commits its reservations as one atomic
    /// unit. If this fails, neither the sale nor any commit is visible.
    async fn persist_completed(
        &self,
        sale: &Sale,
        reservation_ids: &[String],
    ) -> CheckoutResult<()>;

    /// Fetches a sale by id.
    async fn fetch(&self, id: &str) -> CheckoutResult<Option<Sale>>;

    /// All sales, newest first.
    async fn list(&self) -> CheckoutResult<Vec<Sale>>;

    /// Performs the single `completed → refunded` transition and returns
    /// the updated sale. Fails with `SaleNotFound` for unknown ids and
    /// `AlreadyRefunded` if the transition has already happened — the
    /// check-and-set is atomic, so the transition occurs at most once even
    /// under concurrent refund attempts.
    async fn mark_refunded(&self, id: &str, refunded_at: DateTime<Utc>) -> CheckoutResult<Sale>;
}
