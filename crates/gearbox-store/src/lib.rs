//! # gearbox-store: Storage Layer for Gearbox POS
//!
//! SQLite persistence for the transaction core, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gearbox POS Data Flow                             │
//! │                                                                         │
//! │  TransactionCoordinator / RefundProcessor (gearbox-checkout)            │
//! │       │          via Catalog / StockLedger / SaleStore traits           │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gearbox-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐   ┌────────────┐ │   │
//! │  │   │    Store      │    │    Repositories    │   │ Migrations │ │   │
//! │  │   │   (pool.rs)   │    │ SqliteCatalog      │   │ (embedded) │ │   │
//! │  │   │               │◄───│ SqliteStockLedger  │   │ 001_*.sql  │ │   │
//! │  │   │ SqlitePool    │    │ SqliteSaleStore    │   │            │ │   │
//! │  │   └───────────────┘    └────────────────────┘   └────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode), one file per deployment                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gearbox_store::{Store, StoreConfig};
//!
//! let store = Store::connect(StoreConfig::new("gearbox.db")).await?;
//! let sale = store.sale_store().fetch("some-id").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Store, StoreConfig};

pub use repository::catalog::SqliteCatalog;
pub use repository::sale::SqliteSaleStore;
pub use repository::stock::SqliteStockLedger;

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use gearbox_core::Product;

    /// Builds an active catalog product for repository tests.
    pub fn part(sku: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price_cents: price_cents,
            available_stock: stock,
            min_stock: 0,
            unit: "piece".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
