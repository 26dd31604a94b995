//! Shared application state.
//!
//! One `AppState` per process, shared across handlers via
//! `Extension<Arc<AppState>>`. All services hang off the same SQLite pool.

use std::sync::Arc;

use gearbox_checkout::{RefundProcessor, SaleStore, StockLedger, TransactionCoordinator};
use gearbox_core::{PricingPolicy, TaxRate};
use gearbox_store::{SqliteCatalog, SqliteSaleStore, Store};

/// Services wired for the HTTP handlers.
pub struct AppState {
    /// Underlying store, kept for health checks.
    pub store: Store,
    /// Catalog reads (product lookups, listings).
    pub catalog: Arc<SqliteCatalog>,
    /// Sale reads (fetch, list).
    pub sales: Arc<SqliteSaleStore>,
    /// The cart-to-sale pipeline.
    pub coordinator: TransactionCoordinator,
    /// Sale reversal.
    pub refunds: RefundProcessor,
}

impl AppState {
    /// Wires all services over one store with the given tax rate.
    pub fn new(store: Store, tax_rate_bps: u32) -> Self {
        let policy = PricingPolicy {
            tax_rate: TaxRate::from_bps(tax_rate_bps),
        };

        let catalog = Arc::new(store.catalog());
        let sales = Arc::new(store.sale_store());
        let ledger: Arc<dyn StockLedger> = Arc::new(store.stock_ledger());
        let sale_store: Arc<dyn SaleStore> = sales.clone();

        AppState {
            coordinator: TransactionCoordinator::new(ledger.clone(), sale_store.clone(), policy),
            refunds: RefundProcessor::new(ledger, sale_store),
            catalog,
            sales,
            store,
        }
    }
}
