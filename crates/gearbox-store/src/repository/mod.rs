//! # Repository Implementations
//!
//! SQLite implementations of the gearbox-checkout storage traits, one
//! module per trait:
//!
//! - [`catalog`] - `SqliteCatalog` (product lookups + seeding upsert)
//! - [`stock`] - `SqliteStockLedger` (guarded-UPDATE availability counter)
//! - [`sale`] - `SqliteSaleStore` (immutable sale records)

pub mod catalog;
pub mod sale;
pub mod stock;
