//! # Gearbox Checkout - Cart-to-Sale Pipeline
//!
//! Orchestration layer between the pure domain (gearbox-core) and storage
//! (gearbox-store): checkout sessions, the finalize state machine, and
//! refund reversal.
//!
//! ## Module Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          gearbox-checkout                               │
//! │                                                                         │
//! │  traits.rs       Catalog / StockLedger / SaleStore seams                │
//! │  session.rs      CartManager: one mutable cart per session              │
//! │  coordinator.rs  TransactionCoordinator: validate → reserve →           │
//! │                  price → persist, with full rollback on failure         │
//! │  refund.rs       RefundProcessor: CAS status flip, then restock         │
//! │  memory.rs       In-memory reference backends (tests, demos)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is backend-agnostic: production wires in the SQLite
//! implementations from gearbox-store, tests use the in-memory ones.

pub mod coordinator;
pub mod memory;
pub mod refund;
pub mod session;
pub mod traits;

pub use coordinator::TransactionCoordinator;
pub use memory::{InMemoryInventory, InMemorySaleStore};
pub use refund::RefundProcessor;
pub use session::CartManager;
pub use traits::{Catalog, SaleStore, StockLedger};
