//! # In-Memory Backends
//!
//! Reference implementations of the storage traits over mutex-guarded
//! tables. They encode the same contract the SQLite backends honor
//! (serialized per-sku reservations, idempotent release, atomic
//! persist-plus-commit) and back the unit tests for the checkout pipeline.
//!
//! Useful beyond tests for demo and embedded single-process deployments,
//! but durability is the SQLite layer's job.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gearbox_core::{
    CheckoutError, CheckoutResult, Product, ReservationState, Sale, SaleStatus, StockReservation,
};

use crate::traits::{Catalog, SaleStore, StockLedger};

// =============================================================================
// In-Memory Inventory (Catalog + StockLedger)
// =============================================================================

#[derive(Default)]
struct InventoryInner {
    /// BTreeMap keeps `active_products` sku-ascending without extra sorting.
    products: BTreeMap<String, Product>,
    reservations: HashMap<String, StockReservation>,
}

/// Catalog and stock ledger over one shared table.
///
/// A single mutex serializes all reserve/commit/release calls, which is
/// exactly the per-sku ordering guarantee the contract asks for (coarser,
/// but correct: no two reservations on the same sku ever interleave).
#[derive(Default)]
pub struct InMemoryInventory {
    inner: Mutex<InventoryInner>,
}

impl InMemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product. Intended for tests and demos.
    pub fn add_product(&self, sku: &str, name: &str, unit_price_cents: i64, stock: i64, unit: &str) {
        let now = Utc::now();
        let product = Product {
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price_cents,
            available_stock: stock,
            min_stock: 0,
            unit: unit.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.lock().products.insert(sku.to_string(), product);
    }

    /// Changes a product's catalog price (tests exercising the price
    /// snapshot behavior).
    pub fn set_price(&self, sku: &str, unit_price_cents: i64) {
        if let Some(p) = self.lock().products.get_mut(sku) {
            p.unit_price_cents = unit_price_cents;
            p.updated_at = Utc::now();
        }
    }

    /// Current available stock for a sku, for assertions.
    pub fn stock_of(&self, sku: &str) -> i64 {
        self.lock()
            .products
            .get(sku)
            .map(|p| p.available_stock)
            .unwrap_or(0)
    }

    /// Current state of a reservation, for assertions.
    pub fn reservation_state(&self, reservation_id: &str) -> Option<ReservationState> {
        self.lock()
            .reservations
            .get(reservation_id)
            .map(|r| r.state)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InventoryInner> {
        self.inner.lock().expect("inventory mutex poisoned")
    }

    /// Commit under an already-held lock; shared with the sale store's
    /// atomic persist-plus-commit.
    fn commit_locked(inner: &mut InventoryInner, reservation_id: &str) -> CheckoutResult<()> {
        let reservation = inner.reservations.get_mut(reservation_id).ok_or_else(|| {
            CheckoutError::Persistence(format!("unknown reservation {reservation_id}"))
        })?;
        match reservation.state {
            ReservationState::Held => {
                reservation.state = ReservationState::Committed;
                Ok(())
            }
            // Retry of an already-committed reservation is fine
            ReservationState::Committed => Ok(()),
            // Someone released it while we were committing
            ReservationState::Released => Err(CheckoutError::ConcurrentModification(
                reservation_id.to_string(),
            )),
        }
    }
}

#[async_trait]
impl Catalog for InMemoryInventory {
    async fn product(&self, sku: &str) -> CheckoutResult<Option<Product>> {
        Ok(self.lock().products.get(sku).cloned())
    }

    async fn active_products(&self) -> CheckoutResult<Vec<Product>> {
        Ok(self
            .lock()
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StockLedger for InMemoryInventory {
    async fn check_available(&self, sku: &str, quantity: i64) -> CheckoutResult<bool> {
        Ok(self
            .lock()
            .products
            .get(sku)
            .map(|p| p.available_stock >= quantity)
            .unwrap_or(false))
    }

    async fn reserve(&self, sku: &str, quantity: i64) -> CheckoutResult<String> {
        if quantity < 1 {
            return Err(CheckoutError::InvalidQuantity {
                sku: sku.to_string(),
                quantity,
            });
        }

        let mut inner = self.lock();
        let product = inner
            .products
            .get_mut(sku)
            .ok_or_else(|| CheckoutError::ProductNotFound(sku.to_string()))?;

        if product.available_stock < quantity {
            return Err(CheckoutError::InsufficientStock {
                sku: sku.to_string(),
                available: product.available_stock,
                requested: quantity,
            });
        }

        product.available_stock -= quantity;
        let id = Uuid::new_v4().to_string();
        inner.reservations.insert(
            id.clone(),
            StockReservation {
                id: id.clone(),
                sku: sku.to_string(),
                quantity,
                state: ReservationState::Held,
            },
        );
        Ok(id)
    }

    async fn commit(&self, reservation_id: &str) -> CheckoutResult<()> {
        let mut inner = self.lock();
        Self::commit_locked(&mut inner, reservation_id)
    }

    async fn release(&self, reservation_id: &str) -> CheckoutResult<()> {
        let mut inner = self.lock();
        let reservation = match inner.reservations.get(reservation_id) {
            Some(r) => r.clone(),
            None => {
                return Err(CheckoutError::Persistence(format!(
                    "unknown reservation {reservation_id}"
                )))
            }
        };

        match reservation.state {
            // Already released: retry-safe no-op, never a double credit
            ReservationState::Released => Ok(()),
            ReservationState::Held | ReservationState::Committed => {
                if let Some(p) = inner.products.get_mut(&reservation.sku) {
                    p.available_stock += reservation.quantity;
                }
                if let Some(r) = inner.reservations.get_mut(reservation_id) {
                    r.state = ReservationState::Released;
                }
                Ok(())
            }
        }
    }

    async fn restock(&self, sku: &str, quantity: i64) -> CheckoutResult<()> {
        let mut inner = self.lock();
        let product = inner
            .products
            .get_mut(sku)
            .ok_or_else(|| CheckoutError::ProductNotFound(sku.to_string()))?;
        product.available_stock += quantity;
        product.updated_at = Utc::now();
        Ok(())
    }
}

// =============================================================================
// In-Memory Sale Store
// =============================================================================

/// Sale records in a mutex-guarded map, with the inventory handle needed to
/// make persist-plus-commit a single atomic step.
pub struct InMemorySaleStore {
    inventory: Arc<InMemoryInventory>,
    sales: Mutex<Vec<Sale>>,
}

impl InMemorySaleStore {
    /// Creates a store bound to the inventory whose reservations it commits.
    pub fn new(inventory: Arc<InMemoryInventory>) -> Self {
        InMemorySaleStore {
            inventory,
            sales: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sale>> {
        self.sales.lock().expect("sale store mutex poisoned")
    }
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn persist_completed(
        &self,
        sale: &Sale,
        reservation_ids: &[String],
    ) -> CheckoutResult<()> {
        // Hold the sales lock across the reservation commits so no reader
        // can observe committed reservations without the sale, or vice
        // versa. Lock order (sales, then inventory) is the only place both
        // are taken together.
        let mut sales = self.lock();
        if sales.iter().any(|s| s.id == sale.id) {
            return Err(CheckoutError::Persistence(format!(
                "duplicate sale id {}",
                sale.id
            )));
        }

        {
            let mut inner = self.inventory.lock();
            for id in reservation_ids {
                InMemoryInventory::commit_locked(&mut inner, id)?;
            }
        }

        sales.push(sale.clone());
        Ok(())
    }

    async fn fetch(&self, id: &str) -> CheckoutResult<Option<Sale>> {
        Ok(self.lock().iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self) -> CheckoutResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = self.lock().clone();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn mark_refunded(&self, id: &str, refunded_at: DateTime<Utc>) -> CheckoutResult<Sale> {
        let mut sales = self.lock();
        let sale = sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CheckoutError::SaleNotFound(id.to_string()))?;

        if sale.status == SaleStatus::Refunded {
            return Err(CheckoutError::AlreadyRefunded(id.to_string()));
        }

        sale.status = SaleStatus::Refunded;
        sale.refunded_at = Some(refunded_at);
        Ok(sale.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
