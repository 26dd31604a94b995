//! # Transaction Coordinator
//!
//! Orchestrates validation, stock reservation, pricing and persistence as
//! one atomic unit. This is the only component allowed to produce a `Sale`.
//!
//! ## Finalize State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Validating ──► Reserving ──► Pricing ──► Persisting ──► Completed     │
//! │      │              │            │             │                        │
//! │      └──────────────┴────────────┴─────────────┘                        │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                      Aborted   (every reservation of this attempt      │
//! │                                 released; no partial state visible)    │
//! │                                                                         │
//! │  Reservations are taken in ascending-sku order, so two concurrent      │
//! │  finalize attempts touching the same skus contend in the same order    │
//! │  and cannot deadlock each other.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation failures surface before the ledger is touched. Stock and
//! persistence failures roll back every reservation of the attempt before
//! surfacing. A caller sees either a finalized `Sale` or a typed error,
//! never an in-between.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gearbox_core::validation::validate_cart_for_checkout;
use gearbox_core::{
    CartSnapshot, CheckoutError, CheckoutResult, PaymentMethod, PricingEngine, PricingPolicy, Sale,
    SaleLine, SaleStatus,
};

use crate::traits::{SaleStore, StockLedger};

/// Phase of a finalize attempt, for diagnostics and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FinalizePhase {
    Validating,
    Reserving,
    Pricing,
    Persisting,
    Completed,
    Aborted,
}

/// The cart-to-sale pipeline.
pub struct TransactionCoordinator {
    ledger: Arc<dyn StockLedger>,
    sales: Arc<dyn SaleStore>,
    policy: PricingPolicy,
}

impl TransactionCoordinator {
    /// Creates a coordinator over the given ledger and sale store.
    pub fn new(
        ledger: Arc<dyn StockLedger>,
        sales: Arc<dyn SaleStore>,
        policy: PricingPolicy,
    ) -> Self {
        TransactionCoordinator {
            ledger,
            sales,
            policy,
        }
    }

    /// Converts a cart snapshot into an immutable, stock-consistent `Sale`.
    ///
    /// On any failure after reservations begin, every reservation of this
    /// attempt is released before the error surfaces; partial commits are
    /// never left visible. `Persistence` errors are safe to retry — the
    /// rollback has already run.
    pub async fn finalize(
        &self,
        snapshot: &CartSnapshot,
        payment_method: PaymentMethod,
    ) -> CheckoutResult<Sale> {
        let attempt = Uuid::new_v4().to_string();
        let mut phase = FinalizePhase::Validating;
        debug!(attempt = %attempt, ?phase, lines = snapshot.lines.len(), "finalize start");

        // Phase 1: validation. Nothing here touches the ledger.
        validate_cart_for_checkout(snapshot)?;

        // Phase 2: reserve every line in ascending-sku order.
        phase = FinalizePhase::Reserving;
        debug!(attempt = %attempt, ?phase, "entering");
        let mut ordered: Vec<SaleLineInput> = snapshot
            .lines
            .iter()
            .map(|l| SaleLineInput {
                sku: l.sku.clone(),
                quantity: l.quantity,
            })
            .collect();
        ordered.sort_by(|a, b| a.sku.cmp(&b.sku));

        let mut held: Vec<String> = Vec::with_capacity(ordered.len());
        for line in &ordered {
            match self.ledger.reserve(&line.sku, line.quantity).await {
                Ok(id) => {
                    debug!(attempt = %attempt, sku = %line.sku, qty = line.quantity, reservation = %id, "reserved");
                    held.push(id);
                }
                Err(err) => {
                    warn!(attempt = %attempt, sku = %line.sku, %err, "reservation failed, rolling back");
                    self.rollback(&attempt, &held).await;
                    phase = FinalizePhase::Aborted;
                    debug!(attempt = %attempt, ?phase, "finalize aborted");
                    return Err(err);
                }
            }
        }

        // Phase 3: price the now-reserved snapshot. Quantities cannot
        // change mid-flight because the ledger holds them.
        phase = FinalizePhase::Pricing;
        debug!(attempt = %attempt, ?phase, "entering");
        let totals = match PricingEngine::compute(snapshot, &self.policy) {
            Ok(t) => t,
            Err(err) => {
                self.rollback(&attempt, &held).await;
                return Err(err);
            }
        };

        // Phase 4: persist the sale and commit the reservations as one
        // atomic unit.
        phase = FinalizePhase::Persisting;
        debug!(attempt = %attempt, ?phase, "entering");
        let sale = build_sale(snapshot, payment_method, &totals);
        if let Err(err) = self.sales.persist_completed(&sale, &held).await {
            warn!(attempt = %attempt, %err, "persistence failed, rolling back");
            self.rollback(&attempt, &held).await;
            phase = FinalizePhase::Aborted;
            debug!(attempt = %attempt, ?phase, "finalize aborted");
            return Err(match err {
                // Stock and store conflicts keep their own identity
                e @ CheckoutError::ConcurrentModification(_) => e,
                e @ CheckoutError::Persistence(_) => e,
                other => CheckoutError::Persistence(other.to_string()),
            });
        }

        phase = FinalizePhase::Completed;
        info!(
            attempt = %attempt,
            ?phase,
            sale_id = %sale.id,
            grand_total = sale.grand_total_cents,
            lines = sale.lines.len(),
            "sale finalized"
        );
        Ok(sale)
    }

    /// Releases every reservation this attempt holds. Release is idempotent
    /// and restores stock for held reservations, so a rollback leaves the
    /// ledger exactly as the attempt found it.
    async fn rollback(&self, attempt: &str, held: &[String]) {
        for id in held {
            if let Err(err) = self.ledger.release(id).await {
                // The reservation stays visible in the ledger for manual
                // reconciliation; nothing more can be done from here.
                warn!(attempt = %attempt, reservation = %id, %err, "rollback release failed");
            }
        }
    }
}

struct SaleLineInput {
    sku: String,
    quantity: i64,
}

/// Freezes the snapshot into an immutable sale record.
fn build_sale(
    snapshot: &CartSnapshot,
    payment_method: PaymentMethod,
    totals: &gearbox_core::Totals,
) -> Sale {
    let lines = snapshot
        .lines
        .iter()
        .map(|l| SaleLine {
            sku: l.sku.clone(),
            name: l.name.clone(),
            unit_price_cents: l.unit_price_cents,
            quantity: l.quantity,
            line_discount_cents: l.line_discount_cents,
            line_total_cents: l.line_total().cents(),
        })
        .collect();

    Sale {
        id: Uuid::new_v4().to_string(),
        customer_ref: snapshot.customer_ref.clone(),
        lines,
        subtotal_cents: totals.subtotal_cents,
        discount_total_cents: totals.discount_total_cents,
        tax_total_cents: totals.tax_total_cents,
        grand_total_cents: totals.grand_total_cents,
        payment_method,
        status: SaleStatus::Completed,
        notes: snapshot.notes.clone(),
        created_at: Utc::now(),
        refunded_at: None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryInventory, InMemorySaleStore};
    use crate::session::CartManager;
    use async_trait::async_trait;
    use gearbox_core::AggregateDiscount;

    fn fixtures() -> (
        Arc<InMemoryInventory>,
        Arc<InMemorySaleStore>,
        TransactionCoordinator,
    ) {
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.add_product("BRK-001", "Brake Pad Set", 10_000, 5, "set");
        inventory.add_product("OIL-5W30", "Engine Oil 5W30", 4_500, 20, "litre");
        inventory.add_product("AIR-220", "Air Filter", 2_200, 3, "piece");

        let sales = Arc::new(InMemorySaleStore::new(inventory.clone()));
        let coordinator = TransactionCoordinator::new(
            inventory.clone(),
            sales.clone(),
            PricingPolicy::default(),
        );
        (inventory, sales, coordinator)
    }

    async fn snapshot_for(
        inventory: &Arc<InMemoryInventory>,
        sku: &str,
        qty: i64,
        discount: AggregateDiscount,
    ) -> CartSnapshot {
        let mut session = CartManager::new(inventory.clone());
        session.add_item(sku, qty).await.unwrap();
        session.set_aggregate_discount(discount);
        session.snapshot()
    }

    #[tokio::test]
    async fn test_finalize_reference_scenario() {
        let (inventory, sales, coordinator) = fixtures();
        let snap =
            snapshot_for(&inventory, "BRK-001", 3, AggregateDiscount::Fixed(1_000)).await;

        let sale = coordinator
            .finalize(&snap, PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(sale.subtotal_cents, 30_000);
        assert_eq!(sale.discount_total_cents, 1_000);
        assert_eq!(sale.tax_total_cents, 4_350);
        assert_eq!(sale.grand_total_cents, 33_350);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(inventory.stock_of("BRK-001"), 2);

        // Sale is durable and readable back
        let stored = sales.fetch(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.grand_total_cents, 33_350);
    }

    #[tokio::test]
    async fn test_finalize_oversell_fails_and_leaves_stock() {
        let (inventory, _sales, coordinator) = fixtures();
        // Build the snapshot directly; the advisory cart check would catch
        // this too, but the ledger must be the authority.
        let mut session = CartManager::new(inventory.clone());
        session.add_item("BRK-001", 5).await.unwrap();
        let mut snap = session.snapshot();
        snap.lines[0].quantity = 6; // simulate a stale advisory view

        let err = coordinator
            .finalize(&snap, PaymentMethod::Cash)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { ref sku, .. } if sku == "BRK-001"
        ));
        assert_eq!(inventory.stock_of("BRK-001"), 5);
    }

    #[tokio::test]
    async fn test_partial_reservation_rolls_back() {
        let (inventory, _sales, coordinator) = fixtures();
        let mut session = CartManager::new(inventory.clone());
        session.add_item("AIR-220", 3).await.unwrap(); // fits (stock 3)
        session.add_item("BRK-001", 5).await.unwrap(); // fits (stock 5)
        let mut snap = session.snapshot();
        // Second-in-sku-order line becomes unsatisfiable
        for line in &mut snap.lines {
            if line.sku == "BRK-001" {
                line.quantity = 6;
            }
        }

        let err = coordinator
            .finalize(&snap, PaymentMethod::Card)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        // AIR-220 was reserved first (sku-ascending) and must be restored
        assert_eq!(inventory.stock_of("AIR-220"), 3);
        assert_eq!(inventory.stock_of("BRK-001"), 5);
    }

    #[tokio::test]
    async fn test_empty_cart_never_touches_ledger() {
        let (inventory, _sales, coordinator) = fixtures();
        let session = CartManager::new(inventory.clone());

        let err = coordinator
            .finalize(&session.snapshot(), PaymentMethod::Cash)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(inventory.stock_of("BRK-001"), 5);
    }

    #[tokio::test]
    async fn test_invalid_discount_rejected_before_reserving() {
        let (inventory, _sales, coordinator) = fixtures();
        let snap = snapshot_for(
            &inventory,
            "BRK-001",
            2,
            AggregateDiscount::Percentage(10_001),
        )
        .await;

        let err = coordinator
            .finalize(&snap, PaymentMethod::Cash)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidDiscount(_)));
        assert_eq!(inventory.stock_of("BRK-001"), 5);
    }

    /// A sale store that always fails, to exercise the rollback path.
    struct FailingSaleStore;

    #[async_trait]
    impl SaleStore for FailingSaleStore {
        async fn persist_completed(&self, _: &Sale, _: &[String]) -> CheckoutResult<()> {
            Err(CheckoutError::Persistence("disk on fire".to_string()))
        }
        async fn fetch(&self, _: &str) -> CheckoutResult<Option<Sale>> {
            Ok(None)
        }
        async fn list(&self) -> CheckoutResult<Vec<Sale>> {
            Ok(Vec::new())
        }
        async fn mark_refunded(
            &self,
            id: &str,
            _: chrono::DateTime<Utc>,
        ) -> CheckoutResult<Sale> {
            Err(CheckoutError::SaleNotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_releases_reservations() {
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.add_product("BRK-001", "Brake Pad Set", 10_000, 5, "set");
        let coordinator = TransactionCoordinator::new(
            inventory.clone(),
            Arc::new(FailingSaleStore),
            PricingPolicy::default(),
        );

        let snap =
            snapshot_for(&inventory, "BRK-001", 3, AggregateDiscount::none()).await;
        let err = coordinator
            .finalize(&snap, PaymentMethod::Cash)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Persistence(_)));
        // Rollback restored the held stock; the caller may simply retry
        assert_eq!(inventory.stock_of("BRK-001"), 5);
    }

    #[tokio::test]
    async fn test_concurrent_finalize_one_winner() {
        let (inventory, sales, _) = fixtures();
        let coordinator = Arc::new(TransactionCoordinator::new(
            inventory.clone(),
            sales.clone(),
            PricingPolicy::default(),
        ));

        // 4 + 4 > 5 available: exactly one attempt may win
        let snap_a =
            snapshot_for(&inventory, "BRK-001", 4, AggregateDiscount::none()).await;
        let snap_b =
            snapshot_for(&inventory, "BRK-001", 4, AggregateDiscount::none()).await;

        let (ca, cb) = (coordinator.clone(), coordinator.clone());
        let a = tokio::spawn(async move { ca.finalize(&snap_a, PaymentMethod::Cash).await });
        let b = tokio::spawn(async move { cb.finalize(&snap_b, PaymentMethod::Card).await });

        let ra = a.await.unwrap();
        let rb = b.await.unwrap();

        let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one finalize may win the stock");

        let loser = if ra.is_err() { ra } else { rb };
        assert!(matches!(
            loser.unwrap_err(),
            CheckoutError::InsufficientStock { .. }
        ));
        assert_eq!(inventory.stock_of("BRK-001"), 1); // 5 - 4
    }

    #[tokio::test]
    async fn test_repeated_finalizes_decrement_exactly() {
        let (inventory, _sales, coordinator) = fixtures();

        for _ in 0..4 {
            let snap =
                snapshot_for(&inventory, "OIL-5W30", 5, AggregateDiscount::none()).await;
            coordinator
                .finalize(&snap, PaymentMethod::Cash)
                .await
                .unwrap();
        }

        assert_eq!(inventory.stock_of("OIL-5W30"), 0);

        // A fifth attempt must fail with nothing left
        let mut session = CartManager::new(inventory.clone());
        let err = session.add_item("OIL-5W30", 5).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    }
}
