//! # Stock Ledger Repository
//!
//! The authoritative per-SKU availability counter, backed by a guarded
//! UPDATE.
//!
//! ## Why a Guarded UPDATE
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │  SET available_stock = available_stock - :qty                           │
//! │  WHERE sku = :sku AND available_stock >= :qty                           │
//! │                                                                         │
//! │  SQLite serializes writers, so the check and the decrement are one      │
//! │  atomic step. Two concurrent reserves of the last units cannot both     │
//! │  match the WHERE clause; the loser affects zero rows and is turned      │
//! │  into InsufficientStock. No read-then-write window exists.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State transitions on reservations are guarded the same way: the UPDATE
//! names the expected current state, and zero affected rows means another
//! actor got there first.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use gearbox_checkout::StockLedger;
use gearbox_core::{CheckoutError, CheckoutResult, MAX_LINE_QUANTITY};

use crate::error::StoreError;

/// SQLite-backed stock ledger.
#[derive(Debug, Clone)]
pub struct SqliteStockLedger {
    pool: SqlitePool,
}

impl SqliteStockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStockLedger { pool }
    }

    /// Current state of a reservation, for tests and diagnostics.
    pub async fn reservation_state(&self, reservation_id: &str) -> CheckoutResult<Option<String>> {
        let row = sqlx::query("SELECT state FROM stock_reservations WHERE id = ?1")
            .bind(reservation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        match row {
            Some(r) => Ok(Some(r.try_get("state").map_err(StoreError::from)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StockLedger for SqliteStockLedger {
    async fn check_available(&self, sku: &str, quantity: i64) -> CheckoutResult<bool> {
        let row = sqlx::query("SELECT available_stock FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?
            .ok_or_else(|| CheckoutError::ProductNotFound(sku.to_string()))?;

        let available: i64 = row.try_get("available_stock").map_err(StoreError::from)?;
        Ok(available >= quantity)
    }

    async fn reserve(&self, sku: &str, quantity: i64) -> CheckoutResult<String> {
        if quantity <= 0 || quantity > MAX_LINE_QUANTITY {
            return Err(CheckoutError::InvalidQuantity {
                sku: sku.to_string(),
                quantity,
            });
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        let now = Utc::now();

        // Atomic check-and-decrement. Zero affected rows means the sku is
        // unknown, inactive, or short on stock; disambiguate below.
        let affected = sqlx::query(
            r#"
            UPDATE products
            SET available_stock = available_stock - ?1, updated_at = ?2
            WHERE sku = ?3 AND is_active = 1 AND available_stock >= ?1
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(sku)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        if affected == 0 {
            let row = sqlx::query(
                "SELECT available_stock FROM products WHERE sku = ?1 AND is_active = 1",
            )
            .bind(sku)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;

            tx.rollback().await.map_err(StoreError::from)?;

            return match row {
                Some(r) => {
                    let available: i64 =
                        r.try_get("available_stock").map_err(StoreError::from)?;
                    Err(CheckoutError::InsufficientStock {
                        sku: sku.to_string(),
                        available,
                        requested: quantity,
                    })
                }
                None => Err(CheckoutError::ProductNotFound(sku.to_string())),
            };
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO stock_reservations (id, sku, quantity, state, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'held', ?4, ?4)
            "#,
        )
        .bind(&id)
        .bind(sku)
        .bind(quantity)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;

        debug!(sku = %sku, quantity, reservation = %id, "stock reserved");
        Ok(id)
    }

    async fn commit(&self, reservation_id: &str) -> CheckoutResult<()> {
        let affected = sqlx::query(
            r#"
            UPDATE stock_reservations
            SET state = 'committed', updated_at = ?1
            WHERE id = ?2 AND state = 'held'
            "#,
        )
        .bind(Utc::now())
        .bind(reservation_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        if affected == 1 {
            debug!(reservation = %reservation_id, "reservation committed");
            return Ok(());
        }

        // Zero rows: already committed (fine), released (conflict), or gone.
        match self.reservation_state(reservation_id).await? {
            Some(state) if state == "committed" => Ok(()),
            Some(state) => Err(CheckoutError::ConcurrentModification(format!(
                "reservation {reservation_id} is {state}, cannot commit"
            ))),
            None => Err(CheckoutError::Persistence(format!(
                "unknown reservation {reservation_id}"
            ))),
        }
    }

    async fn release(&self, reservation_id: &str) -> CheckoutResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        let now = Utc::now();

        let row = sqlx::query("SELECT sku, quantity, state FROM stock_reservations WHERE id = ?1")
            .bind(reservation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(StoreError::from)?;
            return Err(CheckoutError::Persistence(format!(
                "unknown reservation {reservation_id}"
            )));
        };

        let state: String = row.try_get("state").map_err(StoreError::from)?;
        if state == "released" {
            // Idempotent: releasing twice never double-credits.
            tx.rollback().await.map_err(StoreError::from)?;
            return Ok(());
        }

        let sku: String = row.try_get("sku").map_err(StoreError::from)?;
        let quantity: i64 = row.try_get("quantity").map_err(StoreError::from)?;

        // Guard on the observed state; a concurrent transition loses here.
        let affected = sqlx::query(
            r#"
            UPDATE stock_reservations
            SET state = 'released', updated_at = ?1
            WHERE id = ?2 AND state = ?3
            "#,
        )
        .bind(now)
        .bind(reservation_id)
        .bind(&state)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        if affected == 0 {
            tx.rollback().await.map_err(StoreError::from)?;
            return Err(CheckoutError::ConcurrentModification(format!(
                "reservation {reservation_id} changed state during release"
            )));
        }

        sqlx::query(
            "UPDATE products SET available_stock = available_stock + ?1, updated_at = ?2 WHERE sku = ?3",
        )
        .bind(quantity)
        .bind(now)
        .bind(&sku)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;

        debug!(reservation = %reservation_id, sku = %sku, quantity, "reservation released");
        Ok(())
    }

    async fn restock(&self, sku: &str, quantity: i64) -> CheckoutResult<()> {
        if quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity {
                sku: sku.to_string(),
                quantity,
            });
        }

        let affected = sqlx::query(
            "UPDATE products SET available_stock = available_stock + ?1, updated_at = ?2 WHERE sku = ?3",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(sku)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        if affected == 0 {
            return Err(CheckoutError::ProductNotFound(sku.to_string()));
        }

        debug!(sku = %sku, quantity, "stock credited");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};
    use crate::testing::part;

    async fn seeded_store() -> Store {
        let store = Store::connect(StoreConfig::in_memory()).await.unwrap();
        store
            .catalog()
            .upsert(&part("BRK-001", "Brake Pad Set", 10_000, 5))
            .await
            .unwrap();
        store
    }

    async fn stock_of(store: &Store, sku: &str) -> i64 {
        let row = sqlx::query("SELECT available_stock FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_one(store.pool())
            .await
            .unwrap();
        row.try_get("available_stock").unwrap()
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let id = ledger.reserve("BRK-001", 3).await.unwrap();
        assert_eq!(stock_of(&store, "BRK-001").await, 2);
        assert_eq!(
            ledger.reservation_state(&id).await.unwrap().as_deref(),
            Some("held")
        );
    }

    #[tokio::test]
    async fn test_oversell_fails_without_side_effects() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let err = ledger.reserve("BRK-001", 6).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
        assert_eq!(stock_of(&store, "BRK-001").await, 5);
    }

    #[tokio::test]
    async fn test_reserve_unknown_sku() {
        let store = seeded_store().await;
        let err = store.stock_ledger().reserve("NOPE-404", 1).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_release_restores_stock_once() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let id = ledger.reserve("BRK-001", 3).await.unwrap();
        ledger.release(&id).await.unwrap();
        assert_eq!(stock_of(&store, "BRK-001").await, 5);

        // Second release is a no-op, not a double credit
        ledger.release(&id).await.unwrap();
        assert_eq!(stock_of(&store, "BRK-001").await, 5);
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let id = ledger.reserve("BRK-001", 2).await.unwrap();
        ledger.commit(&id).await.unwrap();
        ledger.commit(&id).await.unwrap();
        assert_eq!(
            ledger.reservation_state(&id).await.unwrap().as_deref(),
            Some("committed")
        );
        assert_eq!(stock_of(&store, "BRK-001").await, 3);
    }

    #[tokio::test]
    async fn test_commit_after_release_conflicts() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let id = ledger.reserve("BRK-001", 2).await.unwrap();
        ledger.release(&id).await.unwrap();

        let err = ledger.commit(&id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ConcurrentModification(_)));
    }

    #[tokio::test]
    async fn test_release_committed_restores_stock() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let id = ledger.reserve("BRK-001", 2).await.unwrap();
        ledger.commit(&id).await.unwrap();
        ledger.release(&id).await.unwrap();
        assert_eq!(stock_of(&store, "BRK-001").await, 5);
    }

    #[tokio::test]
    async fn test_restock_credits_fresh_stock() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        ledger.restock("BRK-001", 10).await.unwrap();
        assert_eq!(stock_of(&store, "BRK-001").await, 15);
    }

    // In-memory SQLite pins the pool to one connection, which serializes
    // everything before it reaches the database. A file-backed database with
    // a real pool lets the two reserves race the guarded UPDATE itself.
    #[tokio::test]
    async fn test_concurrent_reserves_exactly_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::connect(
            StoreConfig::new(dir.path().join("race.db")).max_connections(4),
        )
        .await
        .unwrap();
        store
            .catalog()
            .upsert(&part("BRK-001", "Brake Pad Set", 10_000, 5))
            .await
            .unwrap();

        let first = store.stock_ledger();
        let second = store.stock_ledger();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.reserve("BRK-001", 4).await }),
            tokio::spawn(async move { second.reserve("BRK-001", 4).await }),
        );
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            CheckoutError::InsufficientStock { requested: 4, .. }
        ));
        assert_eq!(stock_of(&store, "BRK-001").await, 1);

        store.close().await;
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();

        let err = ledger.reserve("BRK-001", 0).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidQuantity { .. }));
        let err = ledger.restock("BRK-001", -1).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidQuantity { .. }));
    }
}
