//! # Sale Repository
//!
//! Durable storage for finalized sales.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  persist_completed runs ONE database transaction:                       │
//! │                                                                         │
//! │    INSERT INTO sales            ── the immutable header                 │
//! │    INSERT INTO sale_lines × N   ── frozen price snapshots               │
//! │    UPDATE stock_reservations    ── held → committed, per reservation    │
//! │                                                                         │
//! │  Any failure rolls back all of it. There is no window where the sale    │
//! │  exists without its commits, or vice versa.                             │
//! │                                                                         │
//! │  mark_refunded is a status-guarded UPDATE:                              │
//! │                                                                         │
//! │    UPDATE sales SET status = 'refunded'                                 │
//! │    WHERE id = :id AND status = 'completed'                              │
//! │                                                                         │
//! │  Zero affected rows → AlreadyRefunded or SaleNotFound. The transition   │
//! │  happens at most once regardless of concurrent attempts.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use gearbox_checkout::SaleStore;
use gearbox_core::{CheckoutError, CheckoutResult, PaymentMethod, Sale, SaleLine, SaleStatus};

use crate::error::{StoreError, StoreResult};

/// SQLite-backed sale store.
#[derive(Debug, Clone)]
pub struct SqliteSaleStore {
    pool: SqlitePool,
}

impl SqliteSaleStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteSaleStore { pool }
    }

    async fn lines_for(&self, sale_id: &str) -> StoreResult<Vec<SaleLine>> {
        let rows = sqlx::query(
            r#"
            SELECT sku, name, unit_price_cents, quantity, line_discount_cents, line_total_cents
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY line_no ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            lines.push(SaleLine {
                sku: row.try_get("sku")?,
                name: row.try_get("name")?,
                unit_price_cents: row.try_get("unit_price_cents")?,
                quantity: row.try_get("quantity")?,
                line_discount_cents: row.try_get("line_discount_cents")?,
                line_total_cents: row.try_get("line_total_cents")?,
            });
        }
        Ok(lines)
    }
}

const SALE_COLUMNS: &str = "id, customer_ref, subtotal_cents, discount_total_cents, \
     tax_total_cents, grand_total_cents, payment_method, status, notes, created_at, refunded_at";

/// Maps a sale header row (without lines) into the domain type.
fn sale_from_row(row: SqliteRow) -> StoreResult<Sale> {
    let payment_raw: String = row.try_get("payment_method")?;
    let payment_method = PaymentMethod::parse(&payment_raw)
        .ok_or_else(|| StoreError::CorruptRow(format!("payment_method '{payment_raw}'")))?;

    let status_raw: String = row.try_get("status")?;
    let status = SaleStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::CorruptRow(format!("status '{status_raw}'")))?;

    Ok(Sale {
        id: row.try_get("id")?,
        customer_ref: row.try_get("customer_ref")?,
        lines: Vec::new(),
        subtotal_cents: row.try_get("subtotal_cents")?,
        discount_total_cents: row.try_get("discount_total_cents")?,
        tax_total_cents: row.try_get("tax_total_cents")?,
        grand_total_cents: row.try_get("grand_total_cents")?,
        payment_method,
        status,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        refunded_at: row.try_get("refunded_at")?,
    })
}

#[async_trait]
impl SaleStore for SqliteSaleStore {
    async fn persist_completed(
        &self,
        sale: &Sale,
        reservation_ids: &[String],
    ) -> CheckoutResult<()> {
        debug!(sale_id = %sale.id, lines = sale.lines.len(), "persisting sale");

        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_ref, subtotal_cents, discount_total_cents,
                tax_total_cents, grand_total_cents, payment_method, status,
                notes, created_at, refunded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_ref)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_total_cents)
        .bind(sale.tax_total_cents)
        .bind(sale.grand_total_cents)
        .bind(sale.payment_method.as_str())
        .bind(sale.status.as_str())
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.refunded_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        for (line_no, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, line_no, sku, name, unit_price_cents,
                    quantity, line_discount_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.line_discount_cents)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        }

        // Flip each reservation held → committed inside the same
        // transaction. A reservation that is no longer held means another
        // actor interfered; the whole persist rolls back.
        let now = Utc::now();
        for reservation_id in reservation_ids {
            let affected = sqlx::query(
                r#"
                UPDATE stock_reservations
                SET state = 'committed', updated_at = ?1
                WHERE id = ?2 AND state = 'held'
                "#,
            )
            .bind(now)
            .bind(reservation_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?
            .rows_affected();

            if affected == 0 {
                tx.rollback().await.map_err(StoreError::from)?;
                return Err(CheckoutError::ConcurrentModification(format!(
                    "reservation {reservation_id} is no longer held"
                )));
            }
        }

        tx.commit().await.map_err(StoreError::from)?;

        debug!(sale_id = %sale.id, "sale persisted");
        Ok(())
    }

    async fn fetch(&self, id: &str) -> CheckoutResult<Option<Sale>> {
        let row = sqlx::query(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut sale = sale_from_row(row)?;
        sale.lines = self.lines_for(id).await?;
        Ok(Some(sale))
    }

    async fn list(&self) -> CheckoutResult<Vec<Sale>> {
        let rows = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let mut sale = sale_from_row(row)?;
            let lines = self.lines_for(&sale.id).await?;
            sale.lines = lines;
            sales.push(sale);
        }
        Ok(sales)
    }

    async fn mark_refunded(&self, id: &str, refunded_at: DateTime<Utc>) -> CheckoutResult<Sale> {
        let affected = sqlx::query(
            r#"
            UPDATE sales
            SET status = 'refunded', refunded_at = ?1
            WHERE id = ?2 AND status = 'completed'
            "#,
        )
        .bind(refunded_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?
        .rows_affected();

        if affected == 0 {
            // Lost the transition: either the sale is unknown or it has
            // already been refunded.
            return match self.fetch(id).await? {
                Some(_) => Err(CheckoutError::AlreadyRefunded(id.to_string())),
                None => Err(CheckoutError::SaleNotFound(id.to_string())),
            };
        }

        debug!(sale_id = %id, "sale marked refunded");
        self.fetch(id)
            .await?
            .ok_or_else(|| CheckoutError::SaleNotFound(id.to_string()))
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
    use gearbox_checkout::StockLedger;

    fn sample_sale(id: &str) -> Sale {
        Sale {
            id: id.to_string(),
            customer_ref: Some("walk-in".to_string()),
            lines: vec![SaleLine {
                sku: "BRK-001".to_string(),
                name: "Brake Pad Set".to_string(),
                unit_price_cents: 10_000,
                quantity: 3,
                line_discount_cents: 0,
                line_total_cents: 30_000,
            }],
            subtotal_cents: 30_000,
            discount_total_cents: 1_000,
            tax_total_cents: 4_350,
            grand_total_cents: 33_350,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            notes: None,
            created_at: Utc::now(),
            refunded_at: None,
        }
    }

    async fn seeded_store() -> Store {
        let store = Store::connect(StoreConfig::in_memory()).await.unwrap();
        store
            .catalog()
            .upsert(&part("BRK-001", "Brake Pad Set", 10_000, 5))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_persist_and_fetch_round_trip() {
        let store = seeded_store().await;
        let sales = store.sale_store();

        sales
            .persist_completed(&sample_sale("sale-1"), &[])
            .await
            .unwrap();

        let fetched = sales.fetch("sale-1").await.unwrap().unwrap();
        assert_eq!(fetched.grand_total_cents, 33_350);
        assert_eq!(fetched.lines.len(), 1);
        assert_eq!(fetched.lines[0].quantity, 3);
        assert_eq!(fetched.status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_persist_commits_reservations() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();
        let sales = store.sale_store();

        let reservation = ledger.reserve("BRK-001", 3).await.unwrap();
        sales
            .persist_completed(&sample_sale("sale-1"), &[reservation.clone()])
            .await
            .unwrap();

        assert_eq!(
            ledger.reservation_state(&reservation).await.unwrap().as_deref(),
            Some("committed")
        );
    }

    #[tokio::test]
    async fn test_persist_rolls_back_on_released_reservation() {
        let store = seeded_store().await;
        let ledger = store.stock_ledger();
        let sales = store.sale_store();

        let reservation = ledger.reserve("BRK-001", 3).await.unwrap();
        ledger.release(&reservation).await.unwrap();

        let err = sales
            .persist_completed(&sample_sale("sale-1"), &[reservation])
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ConcurrentModification(_)));

        // Sale insert rolled back with the failed commit
        assert!(sales.fetch("sale-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_refunded_once() {
        let store = seeded_store().await;
        let sales = store.sale_store();
        sales
            .persist_completed(&sample_sale("sale-1"), &[])
            .await
            .unwrap();

        let refunded = sales.mark_refunded("sale-1", Utc::now()).await.unwrap();
        assert_eq!(refunded.status, SaleStatus::Refunded);
        assert!(refunded.refunded_at.is_some());
        // Totals untouched by the status flip
        assert_eq!(refunded.grand_total_cents, 33_350);

        let err = sales.mark_refunded("sale-1", Utc::now()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::AlreadyRefunded(_)));
    }

    #[tokio::test]
    async fn test_mark_refunded_unknown_sale() {
        let store = seeded_store().await;
        let err = store
            .sale_store()
            .mark_refunded("ghost", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SaleNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = seeded_store().await;
        let sales = store.sale_store();

        let mut older = sample_sale("sale-old");
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        sales.persist_completed(&older, &[]).await.unwrap();
        sales
            .persist_completed(&sample_sale("sale-new"), &[])
            .await
            .unwrap();

        let all = sales.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "sale-new");
        assert_eq!(all[1].id, "sale-old");
    }

    #[tokio::test]
    async fn test_duplicate_sale_id_rejected() {
        let store = seeded_store().await;
        let sales = store.sale_store();
        sales
            .persist_completed(&sample_sale("sale-1"), &[])
            .await
            .unwrap();

        let err = sales
            .persist_completed(&sample_sale("sale-1"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Persistence(_)));
    }
}
