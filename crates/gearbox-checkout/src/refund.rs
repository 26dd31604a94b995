//! # Refund Processor
//!
//! Full reversal of a completed sale: flip the status, credit the stock
//! back. Partial refunds are out of scope; a sale is refunded in its
//! entirety or not at all.
//!
//! The status transition runs FIRST and is an atomic check-and-set inside
//! the sale store. Only the attempt that wins the transition proceeds to
//! restock, so concurrent refunds of the same sale can never double-credit
//! inventory.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use gearbox_core::{CheckoutResult, Sale};

use crate::traits::{SaleStore, StockLedger};

/// Reverses completed sales.
pub struct RefundProcessor {
    ledger: Arc<dyn StockLedger>,
    sales: Arc<dyn SaleStore>,
}

impl RefundProcessor {
    pub fn new(ledger: Arc<dyn StockLedger>, sales: Arc<dyn SaleStore>) -> Self {
        RefundProcessor { ledger, sales }
    }

    /// Refunds the sale with the given id.
    ///
    /// Fails with `SaleNotFound` for unknown ids and `AlreadyRefunded` if
    /// the sale has been reversed before. The returned sale carries status
    /// `refunded`, a `refunded_at` timestamp, and its original totals
    /// untouched — the record of what was charged stays immutable.
    pub async fn refund(&self, sale_id: &str) -> CheckoutResult<Sale> {
        // Win the completed -> refunded transition before touching stock.
        let sale = self.sales.mark_refunded(sale_id, Utc::now()).await?;

        for line in &sale.lines {
            if let Err(err) = self.ledger.restock(&line.sku, line.quantity).await {
                // The sale is already marked refunded; a failed credit is
                // surfaced for manual reconciliation rather than unwound,
                // since unwinding the status would invite a double charge.
                warn!(
                    sale_id = %sale.id,
                    sku = %line.sku,
                    quantity = line.quantity,
                    %err,
                    "restock failed during refund"
                );
                return Err(err);
            }
        }

        info!(
            sale_id = %sale.id,
            lines = sale.lines.len(),
            grand_total = sale.grand_total_cents,
            "sale refunded"
        );
        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
