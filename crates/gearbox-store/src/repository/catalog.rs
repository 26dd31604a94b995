//! # Product Catalog Repository
//!
//! Read access to the product table, plus the upsert used for seeding.
//! The transaction core treats the catalog as externally owned: lookups
//! only, never price or metadata mutation.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use gearbox_checkout::Catalog;
use gearbox_core::{CheckoutResult, Product};

use crate::error::{StoreError, StoreResult};

/// SQLite-backed product catalog.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "sku, name, unit_price_cents, available_stock, min_stock, \
     unit, is_active, created_at, updated_at";

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCatalog { pool }
    }

    /// Inserts a product or updates all its mutable fields by sku.
    ///
    /// Seeding and catalog-sync entry point; checkout never calls this.
    pub async fn upsert(&self, product: &Product) -> StoreResult<()> {
        debug!(sku = %product.sku, "upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                sku, name, unit_price_cents, available_stock, min_stock,
                unit, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(sku) DO UPDATE SET
                name = excluded.name,
                unit_price_cents = excluded.unit_price_cents,
                available_stock = excluded.available_stock,
                min_stock = excluded.min_stock,
                unit = excluded.unit,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(product.available_stock)
        .bind(product.min_stock)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All products including inactive ones, sku-ascending.
    pub async fn all_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY sku ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(product_from_row(row)?);
        }
        Ok(products)
    }

    async fn fetch(&self, sku: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.map(product_from_row).transpose()
    }
}

/// Maps a product row into the domain type.
pub(crate) fn product_from_row(row: SqliteRow) -> StoreResult<Product> {
    Ok(Product {
        sku: row.try_get("sku").map_err(StoreError::from)?,
        name: row.try_get("name").map_err(StoreError::from)?,
        unit_price_cents: row.try_get("unit_price_cents").map_err(StoreError::from)?,
        available_stock: row.try_get("available_stock").map_err(StoreError::from)?,
        min_stock: row.try_get("min_stock").map_err(StoreError::from)?,
        unit: row.try_get("unit").map_err(StoreError::from)?,
        is_active: row.try_get("is_active").map_err(StoreError::from)?,
        created_at: row.try_get("created_at").map_err(StoreError::from)?,
        updated_at: row.try_get("updated_at").map_err(StoreError::from)?,
    })
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn product(&self, sku: &str) -> CheckoutResult<Option<Product>> {
        Ok(self.fetch(sku).await?)
    }

    async fn active_products(&self) -> CheckoutResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY sku ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(product_from_row(row)?);
        }
        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
