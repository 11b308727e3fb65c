//! # Product Repository
//!
//! Database operations for products and per-outlet stock.
//!
//! ## Key Operations
//! - Create products, allocating a shelf barcode when none is given
//! - Lookups by id, SKU or barcode
//! - Delta-based stock updates per outlet
//!
//! ## Stock Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  outlet_stock (outlet_id, product_id) → quantity                        │
//! │                                                                         │
//! │  Every movement is a DELTA, never an absolute overwrite:               │
//! │    sale at BLR-01 of 2       → BLR-01 −2                               │
//! │    transfer BLR-01 → MYS-02  → BLR-01 −5 on dispatch                   │
//! │                                MYS-02 +5 on receipt                    │
//! │    material consumption      → outlet −n                               │
//! │                                                                         │
//! │  Two writers applying −3 and −2 always end at −5 in total.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use stitch_core::validation::{validate_name, validate_non_negative, validate_required_id, validate_sku};
use stitch_core::{BarcodeStrategy, CoreError, Money, Product, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::barcode::BarcodeRepository;
use crate::repository::begin_write;

const PRODUCT_COLUMNS: &str =
    "id, sku, barcode, name, category, mrp_cents, is_active, created_at, updated_at";

/// Input for [`ProductRepository::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub mrp: Money,
    /// `None` allocates the next shelf code.
    pub barcode: Option<String>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create(new_product).await?;
/// let found = repo.get_by_barcode("A-001").await?;
/// repo.adjust_stock(&outlet_id, &product.id, 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    barcode_strategy: BarcodeStrategy,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, barcode_strategy: BarcodeStrategy) -> Self {
        ProductRepository {
            pool,
            barcode_strategy,
        }
    }

    /// Creates a product.
    ///
    /// When `barcode` is `None` the next shelf code is issued in the same
    /// transaction, so a failed insert does not burn a code.
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        validate_sku(&new.sku)?;
        validate_name("name", &new.name)?;
        validate_non_negative("mrp", new.mrp)?;

        let mut tx = begin_write(&self.pool).await?;

        let barcode = match new.barcode.as_deref().map(str::trim) {
            Some("") => {
                return Err(ValidationError::Required {
                    field: "barcode".to_string(),
                }
                .into())
            }
            Some(code) => code.to_string(),
            None => BarcodeRepository::next_in(&mut tx, self.barcode_strategy)
                .await?
                .to_string(),
        };

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: new.sku.trim().to_string(),
            barcode: Some(barcode),
            name: new.name.trim().to_string(),
            category: new.category,
            mrp_cents: new.mrp.cents(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, barcode = ?product.barcode, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, category, mrp_cents,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.mrp_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.contains("sku") => {
                DbError::duplicate("sku", &product.sku)
            }
            DbError::UniqueViolation { field, .. } if field.contains("barcode") => {
                DbError::duplicate("barcode", product.barcode.clone().unwrap_or_default())
            }
            other => other,
        })?;

        tx.commit().await?;
        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_in(&mut conn, id).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Scanner lookup.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Retires or restores a product. Historical sales keep referencing it.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Quantity on hand at an outlet; unknown pairs hold zero.
    pub async fn stock(&self, outlet_id: &str, product_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        stock_in(&mut conn, outlet_id, product_id).await
    }

    /// Applies a stock delta (positive for goods in, negative for
    /// corrections) and returns the new quantity.
    pub async fn adjust_stock(&self, outlet_id: &str, product_id: &str, delta: i64) -> DbResult<i64> {
        validate_required_id("outlet_id", outlet_id)?;
        validate_required_id("product_id", product_id)?;

        let mut conn = self.pool.acquire().await?;
        adjust_in(&mut conn, outlet_id, product_id, delta).await
    }
}

/// Product by id on a caller's connection.
pub(crate) async fn fetch_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

pub(crate) async fn stock_in(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    product_id: &str,
) -> DbResult<i64> {
    let quantity: Option<i64> = sqlx::query_scalar(
        "SELECT quantity FROM outlet_stock WHERE outlet_id = ?1 AND product_id = ?2",
    )
    .bind(outlet_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(quantity.unwrap_or(0))
}

pub(crate) async fn adjust_in(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    product_id: &str,
    delta: i64,
) -> DbResult<i64> {
    debug!(outlet_id, product_id, delta, "Adjusting stock");

    let quantity: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO outlet_stock (outlet_id, product_id, quantity, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(outlet_id, product_id) DO UPDATE SET
            quantity = quantity + excluded.quantity,
            updated_at = excluded.updated_at
        RETURNING quantity
        "#,
    )
    .bind(outlet_id)
    .bind(product_id)
    .bind(delta)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(quantity)
}

/// Removes `quantity` from an outlet, refusing to go below zero.
pub(crate) async fn take_in(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    product_id: &str,
    quantity: i64,
) -> DbResult<i64> {
    let available = stock_in(conn, outlet_id, product_id).await?;
    if available < quantity {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            outlet_id: outlet_id.to_string(),
            available,
            requested: quantity,
        }
        .into());
    }

    adjust_in(conn, outlet_id, product_id, -quantity).await
}

// =============================================================================
// Unit Tests
// =============================================================================
