//! # Barcode Repository
//!
//! Allocates shelf codes (`A-001` .. `Z-999`) for new products.
//!
//! ## Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Counter (default)                                                      │
//! │    sequence_counters['@barcode'].next_number = ordinal of next code    │
//! │    first use: seed from the newest existing product code               │
//! │    then:      UPDATE .. RETURNING, same as document numbers            │
//! │                                                                         │
//! │  LatestRow (legacy)                                                     │
//! │    SELECT barcode FROM products                                        │
//! │     WHERE barcode GLOB '[A-Z]-[0-9][0-9][0-9]'                         │
//! │     ORDER BY created_at DESC                                           │
//! │    → advance the newest code                                           │
//! │    Two concurrent callers can read the same newest code.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use stitch_core::barcode::{next_after_latest, BarcodeCode, BarcodeStrategy, CYCLE_LEN};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, sequence};

/// Counter key for barcode allocation. `@` keeps it out of the document
/// prefix namespace.
pub const BARCODE_COUNTER_KEY: &str = "@barcode";

/// Repository for barcode allocation.
#[derive(Debug, Clone)]
pub struct BarcodeRepository {
    pool: SqlitePool,
    strategy: BarcodeStrategy,
}

impl BarcodeRepository {
    pub fn new(pool: SqlitePool, strategy: BarcodeStrategy) -> Self {
        BarcodeRepository { pool, strategy }
    }

    pub fn strategy(&self) -> BarcodeStrategy {
        self.strategy
    }

    /// Issues the next code in its own transaction.
    pub async fn next_barcode(&self) -> DbResult<String> {
        let mut tx = begin_write(&self.pool).await?;
        let code = Self::next_in(&mut tx, self.strategy).await?;
        tx.commit().await?;
        Ok(code.to_string())
    }

    /// Issues the next code on a caller-owned connection or transaction.
    pub async fn next_in(
        conn: &mut SqliteConnection,
        strategy: BarcodeStrategy,
    ) -> DbResult<BarcodeCode> {
        let code = match strategy {
            BarcodeStrategy::Counter => from_counter(conn).await?,
            BarcodeStrategy::LatestRow => next_from_products(conn).await?,
        };

        debug!(code = %code, ?strategy, "Issued barcode");
        Ok(code)
    }

    /// Code the legacy scan would issue next, without issuing anything.
    pub async fn peek_latest_row(&self) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        Ok(next_from_products(&mut conn).await?.to_string())
    }
}

/// The code after the newest well-formed product code (`A-001` when there
/// is none).
async fn next_from_products(conn: &mut SqliteConnection) -> DbResult<BarcodeCode> {
    let newest: Option<String> = sqlx::query_scalar(
        r#"
        SELECT barcode
        FROM products
        WHERE barcode GLOB '[A-Z]-[0-9][0-9][0-9]'
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(next_after_latest(newest))
}

async fn from_counter(conn: &mut SqliteConnection) -> DbResult<BarcodeCode> {
    // Write before reading products: a deferred transaction that reads
    // first cannot upgrade once another writer has committed.
    let mut ordinal = match sequence::consume(conn, BARCODE_COUNTER_KEY).await? {
        Some((ordinal, _)) => ordinal,
        None => {
            let seed = next_from_products(conn).await?;
            info!(seed = %seed, "Seeding barcode counter from existing products");
            sequence::advance(conn, BARCODE_COUNTER_KEY, seed.ordinal(), 0).await?.0
        }
    };

    // Codes typed in by hand on a product are passed over.
    for _ in 0..CYCLE_LEN {
        let code = BarcodeCode::from_ordinal(ordinal);
        if !code_in_use(conn, &code).await? {
            return Ok(code);
        }
        debug!(code = %code, "Shelf code already on a product, skipping");

        ordinal = sequence::consume(conn, BARCODE_COUNTER_KEY)
            .await?
            .map(|(ordinal, _)| ordinal)
            .ok_or_else(|| DbError::not_found("Sequence counter", BARCODE_COUNTER_KEY))?;
    }

    Err(DbError::Internal("every shelf code from A-001 to Z-999 is in use".to_string()))
}

async fn code_in_use(conn: &mut SqliteConnection, code: &BarcodeCode) -> DbResult<bool> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE barcode = ?1)")
        .bind(code.to_string())
        .fetch_one(&mut *conn)
        .await?;
    Ok(taken)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};
    use stitch_core::Money;

    async fn test_db(strategy: BarcodeStrategy) -> Database {
        Database::new(DbConfig::in_memory().barcode_strategy(strategy))
            .await
            .unwrap()
    }

    fn product(sku: &str, barcode: &str) -> NewProduct {
        NewProduct {
            barcode: Some(barcode.to_string()),
            ..auto_product(sku)
        }
    }

    fn auto_product(sku: &str) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category: None,
            mrp: Money::from_major(999),
            barcode: None,
        }
    }

    #[tokio::test]
    async fn test_first_code_is_a001() {
        let db = test_db(BarcodeStrategy::Counter).await;
        assert_eq!(db.barcodes().next_barcode().await.unwrap(), "A-001");
        assert_eq!(db.barcodes().next_barcode().await.unwrap(), "A-002");
    }

    #[tokio::test]
    async fn test_thousandth_code_is_b001() {
        let db = test_db(BarcodeStrategy::Counter).await;
        let repo = db.barcodes();

        let mut last = String::new();
        for call in 1..=1000 {
            last = repo.next_barcode().await.unwrap();
            if call == 999 {
                assert_eq!(last, "A-999");
            }
        }
        assert_eq!(last, "B-001");
    }

    #[tokio::test]
    async fn test_counter_wraps_after_z999() {
        let db = test_db(BarcodeStrategy::Counter).await;
        let repo = db.barcodes();
        repo.next_barcode().await.unwrap();

        sqlx::query("UPDATE sequence_counters SET next_number = ?1 WHERE prefix = ?2")
            .bind(CYCLE_LEN)
            .bind(BARCODE_COUNTER_KEY)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(repo.next_barcode().await.unwrap(), "Z-999");
        assert_eq!(repo.next_barcode().await.unwrap(), "A-001");
    }

    #[tokio::test]
    async fn test_counter_seeds_from_newest_product() {
        let db = test_db(BarcodeStrategy::Counter).await;
        let products = db.products();
        products.create(product("OLD", "C-119")).await.unwrap();
        products.create(product("EAN", "8901234567890")).await.unwrap();
        products.create(product("NEW", "C-120")).await.unwrap();
        products.create(product("BAD", "c-999")).await.unwrap();

        let repo = db.barcodes();
        assert_eq!(repo.next_barcode().await.unwrap(), "C-121");
        assert_eq!(repo.next_barcode().await.unwrap(), "C-122");
    }

    #[tokio::test]
    async fn test_latest_row_strategy_follows_products() {
        let db = test_db(BarcodeStrategy::LatestRow).await;
        let repo = db.barcodes();

        assert_eq!(repo.next_barcode().await.unwrap(), "A-001");
        // nothing was stored, so the scan sees the same state again
        assert_eq!(repo.next_barcode().await.unwrap(), "A-001");

        db.products().create(product("S1", "K-999")).await.unwrap();
        assert_eq!(repo.next_barcode().await.unwrap(), "L-001");
        assert_eq!(repo.peek_latest_row().await.unwrap(), "L-001");
    }

    #[tokio::test]
    async fn test_counter_skips_codes_entered_by_hand() {
        let db = test_db(BarcodeStrategy::Counter).await;
        let products = db.products();

        let first = products.create(auto_product("P1")).await.unwrap();
        assert_eq!(first.barcode.as_deref(), Some("A-001"));

        products.create(product("P2", "A-002")).await.unwrap();
        products.create(product("P3", "A-004")).await.unwrap();

        let third = products.create(auto_product("P4")).await.unwrap();
        assert_eq!(third.barcode.as_deref(), Some("A-003"));
        let fifth = products.create(auto_product("P5")).await.unwrap();
        assert_eq!(fifth.barcode.as_deref(), Some("A-005"));

        assert_eq!(db.barcodes().next_barcode().await.unwrap(), "A-006");
    }
}
