//! # Sequence Counter Repository
//!
//! Issues document numbers (`INV000042`, `CRN00007`, ...) from persisted
//! per-prefix counters.
//!
//! ## Issuance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  next("INV")                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT .. ON CONFLICT(prefix) DO NOTHING   (lazy create, next = 1)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE sequence_counters                                              │
//! │     SET next_number = next_number + 1                                  │
//! │   WHERE prefix = 'INV'                                                 │
//! │  RETURNING next_number - 1, pad_width       ◄── one atomic statement   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  format_number("INV", 42, 6) → "INV000042"                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read and the increment are the same statement, so two callers can
//! never observe the same value. SQLite holds the write lock until the
//! enclosing transaction ends; callers that issue a number inside a larger
//! operation use [`SequenceRepository::next_in`] so the number and the
//! document commit or roll back together.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use stitch_core::numbering::{default_pad_width, format_number, SequenceCounter};
use stitch_core::validation::{validate_pad_width, validate_prefix};
use stitch_core::DocumentFamily;

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;

/// Repository for document number counters.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
    default_pad_width: i64,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool, default_pad_width: i64) -> Self {
        SequenceRepository {
            pool,
            default_pad_width,
        }
    }

    /// Issues the next number for `prefix` in its own transaction.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let first = db.sequences().next("INV").await?;  // "INV000001"
    /// let second = db.sequences().next("INV").await?; // "INV000002"
    /// ```
    pub async fn next(&self, prefix: &str) -> DbResult<String> {
        let mut tx = begin_write(&self.pool).await?;
        let number = Self::next_in(&mut tx, prefix, self.default_pad_width).await?;
        tx.commit().await?;
        Ok(number)
    }

    /// Issues the next number for a known document family.
    pub async fn next_for(&self, family: DocumentFamily) -> DbResult<String> {
        self.next(family.prefix()).await
    }

    /// Issues the next number on a caller-owned connection or transaction.
    ///
    /// `fallback_pad_width` applies only when the counter row is created by
    /// this call and `prefix` is not a known [`DocumentFamily`].
    pub async fn next_in(
        conn: &mut SqliteConnection,
        prefix: &str,
        fallback_pad_width: i64,
    ) -> DbResult<String> {
        validate_prefix(prefix)?;

        let pad_width = default_pad_width(prefix, fallback_pad_width);
        let (issued, pad_width) = advance(conn, prefix, 1, pad_width).await?;
        let number = format_number(prefix, issued, pad_width);

        debug!(prefix, number = %number, "Issued document number");
        Ok(number)
    }

    /// Current counter state without consuming a number.
    pub async fn peek(&self, prefix: &str) -> DbResult<Option<SequenceCounter>> {
        validate_prefix(prefix)?;

        let counter = sqlx::query_as::<_, SequenceCounter>(
            r#"
            SELECT prefix, next_number, pad_width, updated_at
            FROM sequence_counters
            WHERE prefix = ?1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(counter)
    }

    /// Sets the pad width used for future numbers of `prefix`.
    ///
    /// Creates the counter if it does not exist yet; `next_number` is never
    /// touched.
    pub async fn configure(&self, prefix: &str, pad_width: i64) -> DbResult<SequenceCounter> {
        validate_prefix(prefix)?;
        validate_pad_width(pad_width)?;

        let now = Utc::now();
        let counter = sqlx::query_as::<_, SequenceCounter>(
            r#"
            INSERT INTO sequence_counters (prefix, next_number, pad_width, updated_at)
            VALUES (?1, 1, ?2, ?3)
            ON CONFLICT(prefix) DO UPDATE SET
                pad_width = excluded.pad_width,
                updated_at = excluded.updated_at
            RETURNING prefix, next_number, pad_width, updated_at
            "#,
        )
        .bind(prefix)
        .bind(pad_width)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(prefix, pad_width, "Configured sequence counter");
        Ok(counter)
    }

    /// All counters, internal ones included.
    pub async fn list(&self) -> DbResult<Vec<SequenceCounter>> {
        let counters = sqlx::query_as::<_, SequenceCounter>(
            r#"
            SELECT prefix, next_number, pad_width, updated_at
            FROM sequence_counters
            ORDER BY prefix
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counters)
    }
}

/// Creates the counter row if missing (starting at `initial`), then
/// atomically consumes one value.
///
/// Returns `(issued_value, pad_width)`. Shared with the barcode counter,
/// whose key is not a valid document prefix.
pub(crate) async fn advance(
    conn: &mut SqliteConnection,
    key: &str,
    initial: i64,
    pad_width: i64,
) -> DbResult<(i64, i64)> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO sequence_counters (prefix, next_number, pad_width, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(prefix) DO NOTHING
        "#,
    )
    .bind(key)
    .bind(initial.max(1))
    .bind(pad_width.max(0))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    consume(conn, key)
        .await?
        .ok_or_else(|| DbError::not_found("Sequence counter", key))
}

/// Consumes one value from an existing counter row.
///
/// `None` when the row does not exist. The UPDATE runs even then, so the
/// caller's transaction holds the write lock afterwards.
pub(crate) async fn consume(conn: &mut SqliteConnection, key: &str) -> DbResult<Option<(i64, i64)>> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        r#"
        UPDATE sequence_counters
        SET next_number = next_number + 1,
            updated_at = ?2
        WHERE prefix = ?1
        RETURNING next_number - 1 AS issued, pad_width
        "#,
    )
    .bind(key)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stitch_core::numbering::parse_number;
    use stitch_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_sequential_numbers_are_distinct_and_increasing() {
        let db = test_db().await;
        let repo = db.sequences();

        let mut issued = Vec::new();
        for _ in 0..25 {
            issued.push(repo.next("INV").await.unwrap());
        }

        assert_eq!(issued[0], "INV000001");
        assert_eq!(issued[24], "INV000025");

        let values: Vec<i64> = issued
            .iter()
            .map(|n| parse_number("INV", n).unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[tokio::test]
    async fn test_family_pad_widths() {
        let db = test_db().await;
        let repo = db.sequences();

        assert_eq!(repo.next_for(DocumentFamily::CreditNote).await.unwrap(), "CRN00001");
        assert_eq!(
            repo.next_for(DocumentFamily::MaterialConsumption).await.unwrap(),
            "CONWS0001"
        );
        assert_eq!(repo.next_for(DocumentFamily::StockTransfer).await.unwrap(), "TRF00001");
        // unknown prefix uses the configured default
        assert_eq!(repo.next("GIFT").await.unwrap(), "GIFT00001");
    }

    #[tokio::test]
    async fn test_prefixes_are_independent() {
        let db = test_db().await;
        let repo = db.sequences();

        repo.next("INV").await.unwrap();
        repo.next("INV").await.unwrap();
        assert_eq!(repo.next("CRN").await.unwrap(), "CRN00001");
        assert_eq!(repo.next("INV").await.unwrap(), "INV000003");
    }

    #[tokio::test]
    async fn test_zero_pad_width_prints_plain_number() {
        let db = test_db().await;
        let repo = db.sequences();

        repo.configure("RCPT", 0).await.unwrap();
        assert_eq!(repo.next("RCPT").await.unwrap(), "RCPT1");
        assert_eq!(repo.next("RCPT").await.unwrap(), "RCPT2");
    }

    #[tokio::test]
    async fn test_configure_keeps_next_number() {
        let db = test_db().await;
        let repo = db.sequences();

        repo.next("CRN").await.unwrap();
        repo.next("CRN").await.unwrap();
        let counter = repo.configure("CRN", 3).await.unwrap();
        assert_eq!(counter.next_number, 3);
        assert_eq!(counter.peek(), "CRN003");
        assert_eq!(repo.next("CRN").await.unwrap(), "CRN003");
    }

    #[tokio::test]
    async fn test_peek_does_not_consume() {
        let db = test_db().await;
        let repo = db.sequences();

        assert!(repo.peek("INV").await.unwrap().is_none());
        repo.next("INV").await.unwrap();

        let counter = repo.peek("INV").await.unwrap().unwrap();
        assert_eq!(counter.peek(), "INV000002");
        assert_eq!(repo.next("INV").await.unwrap(), "INV000002");
    }

    #[tokio::test]
    async fn test_rolled_back_issuance_is_not_consumed() {
        let db = test_db().await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            let n = SequenceRepository::next_in(&mut tx, "INV", 5).await.unwrap();
            assert_eq!(n, "INV000001");
            tx.rollback().await.unwrap();
        }

        assert_eq!(db.sequences().next("INV").await.unwrap(), "INV000001");
    }

    #[tokio::test]
    async fn test_invalid_prefix_is_rejected() {
        let db = test_db().await;
        let err = db.sequences().next("@barcode").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db.sequences().next("").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
