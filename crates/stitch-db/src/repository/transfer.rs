//! # Stock Transfer Repository
//!
//! Moves stock between outlets in two steps.
//!
//! ```text
//! create  (TRF00001)   source outlet −qty      status = dispatched
//! receive              destination outlet +qty status = received
//! ```
//!
//! Stock in transit belongs to neither outlet.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use stitch_core::validation::{validate_quantity, validate_required_id};
use stitch_core::{CoreError, DocumentFamily, StockLine, StockTransfer, TransferStatus, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, product};
use crate::repository::sequence::SequenceRepository;

const TRANSFER_COLUMNS: &str =
    "id, number, from_outlet_id, to_outlet_id, status, created_by, received_by, created_at, received_at";

/// Input for [`TransferRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub from_outlet_id: String,
    pub to_outlet_id: String,
    pub lines: Vec<StockLine>,
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
    default_pad_width: i64,
}

impl TransferRepository {
    pub fn new(pool: SqlitePool, default_pad_width: i64) -> Self {
        TransferRepository {
            pool,
            default_pad_width,
        }
    }

    /// Dispatches stock from one outlet to another.
    ///
    /// Lines naming the same product are merged. Every line must be
    /// covered by stock at the source outlet.
    pub async fn create(&self, new: NewTransfer) -> DbResult<StockTransfer> {
        validate_required_id("from_outlet_id", &new.from_outlet_id)?;
        validate_required_id("to_outlet_id", &new.to_outlet_id)?;
        validate_required_id("created_by", &new.created_by)?;
        if new.from_outlet_id == new.to_outlet_id {
            return Err(ValidationError::MustDiffer {
                field: "to_outlet_id".to_string(),
                other: "from_outlet_id".to_string(),
            }
            .into());
        }
        let lines = merge_lines(&new.lines)?;

        let mut tx = begin_write(&self.pool).await?;

        let number = SequenceRepository::next_in(
            &mut tx,
            DocumentFamily::StockTransfer.prefix(),
            self.default_pad_width,
        )
        .await?;

        let transfer = StockTransfer {
            id: Uuid::new_v4().to_string(),
            number,
            from_outlet_id: new.from_outlet_id,
            to_outlet_id: new.to_outlet_id,
            status: TransferStatus::Dispatched,
            created_by: new.created_by,
            received_by: None,
            created_at: Utc::now(),
            received_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_transfers (
                id, number, from_outlet_id, to_outlet_id, status, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.number)
        .bind(&transfer.from_outlet_id)
        .bind(&transfer.to_outlet_id)
        .bind(transfer.status)
        .bind(&transfer.created_by)
        .bind(transfer.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO stock_transfer_lines (transfer_id, product_id, quantity) VALUES (?1, ?2, ?3)",
            )
            .bind(&transfer.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            product::take_in(&mut tx, &transfer.from_outlet_id, &line.product_id, line.quantity).await?;
        }

        tx.commit().await?;

        info!(
            number = %transfer.number,
            from = %transfer.from_outlet_id,
            to = %transfer.to_outlet_id,
            lines = lines.len(),
            "Stock transfer dispatched"
        );
        Ok(transfer)
    }

    /// Books the goods in at the destination. Allowed once.
    pub async fn receive(&self, id: &str, received_by: &str) -> DbResult<StockTransfer> {
        validate_required_id("received_by", received_by)?;

        let mut tx = begin_write(&self.pool).await?;

        let transfer = transfer_in(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Stock transfer", id))?;

        if transfer.status != TransferStatus::Dispatched {
            return Err(CoreError::InvalidStatus {
                document: "Stock transfer".to_string(),
                id: transfer.number,
                current_status: "received".to_string(),
            }
            .into());
        }

        for line in lines_in(&mut tx, &transfer.id).await? {
            product::adjust_in(&mut tx, &transfer.to_outlet_id, &line.product_id, line.quantity).await?;
        }

        let sql = format!(
            "UPDATE stock_transfers SET status = ?2, received_by = ?3, received_at = ?4 \
             WHERE id = ?1 RETURNING {TRANSFER_COLUMNS}"
        );
        let received = sqlx::query_as::<_, StockTransfer>(&sql)
            .bind(&transfer.id)
            .bind(TransferStatus::Received)
            .bind(received_by)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(number = %received.number, to = %received.to_outlet_id, "Stock transfer received");
        Ok(received)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<StockTransfer>> {
        let mut conn = self.pool.acquire().await?;
        transfer_in(&mut conn, id).await
    }

    pub async fn lines(&self, transfer_id: &str) -> DbResult<Vec<StockLine>> {
        let mut conn = self.pool.acquire().await?;
        lines_in(&mut conn, transfer_id).await
    }
}

/// Validates lines and sums quantities per product.
pub(crate) fn merge_lines(lines: &[StockLine]) -> DbResult<Vec<StockLine>> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }

    let mut merged: BTreeMap<&str, i64> = BTreeMap::new();
    for line in lines {
        validate_required_id("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
        *merged.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
    }

    let mut out = Vec::with_capacity(merged.len());
    for (product_id, quantity) in merged {
        validate_quantity(quantity)?;
        out.push(StockLine {
            product_id: product_id.to_string(),
            quantity,
        });
    }
    Ok(out)
}

async fn transfer_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StockTransfer>> {
    let sql = format!("SELECT {TRANSFER_COLUMNS} FROM stock_transfers WHERE id = ?1");
    let transfer = sqlx::query_as::<_, StockTransfer>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(transfer)
}

async fn lines_in(conn: &mut SqliteConnection, transfer_id: &str) -> DbResult<Vec<StockLine>> {
    let lines = sqlx::query_as::<_, StockLine>(
        "SELECT product_id, quantity FROM stock_transfer_lines WHERE transfer_id = ?1 ORDER BY product_id",
    )
    .bind(transfer_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
