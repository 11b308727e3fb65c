//! # Credit Note Repository
//!
//! Issue, redemption and cancellation of credit notes (`CRN00001`, ...).
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue ──► Open ──(redeem full balance)──► Redeemed                    │
//! │             │  ▲                               │                        │
//! │             │  └──────(sale voided)────────────┘                        │
//! │             │                                                           │
//! │             └──(cancel, nothing redeemed yet)──► Cancelled             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Partial redemption keeps the note `Open` with a smaller balance.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use stitch_core::validation::{validate_positive, validate_required_id};
use stitch_core::{CoreError, CreditNote, CreditNoteStatus, DocumentFamily, Money};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::sequence::SequenceRepository;

const CREDIT_NOTE_COLUMNS: &str = "id, number, outlet_id, source_sale_id, customer_id, issue_date, \
     amount_cents, redeemed_cents, status, created_by, created_at, updated_at";

/// Input for [`CreditNoteRepository::issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCreditNote {
    pub outlet_id: String,
    pub source_sale_id: Option<String>,
    pub customer_id: Option<String>,
    pub issue_date: NaiveDate,
    pub amount: Money,
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct CreditNoteRepository {
    pool: SqlitePool,
    default_pad_width: i64,
}

impl CreditNoteRepository {
    pub fn new(pool: SqlitePool, default_pad_width: i64) -> Self {
        CreditNoteRepository {
            pool,
            default_pad_width,
        }
    }

    /// Issues a credit note with the next `CRN` number.
    pub async fn issue(&self, new: NewCreditNote) -> DbResult<CreditNote> {
        validate_required_id("outlet_id", &new.outlet_id)?;
        validate_required_id("created_by", &new.created_by)?;
        validate_positive("amount", new.amount)?;

        let mut tx = begin_write(&self.pool).await?;

        let number = SequenceRepository::next_in(
            &mut tx,
            DocumentFamily::CreditNote.prefix(),
            self.default_pad_width,
        )
        .await?;

        let now = Utc::now();
        let note = CreditNote {
            id: Uuid::new_v4().to_string(),
            number,
            outlet_id: new.outlet_id,
            source_sale_id: new.source_sale_id,
            customer_id: new.customer_id,
            issue_date: new.issue_date,
            amount_cents: new.amount.cents(),
            redeemed_cents: 0,
            status: CreditNoteStatus::Open,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO credit_notes (
                id, number, outlet_id, source_sale_id, customer_id, issue_date,
                amount_cents, redeemed_cents, status, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&note.id)
        .bind(&note.number)
        .bind(&note.outlet_id)
        .bind(&note.source_sale_id)
        .bind(&note.customer_id)
        .bind(note.issue_date)
        .bind(note.amount_cents)
        .bind(note.redeemed_cents)
        .bind(note.status)
        .bind(&note.created_by)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(number = %note.number, amount = %note.balance(), "Issued credit note");
        Ok(note)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<CreditNote>> {
        let sql = format!("SELECT {CREDIT_NOTE_COLUMNS} FROM credit_notes WHERE id = ?1");
        let note = sqlx::query_as::<_, CreditNote>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    /// Lookup by the printed number, as scanned at the counter.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<CreditNote>> {
        let mut conn = self.pool.acquire().await?;
        by_number_in(&mut conn, number).await
    }

    /// Cancels a note that has not been used.
    pub async fn cancel(&self, number: &str) -> DbResult<CreditNote> {
        let mut tx = begin_write(&self.pool).await?;

        let note = by_number_in(&mut tx, number)
            .await?
            .ok_or_else(|| DbError::not_found("Credit note", number))?;

        if note.status != CreditNoteStatus::Open || note.redeemed_cents != 0 {
            let current_status = status_label(&note);
            return Err(CoreError::InvalidStatus {
                document: "Credit note".to_string(),
                id: note.number,
                current_status,
            }
            .into());
        }

        let sql = format!(
            "UPDATE credit_notes SET status = ?2, updated_at = ?3 WHERE id = ?1 \
             RETURNING {CREDIT_NOTE_COLUMNS}"
        );
        let cancelled = sqlx::query_as::<_, CreditNote>(&sql)
            .bind(&note.id)
            .bind(CreditNoteStatus::Cancelled)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(number = %cancelled.number, "Cancelled credit note");
        Ok(cancelled)
    }
}

fn status_label(note: &CreditNote) -> String {
    match note.status {
        CreditNoteStatus::Open if note.redeemed_cents > 0 => "partially redeemed".to_string(),
        CreditNoteStatus::Open => "open".to_string(),
        CreditNoteStatus::Redeemed => "redeemed".to_string(),
        CreditNoteStatus::Cancelled => "cancelled".to_string(),
    }
}

pub(crate) async fn by_number_in(
    conn: &mut SqliteConnection,
    number: &str,
) -> DbResult<Option<CreditNote>> {
    let sql = format!("SELECT {CREDIT_NOTE_COLUMNS} FROM credit_notes WHERE number = ?1");
    let note = sqlx::query_as::<_, CreditNote>(&sql)
        .bind(number.trim())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(note)
}

/// Draws `amount` from an open note's balance.
///
/// The note becomes `Redeemed` once its balance reaches zero.
pub(crate) async fn redeem_in(
    conn: &mut SqliteConnection,
    number: &str,
    amount: Money,
) -> DbResult<CreditNote> {
    let unavailable = |reason: String| -> DbError {
        CoreError::CreditNoteUnavailable {
            number: number.to_string(),
            reason,
        }
        .into()
    };

    let note = by_number_in(conn, number)
        .await?
        .ok_or_else(|| unavailable("no such credit note".to_string()))?;

    if note.status != CreditNoteStatus::Open {
        return Err(unavailable(format!("it is {}", status_label(&note))));
    }
    if note.balance() < amount {
        return Err(unavailable(format!(
            "balance {} is less than {}",
            note.balance(),
            amount
        )));
    }

    let sql = format!(
        r#"
        UPDATE credit_notes SET
            redeemed_cents = redeemed_cents + ?2,
            status = CASE WHEN redeemed_cents + ?2 >= amount_cents THEN 'redeemed' ELSE 'open' END,
            updated_at = ?3
        WHERE id = ?1
        RETURNING {CREDIT_NOTE_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, CreditNote>(&sql)
        .bind(&note.id)
        .bind(amount.cents())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    debug!(number = %updated.number, amount = %amount, balance = %updated.balance(), "Redeemed credit note");
    Ok(updated)
}

/// Gives `amount` back to a note, reopening it.
pub(crate) async fn unredeem_in(
    conn: &mut SqliteConnection,
    number: &str,
    amount: Money,
) -> DbResult<CreditNote> {
    let sql = format!(
        r#"
        UPDATE credit_notes SET
            redeemed_cents = redeemed_cents - ?2,
            status = 'open',
            updated_at = ?3
        WHERE number = ?1 AND redeemed_cents >= ?2
        RETURNING {CREDIT_NOTE_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, CreditNote>(&sql)
        .bind(number)
        .bind(amount.cents())
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Credit note redemption", number))?;

    debug!(number = %updated.number, amount = %amount, "Reversed credit note redemption");
    Ok(updated)
}

// =============================================================================
// Unit Tests
// =============================================================================
