//! # Payout Repository
//!
//! Slab configuration and payout entries.
//!
//! ## Recording a Payout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_payout(employee, customer, bill_date, outlet, amount, actor)    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    slabs  ← SELECT active slabs WHERE outlet_id = outlet               │
//! │    quote  ← compute_quote(slabs, outlet, amount)                       │
//! │    None   → nothing to record (existing entry left as is)              │
//! │    Some   → SELECT entry by (employee, customer, bill_date)            │
//! │               found     → UPDATE amounts, keep created_by/created_at   │
//! │               not found → INSERT with created_by = actor               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use stitch_core::payout::compute_quote;
use stitch_core::validation::{validate_non_negative, validate_required_id};
use stitch_core::{Money, OutletScope, PayoutEntry, PayoutQuote, PayoutSlab};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, push_outlet_filter};

const SLAB_COLUMNS: &str =
    "id, outlet_id, min_amount_cents, payout_per_unit_cents, is_active, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, outlet_id, employee_id, customer_id, bill_date, \
     sale_amount_cents, slab_min_amount_cents, payout_per_unit_cents, unit_count, \
     total_payout_cents, created_by, created_at, updated_at";

/// Input for [`PayoutRepository::record_payout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPayout {
    pub outlet_id: String,
    pub employee_id: String,
    pub customer_id: String,
    pub bill_date: NaiveDate,
    pub sale_amount: Money,
    /// User recorded as `created_by` when the entry is new.
    pub actor: String,
}

/// Repository for payout slabs and entries.
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    pool: SqlitePool,
}

impl PayoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PayoutRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Slabs
    // -------------------------------------------------------------------------

    /// Adds an active slab to an outlet.
    ///
    /// A second active slab with the same threshold at the same outlet is a
    /// [`DbError::UniqueViolation`].
    pub async fn create_slab(
        &self,
        outlet_id: &str,
        min_amount: Money,
        payout_per_unit: Money,
    ) -> DbResult<PayoutSlab> {
        validate_required_id("outlet_id", outlet_id)?;
        validate_non_negative("min_amount", min_amount)?;
        validate_non_negative("payout_per_unit", payout_per_unit)?;

        let now = Utc::now();
        let slab = PayoutSlab {
            id: Uuid::new_v4().to_string(),
            outlet_id: outlet_id.to_string(),
            min_amount_cents: min_amount.cents(),
            payout_per_unit_cents: payout_per_unit.cents(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(
            outlet_id,
            min_amount = %min_amount,
            payout_per_unit = %payout_per_unit,
            "Creating payout slab"
        );

        sqlx::query(
            r#"
            INSERT INTO payout_slabs (
                id, outlet_id, min_amount_cents, payout_per_unit_cents,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&slab.id)
        .bind(&slab.outlet_id)
        .bind(slab.min_amount_cents)
        .bind(slab.payout_per_unit_cents)
        .bind(slab.is_active)
        .bind(slab.created_at)
        .bind(slab.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("active slab threshold", min_amount.to_string())
            }
            other => other,
        })?;

        Ok(slab)
    }

    /// Retires or reactivates a slab. Reactivating fails if another active
    /// slab already holds the threshold.
    pub async fn set_slab_active(&self, slab_id: &str, active: bool) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE payout_slabs SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(slab_id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payout slab", slab_id));
        }

        debug!(slab_id, active, "Updated payout slab");
        Ok(())
    }

    /// All slabs of an outlet, retired ones included, lowest threshold first.
    pub async fn list_slabs(&self, outlet_id: &str) -> DbResult<Vec<PayoutSlab>> {
        let sql = format!(
            "SELECT {SLAB_COLUMNS} FROM payout_slabs WHERE outlet_id = ?1 \
             ORDER BY min_amount_cents, created_at"
        );
        let slabs = sqlx::query_as::<_, PayoutSlab>(&sql)
            .bind(outlet_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(slabs)
    }

    // -------------------------------------------------------------------------
    // Quotes and entries
    // -------------------------------------------------------------------------

    /// What a sale of `amount` at `outlet_id` would pay. Read-only.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // slabs (1000, 50) and (5000, 300) at the outlet
    /// let quote = db.payouts().compute_payout(&outlet_id, Money::from_major(5200)).await?;
    /// assert_eq!(quote.unwrap().total_payout, Money::from_major(300));
    /// ```
    pub async fn compute_payout(&self, outlet_id: &str, amount: Money) -> DbResult<Option<PayoutQuote>> {
        let mut conn = self.pool.acquire().await?;
        quote_in(&mut conn, outlet_id, amount).await
    }

    /// Computes and stores the payout for one (employee, customer, day).
    ///
    /// Returns `None` when no slab applies.
    pub async fn record_payout(&self, input: RecordPayout) -> DbResult<Option<PayoutEntry>> {
        let mut tx = begin_write(&self.pool).await?;
        let entry = record_payout_in(&mut tx, &input).await?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn get_entry(
        &self,
        employee_id: &str,
        customer_id: &str,
        bill_date: NaiveDate,
    ) -> DbResult<Option<PayoutEntry>> {
        let mut conn = self.pool.acquire().await?;
        entry_in(&mut conn, employee_id, customer_id, bill_date).await
    }

    /// Entries for back-office review, oldest bill date first.
    pub async fn list_entries(
        &self,
        scope: &OutletScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<PayoutEntry>> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ENTRY_COLUMNS} FROM payout_entries WHERE bill_date BETWEEN "
        ));
        qb.push_bind(from).push(" AND ").push_bind(to);
        push_outlet_filter(&mut qb, "outlet_id", scope);
        qb.push(" ORDER BY bill_date, created_at");

        let entries = qb
            .build_query_as::<PayoutEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}

async fn quote_in(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    amount: Money,
) -> DbResult<Option<PayoutQuote>> {
    let sql = format!(
        "SELECT {SLAB_COLUMNS} FROM payout_slabs WHERE outlet_id = ?1 AND is_active = 1"
    );
    let slabs = sqlx::query_as::<_, PayoutSlab>(&sql)
        .bind(outlet_id)
        .fetch_all(&mut *conn)
        .await?;

    let quote = compute_quote(&slabs, outlet_id, amount);
    if quote.is_none() {
        debug!(outlet_id, amount = %amount, slabs = slabs.len(), "No payout slab applies");
    }
    Ok(quote)
}

async fn entry_in(
    conn: &mut SqliteConnection,
    employee_id: &str,
    customer_id: &str,
    bill_date: NaiveDate,
) -> DbResult<Option<PayoutEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM payout_entries \
         WHERE employee_id = ?1 AND customer_id = ?2 AND bill_date = ?3"
    );
    let entry = sqlx::query_as::<_, PayoutEntry>(&sql)
        .bind(employee_id)
        .bind(customer_id)
        .bind(bill_date)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(entry)
}

/// [`PayoutRepository::record_payout`] on a caller's transaction.
pub(crate) async fn record_payout_in(
    conn: &mut SqliteConnection,
    input: &RecordPayout,
) -> DbResult<Option<PayoutEntry>> {
    validate_required_id("outlet_id", &input.outlet_id)?;
    validate_required_id("employee_id", &input.employee_id)?;
    validate_required_id("customer_id", &input.customer_id)?;

    let Some(quote) = quote_in(conn, &input.outlet_id, input.sale_amount).await? else {
        return Ok(None);
    };

    let now = Utc::now();
    let existing = entry_in(conn, &input.employee_id, &input.customer_id, input.bill_date).await?;

    let entry = match existing {
        Some(current) => {
            let sql = format!(
                r#"
                UPDATE payout_entries SET
                    outlet_id = ?2,
                    sale_amount_cents = ?3,
                    slab_min_amount_cents = ?4,
                    payout_per_unit_cents = ?5,
                    unit_count = ?6,
                    total_payout_cents = ?7,
                    updated_at = ?8
                WHERE id = ?1
                RETURNING {ENTRY_COLUMNS}
                "#
            );
            sqlx::query_as::<_, PayoutEntry>(&sql)
                .bind(&current.id)
                .bind(&input.outlet_id)
                .bind(input.sale_amount.cents())
                .bind(quote.min_amount.cents())
                .bind(quote.payout_per_unit.cents())
                .bind(quote.unit_count)
                .bind(quote.total_payout.cents())
                .bind(now)
                .fetch_one(&mut *conn)
                .await?
        }
        None => {
            let sql = format!(
                r#"
                INSERT INTO payout_entries (
                    id, outlet_id, employee_id, customer_id, bill_date,
                    sale_amount_cents, slab_min_amount_cents, payout_per_unit_cents,
                    unit_count, total_payout_cents, created_by, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
                RETURNING {ENTRY_COLUMNS}
                "#
            );
            sqlx::query_as::<_, PayoutEntry>(&sql)
                .bind(Uuid::new_v4().to_string())
                .bind(&input.outlet_id)
                .bind(&input.employee_id)
                .bind(&input.customer_id)
                .bind(input.bill_date)
                .bind(input.sale_amount.cents())
                .bind(quote.min_amount.cents())
                .bind(quote.payout_per_unit.cents())
                .bind(quote.unit_count)
                .bind(quote.total_payout.cents())
                .bind(&input.actor)
                .bind(now)
                .fetch_one(&mut *conn)
                .await?
        }
    };

    info!(
        employee_id = %entry.employee_id,
        customer_id = %entry.customer_id,
        bill_date = %entry.bill_date,
        units = entry.unit_count,
        total = %entry.total_payout(),
        "Recorded payout"
    );

    Ok(Some(entry))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::directory::{NewCustomer, NewEmployee, NewOutlet};
    use crate::{Database, DbConfig};

    struct Fixture {
        db: Database,
        outlet: String,
        other_outlet: String,
        employee: String,
        customer: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dir = db.directory();

        let outlet = dir
            .create_outlet(NewOutlet {
                code: "BLR-01".into(),
                name: "Indiranagar".into(),
            })
            .await
            .unwrap();
        let other = dir
            .create_outlet(NewOutlet {
                code: "MYS-02".into(),
                name: "Mysuru".into(),
            })
            .await
            .unwrap();
        let employee = dir
            .create_employee(NewEmployee {
                name: "Asha".into(),
                home_outlet_id: Some(outlet.id.clone()),
            })
            .await
            .unwrap();
        let customer = dir
            .create_customer(NewCustomer {
                name: "Ravi".into(),
                phone: Some("9876543210".into()),
            })
            .await
            .unwrap();

        let payouts = db.payouts();
        payouts
            .create_slab(&outlet.id, Money::from_major(1000), Money::from_major(50))
            .await
            .unwrap();
        payouts
            .create_slab(&outlet.id, Money::from_major(5000), Money::from_major(300))
            .await
            .unwrap();

        Fixture {
            db,
            outlet: outlet.id,
            other_outlet: other.id,
            employee: employee.id,
            customer: customer.id,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn input(f: &Fixture, amount: Money, actor: &str) -> RecordPayout {
        RecordPayout {
            outlet_id: f.outlet.clone(),
            employee_id: f.employee.clone(),
            customer_id: f.customer.clone(),
            bill_date: day(),
            sale_amount: amount,
            actor: actor.to_string(),
        }
    }

    #[tokio::test]
    async fn test_compute_payout_picks_highest_slab() {
        let f = fixture().await;
        let quote = f
            .db
            .payouts()
            .compute_payout(&f.outlet, Money::from_major(5200))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.min_amount, Money::from_major(5000));
        assert_eq!(quote.payout_per_unit, Money::from_major(300));
        assert_eq!(quote.unit_count, 1);
        assert_eq!(quote.total_payout, Money::from_major(300));

        let none = f
            .db
            .payouts()
            .compute_payout(&f.outlet, Money::from_major(999))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_slabs_do_not_cross_outlets() {
        let f = fixture().await;
        let quote = f
            .db
            .payouts()
            .compute_payout(&f.other_outlet, Money::from_major(5200))
            .await
            .unwrap();
        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_active_threshold_is_rejected() {
        let f = fixture().await;
        let payouts = f.db.payouts();

        let err = payouts
            .create_slab(&f.outlet, Money::from_major(1000), Money::from_major(75))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // retiring the old slab frees the threshold
        let old = payouts.list_slabs(&f.outlet).await.unwrap().remove(0);
        payouts.set_slab_active(&old.id, false).await.unwrap();
        payouts
            .create_slab(&f.outlet, Money::from_major(1000), Money::from_major(75))
            .await
            .unwrap();

        let quote = payouts
            .compute_payout(&f.outlet, Money::from_major(1200))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quote.total_payout, Money::from_major(75));
    }

    #[tokio::test]
    async fn test_record_payout_upserts_and_keeps_creator() {
        let f = fixture().await;
        let payouts = f.db.payouts();

        let first = payouts
            .record_payout(input(&f, Money::from_major(2000), "cashier-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.unit_count, 2);
        assert_eq!(first.total_payout(), Money::from_major(100));
        assert_eq!(first.created_by, "cashier-1");

        let second = payouts
            .record_payout(input(&f, Money::from_major(10400), "cashier-2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_by, "cashier-1");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.slab_min_amount_cents, 500_000);
        assert_eq!(second.unit_count, 2);
        assert_eq!(second.total_payout(), Money::from_major(600));

        let stored = payouts
            .get_entry(&f.employee, &f.customer, day())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_non_qualifying_amount_records_nothing() {
        let f = fixture().await;
        let payouts = f.db.payouts();

        let entry = payouts
            .record_payout(input(&f, Money::from_major(999), "cashier-1"))
            .await
            .unwrap();
        assert!(entry.is_none());
        assert!(payouts
            .get_entry(&f.employee, &f.customer, day())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_entries_respects_scope() {
        let f = fixture().await;
        let payouts = f.db.payouts();
        payouts
            .record_payout(input(&f, Money::from_major(1500), "cashier-1"))
            .await
            .unwrap();

        let all = payouts.list_entries(&OutletScope::All, day(), day()).await.unwrap();
        assert_eq!(all.len(), 1);

        let mine = payouts
            .list_entries(&OutletScope::single(f.outlet.clone()), day(), day())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let theirs = payouts
            .list_entries(&OutletScope::single(f.other_outlet.clone()), day(), day())
            .await
            .unwrap();
        assert!(theirs.is_empty());

        let nothing = payouts
            .list_entries(&OutletScope::Outlets(vec![]), day(), day())
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }
}
