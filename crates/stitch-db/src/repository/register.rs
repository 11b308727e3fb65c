//! # Register Repository
//!
//! Opening and closing the cash drawer of an outlet for one business day.
//!
//! ## Closing Arithmetic
//! ```text
//! expected = opening cash + cash payments of completed sales
//!            (same outlet, same business date)
//! variance = counted − expected        negative → drawer is short
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use stitch_core::report::expected_cash;
use stitch_core::validation::{validate_non_negative, validate_required_id};
use stitch_core::{CoreError, Money, OutletScope, RegisterSession, RegisterStatus, TaxMode};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::report::collect_in;

const SESSION_COLUMNS: &str = "id, outlet_id, business_date, status, opening_cash_cents, \
     expected_cash_cents, counted_cash_cents, variance_cents, opened_by, closed_by, opened_at, closed_at";

#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
    tax_mode: TaxMode,
}

impl RegisterRepository {
    pub fn new(pool: SqlitePool, tax_mode: TaxMode) -> Self {
        RegisterRepository { pool, tax_mode }
    }

    /// Opens the register. One session per outlet and business day.
    pub async fn open(
        &self,
        outlet_id: &str,
        business_date: NaiveDate,
        opening_cash: Money,
        opened_by: &str,
    ) -> DbResult<RegisterSession> {
        validate_required_id("outlet_id", outlet_id)?;
        validate_required_id("opened_by", opened_by)?;
        validate_non_negative("opening_cash", opening_cash)?;

        let sql = format!(
            r#"
            INSERT INTO register_sessions (
                id, outlet_id, business_date, status, opening_cash_cents, opened_by, opened_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let session = sqlx::query_as::<_, RegisterSession>(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(outlet_id)
            .bind(business_date)
            .bind(RegisterStatus::Open)
            .bind(opening_cash.cents())
            .bind(opened_by)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::Domain(CoreError::RegisterAlreadyOpen {
                    outlet_id: outlet_id.to_string(),
                    business_date,
                }),
                other => other,
            })?;

        info!(outlet_id, %business_date, opening = %opening_cash, "Register opened");
        Ok(session)
    }

    /// Closes the register, recording expected cash and variance.
    pub async fn close(
        &self,
        session_id: &str,
        counted_cash: Money,
        closed_by: &str,
    ) -> DbResult<RegisterSession> {
        validate_required_id("closed_by", closed_by)?;
        validate_non_negative("counted_cash", counted_cash)?;

        let mut tx = begin_write(&self.pool).await?;

        let session = session_in(&mut tx, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Register session", session_id))?;

        if session.status != RegisterStatus::Open {
            return Err(CoreError::InvalidStatus {
                document: "Register session".to_string(),
                id: session.id,
                current_status: "closed".to_string(),
            }
            .into());
        }

        let date = session.business_date;
        let builder = collect_in(
            &mut tx,
            date,
            date,
            &OutletScope::single(session.outlet_id.clone()),
            self.tax_mode,
        )
        .await?;
        let activity = builder.day(date).copied().unwrap_or_default();

        let expected = expected_cash(Money::from_cents(session.opening_cash_cents), &activity);
        let variance = counted_cash - expected;

        let sql = format!(
            r#"
            UPDATE register_sessions SET
                status = ?2,
                expected_cash_cents = ?3,
                counted_cash_cents = ?4,
                variance_cents = ?5,
                closed_by = ?6,
                closed_at = ?7
            WHERE id = ?1
            RETURNING {SESSION_COLUMNS}
            "#
        );
        let closed = sqlx::query_as::<_, RegisterSession>(&sql)
            .bind(&session.id)
            .bind(RegisterStatus::Closed)
            .bind(expected.cents())
            .bind(counted_cash.cents())
            .bind(variance.cents())
            .bind(closed_by)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if variance.is_zero() {
            info!(outlet_id = %closed.outlet_id, %date, expected = %expected, "Register closed");
        } else {
            warn!(
                outlet_id = %closed.outlet_id,
                %date,
                expected = %expected,
                counted = %counted_cash,
                variance = %variance,
                "Register closed with cash variance"
            );
        }

        Ok(closed)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<RegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        session_in(&mut conn, id).await
    }

    /// The session of an outlet on a business day, if one was opened.
    pub async fn find(&self, outlet_id: &str, business_date: NaiveDate) -> DbResult<Option<RegisterSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions WHERE outlet_id = ?1 AND business_date = ?2"
        );
        let session = sqlx::query_as::<_, RegisterSession>(&sql)
            .bind(outlet_id)
            .bind(business_date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }
}

pub(crate) async fn session_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<RegisterSession>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM register_sessions WHERE id = ?1");
    let session = sqlx::query_as::<_, RegisterSession>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(session)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::directory::{NewEmployee, NewOutlet};
    use crate::repository::product::NewProduct;
    use crate::repository::sale::{NewPayment, NewSale, NewSaleLine};
    use crate::{Database, DbConfig};
    use stitch_core::PaymentMethod;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    async fn setup() -> (Database, String, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let outlet = db
            .directory()
            .create_outlet(NewOutlet {
                code: "BLR-01".into(),
                name: "Indiranagar".into(),
            })
            .await
            .unwrap();
        let employee = db
            .directory()
            .create_employee(NewEmployee {
                name: "Asha".into(),
                home_outlet_id: Some(outlet.id.clone()),
            })
            .await
            .unwrap();
        let product = db
            .products()
            .create(NewProduct {
                sku: "SH-01".into(),
                name: "Linen Shirt".into(),
                category: None,
                mrp: Money::from_major(1050),
                barcode: None,
            })
            .await
            .unwrap();
        (db, outlet.id, employee.id, product.id)
    }

    #[tokio::test]
    async fn test_one_session_per_outlet_and_day() {
        let (db, outlet, _, _) = setup().await;
        let registers = db.registers();

        let session = registers
            .open(&outlet, day(), Money::from_major(2000), "cashier-1")
            .await
            .unwrap();
        assert_eq!(session.status, RegisterStatus::Open);

        let err = registers
            .open(&outlet, day(), Money::from_major(2000), "cashier-2")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::RegisterAlreadyOpen { .. })));

        let found = registers.find(&outlet, day()).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
    }

    #[tokio::test]
    async fn test_close_computes_expected_cash_and_variance() {
        let (db, outlet, employee, product) = setup().await;
        let registers = db.registers();
        let session = registers
            .open(&outlet, day(), Money::from_major(2000), "cashier-1")
            .await
            .unwrap();

        let sell = |method: PaymentMethod| NewSale {
            outlet_id: outlet.clone(),
            employee_id: employee.clone(),
            customer_id: None,
            bill_date: day(),
            lines: vec![NewSaleLine {
                product_id: product.clone(),
                quantity: 1,
                unit_price: None,
                discount: Money::zero(),
            }],
            payments: vec![NewPayment {
                method,
                amount: Money::from_major(1050),
                reference: None,
            }],
            created_by: "cashier-1".into(),
        };
        db.sales().complete_sale(sell(PaymentMethod::Cash)).await.unwrap();
        db.sales().complete_sale(sell(PaymentMethod::Card)).await.unwrap();

        let closed = registers
            .close(&session.id, Money::from_major(3000), "cashier-1")
            .await
            .unwrap();

        assert_eq!(closed.status, RegisterStatus::Closed);
        assert_eq!(closed.expected_cash_cents, Some(305_000));
        assert_eq!(closed.counted_cash_cents, Some(300_000));
        assert_eq!(closed.variance_cents, Some(-5_000));
        assert_eq!(closed.closed_by.as_deref(), Some("cashier-1"));

        let err = registers
            .close(&session.id, Money::from_major(3050), "cashier-1")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidStatus { .. })));

        let row = db.reports().register_closing(&closed).await.unwrap();
        assert_eq!(row.cash, "1050.00");
        assert_eq!(row.card, "1050.00");
        assert_eq!(row.bills, 2);
    }
}
