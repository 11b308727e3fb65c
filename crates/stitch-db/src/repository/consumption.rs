//! # Material Consumption Repository
//!
//! Slips (`CONWS0001`, ...) for packing and workshop material used up at an
//! outlet. The outlet is resolved from what the caller knows; see
//! [`stitch_core::location`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use stitch_core::location::{resolve_location, LocationHints};
use stitch_core::validation::validate_required_id;
use stitch_core::{DocumentFamily, MaterialConsumption, StockLine};

use crate::error::{DbError, DbResult};
use crate::repository::directory::employee_in;
use crate::repository::register::session_in;
use crate::repository::sequence::SequenceRepository;
use crate::repository::{begin_write, product, transfer};

const DOCUMENT: &str = "material consumption";

/// Input for [`ConsumptionRepository::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewConsumption {
    /// Outlet named by the caller, if any.
    pub outlet_id: Option<String>,
    /// Register session the slip is written from, if any.
    pub register_session_id: Option<String>,
    /// Employee writing the slip, if known.
    pub employee_id: Option<String>,
    pub lines: Vec<StockLine>,
    pub note: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct ConsumptionRepository {
    pool: SqlitePool,
    default_pad_width: i64,
}

impl ConsumptionRepository {
    pub fn new(pool: SqlitePool, default_pad_width: i64) -> Self {
        ConsumptionRepository {
            pool,
            default_pad_width,
        }
    }

    /// Records a consumption slip and takes the stock out of the outlet.
    ///
    /// ## Errors
    /// - `LocationUnresolved` when no outlet can be determined
    /// - `InsufficientStock` when the outlet does not hold enough
    pub async fn record(&self, new: NewConsumption) -> DbResult<MaterialConsumption> {
        validate_required_id("created_by", &new.created_by)?;
        let lines = transfer::merge_lines(&new.lines)?;

        let mut tx = begin_write(&self.pool).await?;

        let hints = hints_in(&mut tx, &new).await?;
        let location = resolve_location(DOCUMENT, &hints)?;

        let number = SequenceRepository::next_in(
            &mut tx,
            DocumentFamily::MaterialConsumption.prefix(),
            self.default_pad_width,
        )
        .await?;

        let consumption = MaterialConsumption {
            id: Uuid::new_v4().to_string(),
            number,
            outlet_id: location.outlet_id,
            note: new.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            created_by: new.created_by,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO material_consumptions (id, number, outlet_id, note, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&consumption.id)
        .bind(&consumption.number)
        .bind(&consumption.outlet_id)
        .bind(&consumption.note)
        .bind(&consumption.created_by)
        .bind(consumption.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO material_consumption_lines (consumption_id, product_id, quantity) \
                 VALUES (?1, ?2, ?3)",
            )
            .bind(&consumption.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            product::take_in(&mut tx, &consumption.outlet_id, &line.product_id, line.quantity).await?;
        }

        tx.commit().await?;

        info!(
            number = %consumption.number,
            outlet_id = %consumption.outlet_id,
            source = ?location.source,
            "Material consumption recorded"
        );
        Ok(consumption)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<MaterialConsumption>> {
        let consumption = sqlx::query_as::<_, MaterialConsumption>(
            "SELECT id, number, outlet_id, note, created_by, created_at FROM material_consumptions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(consumption)
    }

    pub async fn lines(&self, consumption_id: &str) -> DbResult<Vec<StockLine>> {
        let lines = sqlx::query_as::<_, StockLine>(
            "SELECT product_id, quantity FROM material_consumption_lines \
             WHERE consumption_id = ?1 ORDER BY product_id",
        )
        .bind(consumption_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}

/// Looks up the session and employee the caller referenced.
async fn hints_in(conn: &mut SqliteConnection, new: &NewConsumption) -> DbResult<LocationHints> {
    let session_outlet_id = match new.register_session_id.as_deref() {
        Some(id) => Some(
            session_in(conn, id)
                .await?
                .ok_or_else(|| DbError::not_found("Register session", id))?
                .outlet_id,
        ),
        None => None,
    };

    let employee_home_outlet_id = match new.employee_id.as_deref() {
        Some(id) => employee_in(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", id))?
            .home_outlet_id,
        None => None,
    };

    Ok(LocationHints {
        explicit_outlet_id: new.outlet_id.clone(),
        session_outlet_id,
        employee_home_outlet_id,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
