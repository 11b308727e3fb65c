//! # Report Repository
//!
//! Read-only aggregation over sales, payments and credit notes.
//!
//! ## Query Plan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  daily_sales(from, to, scope)                                          │
//! │                                                                         │
//! │  bills    ← sales GROUP BY bill_date            (completed only)       │
//! │  lines    ← sale_items ⋈ sales                  (tax per line)         │
//! │  tenders  ← payments ⋈ sales GROUP BY date, method                     │
//! │  notes    ← credit_notes GROUP BY issue_date    (not cancelled)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DailyReportBuilder (stitch-core) → one row per day + TOTAL            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `SUM` is wrapped in `COALESCE(.., 0)`. Tax is recomputed from the
//! line snapshots with the configured tax mode, so the register never
//! depends on rounding done at the counter.

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use stitch_core::report::DailyReportBuilder;
use stitch_core::validation::validate_date_range;
use stitch_core::{
    DailySalesReport, DailySalesRow, Money, OutletScope, PaymentMethod, RegisterSession, TaxMode,
};

use crate::error::DbResult;
use crate::pool::Settings;
use crate::repository::push_outlet_filter;

/// Repository for aggregation reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    settings: Settings,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool, settings: Settings) -> Self {
        ReportRepository { pool, settings }
    }

    /// Day-wise sales register for `from..=to`.
    ///
    /// ## Errors
    /// `InvalidDateRange` when `from > to` or the range is longer than the
    /// configured maximum.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let report = db.reports().daily_sales(from, to, &OutletScope::All).await?;
    /// println!("{}", serde_json::to_string_pretty(&report)?);
    /// ```
    pub async fn daily_sales(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        scope: &OutletScope,
    ) -> DbResult<DailySalesReport> {
        validate_date_range(from, to, self.settings.max_report_days)?;

        debug!(%from, %to, ?scope, "Building daily sales report");

        let mut conn = self.pool.acquire().await?;
        let builder = collect_in(&mut conn, from, to, scope, self.settings.tax_mode).await?;
        Ok(builder.finish())
    }

    /// The single-outlet, single-day row for a register session.
    pub async fn register_closing(&self, session: &RegisterSession) -> DbResult<DailySalesRow> {
        let date = session.business_date;
        let report = self
            .daily_sales(date, date, &OutletScope::single(session.outlet_id.clone()))
            .await?;

        // one-day range: the only row equals the totals row
        let mut row = report.totals;
        row.date = date.format("%Y-%m-%d").to_string();
        Ok(row)
    }
}

/// Runs the four aggregate queries and folds them into a builder.
///
/// An empty scope yields a builder with zero rows for every day.
pub(crate) async fn collect_in(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
    scope: &OutletScope,
    mode: TaxMode,
) -> DbResult<DailyReportBuilder> {
    let mut builder = DailyReportBuilder::new(from, to, mode);
    if scope.is_empty() {
        return Ok(builder);
    }

    // Bills
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT bill_date,
               COUNT(*),
               COALESCE(SUM(gross_cents), 0),
               COALESCE(SUM(discount_cents), 0),
               COALESCE(SUM(net_cents), 0)
        FROM sales
        WHERE status = 'completed' AND bill_date BETWEEN "#,
    );
    qb.push_bind(from).push(" AND ").push_bind(to);
    push_outlet_filter(&mut qb, "outlet_id", scope);
    qb.push(" GROUP BY bill_date");

    let bills = qb
        .build_query_as::<(NaiveDate, i64, i64, i64, i64)>()
        .fetch_all(&mut *conn)
        .await?;
    for (date, count, gross, discount, net) in bills {
        builder.add_bills(
            date,
            count,
            Money::from_cents(gross),
            Money::from_cents(discount),
            Money::from_cents(net),
        );
    }

    // Lines (tax)
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT s.bill_date, i.unit_price_cents, i.line_net_cents
        FROM sale_items i
        JOIN sales s ON s.id = i.sale_id
        WHERE s.status = 'completed' AND s.bill_date BETWEEN "#,
    );
    qb.push_bind(from).push(" AND ").push_bind(to);
    push_outlet_filter(&mut qb, "s.outlet_id", scope);

    let lines = qb
        .build_query_as::<(NaiveDate, i64, i64)>()
        .fetch_all(&mut *conn)
        .await?;
    for (date, unit_price, line_net) in lines {
        builder.add_line(date, Money::from_cents(unit_price), Money::from_cents(line_net));
    }

    // Tenders
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT s.bill_date, p.method, COALESCE(SUM(p.amount_cents), 0)
        FROM payments p
        JOIN sales s ON s.id = p.sale_id
        WHERE s.status = 'completed' AND s.bill_date BETWEEN "#,
    );
    qb.push_bind(from).push(" AND ").push_bind(to);
    push_outlet_filter(&mut qb, "s.outlet_id", scope);
    qb.push(" GROUP BY s.bill_date, p.method");

    let tenders = qb
        .build_query_as::<(NaiveDate, PaymentMethod, i64)>()
        .fetch_all(&mut *conn)
        .await?;
    for (date, method, amount) in tenders {
        builder.add_payment(date, method, Money::from_cents(amount));
    }

    // Credit notes issued
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT issue_date, COUNT(*), COALESCE(SUM(amount_cents), 0)
        FROM credit_notes
        WHERE status <> 'cancelled' AND issue_date BETWEEN "#,
    );
    qb.push_bind(from).push(" AND ").push_bind(to);
    push_outlet_filter(&mut qb, "outlet_id", scope);
    qb.push(" GROUP BY issue_date");

    let notes = qb
        .build_query_as::<(NaiveDate, i64, i64)>()
        .fetch_all(&mut *conn)
        .await?;
    for (date, count, amount) in notes {
        builder.add_credit_notes_issued(date, count, Money::from_cents(amount));
    }

    Ok(builder)
}

// =============================================================================
// Unit Tests
// =============================================================================
