//! # Command Handlers
//!
//! One function per subcommand. Each returns a serializable result that
//! [`Render`] turns into plain text; `--format json` prints it with serde.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use stitch_core::{
    BarcodeStrategy, DailySalesReport, DailySalesRow, Money, Outlet, OutletScope, PayoutQuote,
};
use stitch_db::migrations::{migration_status, MigrationStatus};
use stitch_db::Database;

use crate::error::{OpsError, OpsResult};

/// Plain-text form of a command result.
pub trait Render: Serialize {
    fn render_text(&self) -> String;
}

// =============================================================================
// next-number
// =============================================================================

#[derive(Debug, Serialize)]
pub struct IssuedNumbers {
    pub prefix: String,
    pub numbers: Vec<String>,
}

pub async fn next_number(db: &Database, prefix: &str, count: u32) -> OpsResult<IssuedNumbers> {
    let prefix = prefix.trim().to_uppercase();
    let sequences = db.sequences();

    let mut numbers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        numbers.push(sequences.next(&prefix).await?);
    }

    info!(prefix = %prefix, count, "Issued document numbers");
    Ok(IssuedNumbers { prefix, numbers })
}

impl Render for IssuedNumbers {
    fn render_text(&self) -> String {
        self.numbers.join("\n")
    }
}

// =============================================================================
// next-barcode
// =============================================================================

#[derive(Debug, Serialize)]
pub struct IssuedBarcodes {
    pub strategy: BarcodeStrategy,
    pub codes: Vec<String>,
}

pub async fn next_barcode(db: &Database, count: u32) -> OpsResult<IssuedBarcodes> {
    let barcodes = db.barcodes();
    if barcodes.strategy() == BarcodeStrategy::LatestRow && count > 1 {
        // Nothing is persisted between calls, so every call sees the same
        // newest product.
        warn!(count, "latest_row strategy repeats the same code until a product uses it");
    }

    let mut codes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        codes.push(barcodes.next_barcode().await?);
    }

    Ok(IssuedBarcodes {
        strategy: barcodes.strategy(),
        codes,
    })
}

impl Render for IssuedBarcodes {
    fn render_text(&self) -> String {
        self.codes.join("\n")
    }
}

// =============================================================================
// payout-quote
// =============================================================================

/// Money goes out as fixed two-decimal strings, like the report columns.
#[derive(Debug, Serialize)]
pub struct QuoteResult {
    pub outlet_code: String,
    pub amount: String,
    /// `None` when no active slab qualifies.
    pub quote: Option<QuoteLine>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct QuoteLine {
    pub min_amount: String,
    pub payout_per_unit: String,
    pub unit_count: i64,
    pub total_payout: String,
}

impl From<PayoutQuote> for QuoteLine {
    fn from(quote: PayoutQuote) -> Self {
        QuoteLine {
            min_amount: quote.min_amount.to_fixed(),
            payout_per_unit: quote.payout_per_unit.to_fixed(),
            unit_count: quote.unit_count,
            total_payout: quote.total_payout.to_fixed(),
        }
    }
}

pub async fn payout_quote(db: &Database, outlet: &str, amount: Money) -> OpsResult<QuoteResult> {
    let outlet = resolve_outlet(db, outlet).await?;
    let quote = db.payouts().compute_payout(&outlet.id, amount).await?;

    Ok(QuoteResult {
        outlet_code: outlet.code,
        amount: amount.to_fixed(),
        quote: quote.map(QuoteLine::from),
    })
}

impl Render for QuoteResult {
    fn render_text(&self) -> String {
        match &self.quote {
            None => format!("{} at {}: no payout slab qualifies", self.amount, self.outlet_code),
            Some(q) => format!(
                "{} at {}: slab {} @ {} per unit, {} unit(s), payout {}",
                self.amount,
                self.outlet_code,
                q.min_amount,
                q.payout_per_unit,
                q.unit_count,
                q.total_payout
            ),
        }
    }
}

// =============================================================================
// daily-report
// =============================================================================

pub async fn daily_report(
    db: &Database,
    from: NaiveDate,
    to: Option<NaiveDate>,
    outlets: &[String],
) -> OpsResult<DailySalesReport> {
    let scope = if outlets.is_empty() {
        OutletScope::All
    } else {
        let mut ids = Vec::with_capacity(outlets.len());
        for key in outlets {
            ids.push(resolve_outlet(db, key).await?.id);
        }
        OutletScope::Outlets(ids)
    };

    let report = db.reports().daily_sales(from, to.unwrap_or(from), &scope).await?;
    Ok(report)
}

impl Render for DailySalesReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<10} {:>5} {:>12} {:>10} {:>12} {:>12} {:>10} {:>10} {:>10} {:>12} {:>12} {:>12} {:>10} {:>4} {:>10}",
            "date", "bills", "gross", "discount", "net", "taxable", "cgst", "sgst", "total_tax",
            "cash", "card", "upi", "cn_redeem", "cn", "cn_amount"
        );
        for row in self.rows.iter().chain(std::iter::once(&self.totals)) {
            let _ = writeln!(out, "{}", row_line(row));
        }
        out.trim_end().to_string()
    }
}

fn row_line(row: &DailySalesRow) -> String {
    format!(
        "{:<10} {:>5} {:>12} {:>10} {:>12} {:>12} {:>10} {:>10} {:>10} {:>12} {:>12} {:>12} {:>10} {:>4} {:>10}",
        row.date,
        row.bills,
        row.gross,
        row.discount,
        row.net,
        row.taxable,
        row.cgst,
        row.sgst,
        row.total_tax,
        row.cash,
        row.card,
        row.upi,
        row.credit_note_redeemed,
        row.credit_notes_issued,
        row.credit_notes_issued_amount
    )
}

// =============================================================================
// migrate
// =============================================================================

#[derive(Debug, Serialize)]
pub struct MigrateResult {
    pub before: MigrationStatus,
    pub after: MigrationStatus,
}

/// Expects a database opened without automatic migrations.
pub async fn migrate(db: &Database) -> OpsResult<MigrateResult> {
    let before = migration_status(db.pool()).await?;
    db.run_migrations().await?;
    let after = migration_status(db.pool()).await?;

    Ok(MigrateResult { before, after })
}

impl Render for MigrateResult {
    fn render_text(&self) -> String {
        let applied_now = self.after.applied.saturating_sub(self.before.applied);
        if applied_now == 0 {
            format!("Schema is current ({} migration(s))", self.after.applied)
        } else {
            format!(
                "Applied {} migration(s); {} of {} now applied",
                applied_now, self.after.applied, self.after.embedded
            )
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Finds an outlet by code (case-insensitive) or by id.
async fn resolve_outlet(db: &Database, key: &str) -> OpsResult<Outlet> {
    let directory = db.directory();
    if let Some(outlet) = directory.get_outlet_by_code(key).await? {
        return Ok(outlet);
    }
    directory
        .get_outlet(key)
        .await?
        .ok_or_else(|| OpsError::UnknownOutlet(key.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
