//! # Repository Module
//!
//! Database repository implementations for Stitch POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (stitch-ops, seed, request handler)                            │
//! │       │                                                                 │
//! │       │  db.sales().complete_sale(new_sale)                            │
//! │       ▼                                                                 │
//! │  SaleRepository ── one transaction ──┐                                 │
//! │       │                              │                                  │
//! │       ├─ sequence::next_in   (INV)   │  helpers take                   │
//! │       ├─ credit_note::redeem_in      │  &mut SqliteConnection so they  │
//! │       ├─ product::adjust_in          │  join the caller's transaction  │
//! │       └─ payout::record_payout_in    │                                  │
//! │                                      ▼                                  │
//! │  SQLite Database                  COMMIT / ROLLBACK                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SequenceRepository`] - Document number counters
//! - [`BarcodeRepository`] - Shelf code allocation
//! - [`DirectoryRepository`] - Outlets, employees, customers
//! - [`ProductRepository`] - Products and outlet stock
//! - [`PayoutRepository`] - Payout slabs and entries
//! - [`SaleRepository`] - Sales, items and payments
//! - [`CreditNoteRepository`] - Credit note issue and redemption
//! - [`RegisterRepository`] - Register open/close
//! - [`TransferRepository`] - Stock transfers between outlets
//! - [`ConsumptionRepository`] - Material consumption slips
//! - [`ReportRepository`] - Day-wise sales register

use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use stitch_core::OutletScope;

use crate::error::DbResult;

pub mod barcode;
pub mod consumption;
pub mod credit_note;
pub mod directory;
pub mod payout;
pub mod product;
pub mod register;
pub mod report;
pub mod sale;
pub mod sequence;
pub mod transfer;

pub use barcode::BarcodeRepository;
pub use consumption::ConsumptionRepository;
pub use credit_note::CreditNoteRepository;
pub use directory::DirectoryRepository;
pub use payout::PayoutRepository;
pub use product::ProductRepository;
pub use register::RegisterRepository;
pub use report::ReportRepository;
pub use sale::SaleRepository;
pub use sequence::SequenceRepository;
pub use transfer::TransferRepository;

/// Opens a transaction that holds the write lock from its first statement.
///
/// A deferred transaction that reads before it writes fails at once with
/// `SQLITE_BUSY` when another writer committed in between; the busy timeout
/// only covers acquiring the lock, not upgrading a stale read snapshot.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}

/// Appends `AND <column> IN (..)` for a restricted scope.
///
/// Callers short-circuit on an empty scope; `IN ()` is not valid SQLite.
pub(crate) fn push_outlet_filter(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, scope: &OutletScope) {
    if let OutletScope::Outlets(ids) = scope {
        qb.push(" AND ").push(column).push(" IN (");
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(id.clone());
        }
        list.push_unseparated(")");
    }
}
