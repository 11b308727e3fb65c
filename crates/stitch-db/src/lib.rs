//! # stitch-db: Database Layer for Stitch POS
//!
//! SQLite persistence for the Stitch outlet backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stitch POS Data Flow                             │
//! │                                                                         │
//! │  stitch-ops command (next-number, daily-report, ...)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stitch-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Sequence      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Sale, Payout  │    │ 001_init.sql │  │   │
//! │  │   │ Settings      │    │ Report, ...   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, settings and repository accessors
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stitch_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stitch.db")).await?;
//!
//! let invoice_no = db.sequences().next("INV").await?;   // "INV000001"
//! let shelf_code = db.barcodes().next_barcode().await?;   // "A-001"
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Settings};

// Repository re-exports for convenience
pub use repository::barcode::BarcodeRepository;
pub use repository::consumption::{ConsumptionRepository, NewConsumption};
pub use repository::credit_note::{CreditNoteRepository, NewCreditNote};
pub use repository::directory::{DirectoryRepository, NewCustomer, NewEmployee, NewOutlet};
pub use repository::payout::{PayoutRepository, RecordPayout};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::register::RegisterRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::{CompletedSale, NewPayment, NewSale, NewSaleLine, SaleRepository};
pub use repository::sequence::SequenceRepository;
pub use repository::transfer::{NewTransfer, TransferRepository};
