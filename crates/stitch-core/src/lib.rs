//! # stitch-core: Pure Business Logic for Stitch POS
//!
//! Numbering formats, barcode codes, payout slabs, GST policy and the
//! day-wise register fold. Everything here is deterministic and free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stitch POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             stitch-ops (operator CLI) / request handlers        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stitch-db (Database Layer)                     │   │
//! │  │   sequence counters, barcodes, payouts, sales, reports (SQLite) │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stitch-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ numbering │  │  barcode  │  │  payout   │  │  report   │  │   │
//! │  │   │ INV000042 │  │   A-001   │  │   slabs   │  │ day rows  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │    tax    │  │ location  │  │ validation│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Outlet, Product, Sale, CreditNote, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`numbering`] - Document families and number formatting
//! - [`barcode`] - Rolling `A-001` shelf codes
//! - [`payout`] - Slab matching and payout pricing
//! - [`tax`] - GST slab selection and CGST/SGST split
//! - [`report`] - Day-wise sales register
//! - [`location`] - Outlet resolution for documents
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stitch_core::money::Money;
//! use stitch_core::tax::rate_for_unit_price;
//!
//! let price: Money = "2999.00".parse().unwrap();
//! let tax = price.calculate_tax(rate_for_unit_price(price));
//!
//! // 2999.00 at 18% = 539.82
//! assert_eq!(tax.to_string(), "539.82");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod error;
pub mod location;
pub mod money;
pub mod numbering;
pub mod payout;
pub mod report;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use barcode::{BarcodeCode, BarcodeStrategy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::{DocumentFamily, SequenceCounter};
pub use payout::{PayoutEntry, PayoutQuote, PayoutSlab};
pub use report::{DailySalesReport, DailySalesRow, OutletScope};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single sale, transfer or consumption line.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_LINE_QUANTITY: i64 = 9999;

/// Longest report range accepted when no configuration overrides it.
pub const DEFAULT_MAX_REPORT_DAYS: i64 = 366;
