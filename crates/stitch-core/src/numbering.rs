//! # Document Numbering
//!
//! Formatting rules for sequence-issued business numbers.
//!
//! ## Number Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   INV 000042                                                            │
//! │   ─┬─ ───┬──                                                            │
//! │    │     └── next_number, zero-padded to pad_width (6)                 │
//! │    └──────── prefix (document family)                                  │
//! │                                                                         │
//! │   pad_width = 0  → "INV42"                                             │
//! │   number wider than pad → printed in full: "CONWS12345"                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter itself lives in the database (`sequence_counters`); this
//! module only knows how to turn `(prefix, number, width)` into text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pad width for prefixes that are not a known [`DocumentFamily`].
pub const DEFAULT_PAD_WIDTH: i64 = 5;

/// Document families that draw numbers from the sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    Invoice,
    CreditNote,
    MaterialConsumption,
    StockTransfer,
}

impl DocumentFamily {
    pub const ALL: [DocumentFamily; 4] = [
        DocumentFamily::Invoice,
        DocumentFamily::CreditNote,
        DocumentFamily::MaterialConsumption,
        DocumentFamily::StockTransfer,
    ];

    /// Counter key and printed prefix.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentFamily::Invoice => "INV",
            DocumentFamily::CreditNote => "CRN",
            DocumentFamily::MaterialConsumption => "CONWS",
            DocumentFamily::StockTransfer => "TRF",
        }
    }

    /// Zero-padding used when the counter row is first created.
    pub const fn pad_width(&self) -> i64 {
        match self {
            DocumentFamily::Invoice => 6,
            DocumentFamily::CreditNote => 5,
            DocumentFamily::MaterialConsumption => 4,
            DocumentFamily::StockTransfer => 5,
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.prefix() == prefix)
    }
}

/// Initial pad width for a counter that does not exist yet.
///
/// ```rust
/// use stitch_core::numbering::{default_pad_width, DEFAULT_PAD_WIDTH};
///
/// assert_eq!(default_pad_width("INV", DEFAULT_PAD_WIDTH), 6);
/// assert_eq!(default_pad_width("GIFT", 3), 3);
/// ```
pub fn default_pad_width(prefix: &str, fallback: i64) -> i64 {
    DocumentFamily::from_prefix(prefix)
        .map(|f| f.pad_width())
        .unwrap_or(fallback)
}

/// Formats `prefix + zero_pad(number, pad_width)`.
///
/// ## Example
/// ```rust
/// use stitch_core::numbering::format_number;
///
/// assert_eq!(format_number("INV", 42, 6), "INV000042");
/// assert_eq!(format_number("INV", 42, 0), "INV42");
/// assert_eq!(format_number("CONWS", 12345, 4), "CONWS12345");
/// ```
pub fn format_number(prefix: &str, number: i64, pad_width: i64) -> String {
    let width = pad_width.max(0) as usize;
    format!("{}{:0>width$}", prefix, number, width = width)
}

/// A persisted counter row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SequenceCounter {
    pub prefix: String,
    /// The number the NEXT issuance will print.
    pub next_number: i64,
    pub pad_width: i64,
    pub updated_at: DateTime<Utc>,
}

impl SequenceCounter {
    /// What the next issuance would return, without consuming it.
    pub fn peek(&self) -> String {
        format_number(&self.prefix, self.next_number, self.pad_width)
    }
}

/// Parses the numeric tail back out of an issued number.
///
/// Returns `None` when the text does not start with `prefix` or the rest is
/// not all digits.
pub fn parse_number(prefix: &str, formatted: &str) -> Option<i64> {
    let digits = formatted.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
