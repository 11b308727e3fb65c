//! # Payout Slabs
//!
//! "WOW bill" payouts: a salesperson earns a fixed amount per whole slab
//! threshold covered by a qualifying bill.
//!
//! ## Matching Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Slabs at outlet BLR-01          Sale of 5200.00 at BLR-01              │
//! │  ┌────────────┬──────────┐                                              │
//! │  │ min_amount │ per unit │   1. keep slabs of THIS outlet only          │
//! │  ├────────────┼──────────┤   2. keep active slabs                       │
//! │  │   1000.00  │   50.00  │   3. keep min_amount <= 5200.00              │
//! │  │   5000.00  │  300.00  │◄─ 4. highest min_amount wins                 │
//! │  │  10000.00  │  800.00  │                                              │
//! │  └────────────┴──────────┘   units = floor(5200 / 5000) = 1             │
//! │                              total = 1 × 300.00         = 300.00        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The outlet filter is applied before anything else. A slab negotiated for
//! one outlet must never price a sale at another.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A configured payout tier for one outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PayoutSlab {
    pub id: String,
    pub outlet_id: String,
    pub min_amount_cents: i64,
    pub payout_per_unit_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutSlab {
    pub fn min_amount(&self) -> Money {
        Money::from_cents(self.min_amount_cents)
    }

    pub fn payout_per_unit(&self) -> Money {
        Money::from_cents(self.payout_per_unit_cents)
    }
}

/// The outcome of matching a sale against the slab table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutQuote {
    /// Threshold of the matched slab (snapshotted onto the entry).
    pub min_amount: Money,
    pub payout_per_unit: Money,
    pub unit_count: i64,
    pub total_payout: Money,
}

/// One payout row per (employee, customer, bill date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PayoutEntry {
    pub id: String,
    pub outlet_id: String,
    pub employee_id: String,
    pub customer_id: String,
    pub bill_date: NaiveDate,
    pub sale_amount_cents: i64,
    pub slab_min_amount_cents: i64,
    pub payout_per_unit_cents: i64,
    pub unit_count: i64,
    pub total_payout_cents: i64,
    /// Set on insert, never overwritten by recomputation.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutEntry {
    pub fn total_payout(&self) -> Money {
        Money::from_cents(self.total_payout_cents)
    }
}

/// Picks the slab that applies to a sale of `amount` at `outlet_id`.
///
/// Returns the active slab of that outlet with the highest `min_amount`
/// not above `amount`. Ties on `min_amount` cannot occur for active slabs
/// (unique index); if they do in hand-built input, the first one wins.
pub fn select_slab<'a>(
    slabs: &'a [PayoutSlab],
    outlet_id: &str,
    amount: Money,
) -> Option<&'a PayoutSlab> {
    slabs
        .iter()
        .filter(|slab| slab.outlet_id == outlet_id)
        .filter(|slab| slab.is_active)
        .filter(|slab| slab.min_amount() <= amount)
        .fold(None, |best: Option<&PayoutSlab>, slab| match best {
            Some(b) if b.min_amount_cents >= slab.min_amount_cents => Some(b),
            _ => Some(slab),
        })
}

/// Prices a matched slab for a sale amount.
///
/// `None` when the threshold is zero or negative, or when the sale does not
/// cover a single whole unit.
///
/// ## Example
/// ```rust
/// use stitch_core::money::Money;
/// use stitch_core::payout::quote_for_slab;
///
/// let quote = quote_for_slab(
///     Money::from_major(1000),
///     Money::from_major(50),
///     Money::from_major(5200),
/// ).unwrap();
/// assert_eq!(quote.unit_count, 5);
/// assert_eq!(quote.total_payout, Money::from_major(250));
/// ```
pub fn quote_for_slab(min_amount: Money, payout_per_unit: Money, amount: Money) -> Option<PayoutQuote> {
    if !min_amount.is_positive() {
        return None;
    }

    let unit_count = amount.whole_units_of(min_amount);
    if unit_count == 0 {
        return None;
    }

    Some(PayoutQuote {
        min_amount,
        payout_per_unit,
        unit_count,
        total_payout: payout_per_unit * unit_count,
    })
}

/// Slab selection followed by pricing.
///
/// ## Example
/// ```rust
/// use stitch_core::money::Money;
/// use stitch_core::payout::compute_quote;
///
/// // no slabs configured → nothing due
/// assert!(compute_quote(&[], "outlet-1", Money::from_major(5200)).is_none());
/// ```
pub fn compute_quote(slabs: &[PayoutSlab], outlet_id: &str, amount: Money) -> Option<PayoutQuote> {
    let slab = select_slab(slabs, outlet_id, amount)?;
    quote_for_slab(slab.min_amount(), slab.payout_per_unit(), amount)
}

// =============================================================================
// Unit Tests
// =============================================================================
