//! # GST Policy
//!
//! Apparel is taxed by unit price: cheaper garments fall in the 5% slab,
//! everything above the threshold in the 18% slab. The tax is always split
//! evenly between the central (CGST) and state (SGST) components.
//!
//! ```text
//! unit price <= 2500.00  →  5%   (2.5% CGST + 2.5% SGST)
//! unit price  > 2500.00  →  18%  (9% CGST + 9% SGST)
//! ```
//!
//! The slab is chosen from the unit price, not the line total: three shirts
//! at 1000.00 each stay in the 5% slab even though the line is 3000.00.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::money::Money;
use crate::types::{TaxMode, TaxRate};

/// Highest unit price taxed at [`LOWER_RATE`].
pub const SLAB_THRESHOLD: Money = Money::from_major(2500);

/// 5%
pub const LOWER_RATE: TaxRate = TaxRate::from_bps(500);

/// 18%
pub const UPPER_RATE: TaxRate = TaxRate::from_bps(1800);

/// Rate applicable to an item sold at `unit_price`.
///
/// ## Example
/// ```rust
/// use stitch_core::money::Money;
/// use stitch_core::tax::rate_for_unit_price;
///
/// assert_eq!(rate_for_unit_price(Money::from_major(2500)).bps(), 500);
/// assert_eq!(rate_for_unit_price(Money::from_cents(250_001)).bps(), 1800);
/// ```
pub fn rate_for_unit_price(unit_price: Money) -> TaxRate {
    if unit_price <= SLAB_THRESHOLD {
        LOWER_RATE
    } else {
        UPPER_RATE
    }
}

/// Taxable value and tax components of one or more lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub taxable: Money,
    pub cgst: Money,
    pub sgst: Money,
}

impl TaxBreakdown {
    pub fn total_tax(&self) -> Money {
        self.cgst + self.sgst
    }
}

impl Add for TaxBreakdown {
    type Output = TaxBreakdown;

    fn add(self, other: TaxBreakdown) -> TaxBreakdown {
        TaxBreakdown {
            taxable: self.taxable + other.taxable,
            cgst: self.cgst + other.cgst,
            sgst: self.sgst + other.sgst,
        }
    }
}

impl AddAssign for TaxBreakdown {
    fn add_assign(&mut self, other: TaxBreakdown) {
        *self = *self + other;
    }
}

/// Tax on a single sale line.
///
/// `line_net` is the amount after line discount. In inclusive mode the tax
/// is carved out of it; in exclusive mode it is charged on top.
///
/// ## Example
/// ```rust
/// use stitch_core::money::Money;
/// use stitch_core::tax::line_tax;
/// use stitch_core::types::TaxMode;
///
/// let t = line_tax(Money::from_major(1050), Money::from_major(1050), TaxMode::Inclusive);
/// assert_eq!(t.taxable, Money::from_major(1000));
/// assert_eq!(t.total_tax(), Money::from_major(50));
///
/// let t = line_tax(Money::from_major(1000), Money::from_major(1000), TaxMode::Exclusive);
/// assert_eq!(t.taxable, Money::from_major(1000));
/// assert_eq!(t.total_tax(), Money::from_major(50));
/// ```
pub fn line_tax(unit_price: Money, line_net: Money, mode: TaxMode) -> TaxBreakdown {
    let rate = rate_for_unit_price(unit_price);

    let (taxable, tax) = match mode {
        TaxMode::Inclusive => line_net.extract_inclusive_tax(rate),
        TaxMode::Exclusive => (line_net, line_net.calculate_tax(rate)),
    };
    let (cgst, sgst) = tax.split_even();

    TaxBreakdown { taxable, cgst, sgst }
}

/// What the customer owes for a bill with the given net and tax.
pub fn amount_due(net: Money, tax: Money, mode: TaxMode) -> Money {
    match mode {
        TaxMode::Inclusive => net,
        TaxMode::Exclusive => net + tax,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
