//! # Day-wise Sales Register
//!
//! Folds historical sale, payment and credit-note rows into one row per
//! calendar day plus a totals row. Nothing here touches the database; the
//! `stitch-db` report repository feeds raw rows into a
//! [`DailyReportBuilder`].
//!
//! ## Shape of a Report
//! ```text
//! ┌────────────┬───────┬──────────┬─────┬──────────┬─────────┬─────┬──────────┐
//! │ date       │ bills │ gross    │ ... │ cgst     │ sgst    │ ... │ cn_amount│
//! ├────────────┼───────┼──────────┼─────┼──────────┼─────────┼─────┼──────────┤
//! │ 2026-03-01 │     4 │ 12400.00 │     │   295.24 │  295.23 │     │     0.00 │
//! │ 2026-03-02 │     0 │     0.00 │     │     0.00 │    0.00 │     │     0.00 │  ◄ zero day
//! │ 2026-03-03 │     1 │  2999.00 │     │   228.74 │  228.73 │     │   500.00 │
//! ├────────────┼───────┼──────────┼─────┼──────────┼─────────┼─────┼──────────┤
//! │ TOTAL      │     5 │ 15399.00 │     │   523.98 │  523.96 │     │   500.00 │
//! └────────────┴───────┴──────────┴─────┴──────────┴─────────┴─────┴──────────┘
//! ```
//!
//! All arithmetic is integer paise; rounding happens once per line (tax) and
//! never again, so the totals row is the exact sum of the day rows.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;
use crate::tax::{line_tax, TaxBreakdown};
use crate::types::{PaymentMethod, TaxMode};

/// Label used in the `date` column of the totals row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Which outlets a caller may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "outlet_ids")]
pub enum OutletScope {
    /// Head-office view over every outlet.
    All,
    /// Restricted to the listed outlets. An empty list sees nothing.
    Outlets(Vec<String>),
}

impl OutletScope {
    pub fn single(outlet_id: impl Into<String>) -> Self {
        OutletScope::Outlets(vec![outlet_id.into()])
    }

    /// True when the scope cannot match any row.
    pub fn is_empty(&self) -> bool {
        matches!(self, OutletScope::Outlets(ids) if ids.is_empty())
    }

    pub fn includes(&self, outlet_id: &str) -> bool {
        match self {
            OutletScope::All => true,
            OutletScope::Outlets(ids) => ids.iter().any(|id| id == outlet_id),
        }
    }
}

// =============================================================================
// Accumulator
// =============================================================================

/// Running totals for one day (or the whole range).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayActivity {
    pub bills: i64,
    pub gross: Money,
    pub discount: Money,
    pub net: Money,
    pub tax: TaxBreakdown,
    pub cash: Money,
    pub card: Money,
    pub upi: Money,
    pub credit_note_redeemed: Money,
    pub credit_notes_issued: i64,
    pub credit_notes_issued_amount: Money,
}

impl DayActivity {
    fn absorb(&mut self, other: &DayActivity) {
        self.bills += other.bills;
        self.gross += other.gross;
        self.discount += other.discount;
        self.net += other.net;
        self.tax += other.tax;
        self.cash += other.cash;
        self.card += other.card;
        self.upi += other.upi;
        self.credit_note_redeemed += other.credit_note_redeemed;
        self.credit_notes_issued += other.credit_notes_issued;
        self.credit_notes_issued_amount += other.credit_notes_issued_amount;
    }

    fn to_row(self, date: String) -> DailySalesRow {
        DailySalesRow {
            date,
            bills: self.bills,
            gross: self.gross.to_fixed(),
            discount: self.discount.to_fixed(),
            net: self.net.to_fixed(),
            taxable: self.tax.taxable.to_fixed(),
            cgst: self.tax.cgst.to_fixed(),
            sgst: self.tax.sgst.to_fixed(),
            total_tax: self.tax.total_tax().to_fixed(),
            cash: self.cash.to_fixed(),
            card: self.card.to_fixed(),
            upi: self.upi.to_fixed(),
            credit_note_redeemed: self.credit_note_redeemed.to_fixed(),
            credit_notes_issued: self.credit_notes_issued,
            credit_notes_issued_amount: self.credit_notes_issued_amount.to_fixed(),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// One line of the register. Money columns are fixed two-decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySalesRow {
    /// `YYYY-MM-DD`, or [`TOTAL_LABEL`] on the totals row.
    pub date: String,
    pub bills: i64,
    pub gross: String,
    pub discount: String,
    pub net: String,
    pub taxable: String,
    pub cgst: String,
    pub sgst: String,
    pub total_tax: String,
    pub cash: String,
    pub card: String,
    pub upi: String,
    pub credit_note_redeemed: String,
    pub credit_notes_issued: i64,
    pub credit_notes_issued_amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<DailySalesRow>,
    pub totals: DailySalesRow,
}

// =============================================================================
// Builder
// =============================================================================

/// Buckets raw rows by day.
///
/// Every day in `from..=to` has a bucket from the start, so days without
/// activity still produce a (zero) row. Rows dated outside the range are
/// ignored.
#[derive(Debug, Clone)]
pub struct DailyReportBuilder {
    from: NaiveDate,
    to: NaiveDate,
    mode: TaxMode,
    days: BTreeMap<NaiveDate, DayActivity>,
}

impl DailyReportBuilder {
    /// `from` must not be after `to`; validate with
    /// [`validate_date_range`](crate::validation::validate_date_range) first.
    pub fn new(from: NaiveDate, to: NaiveDate, mode: TaxMode) -> Self {
        let mut days = BTreeMap::new();
        let mut day = from;
        while day <= to {
            days.insert(day, DayActivity::default());
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }

        Self { from, to, mode, days }
    }

    fn bucket(&mut self, date: NaiveDate) -> Option<&mut DayActivity> {
        self.days.get_mut(&date)
    }

    /// One completed bill.
    pub fn add_bill(&mut self, date: NaiveDate, gross: Money, discount: Money, net: Money) {
        self.add_bills(date, 1, gross, discount, net);
    }

    /// `count` completed bills with their summed amounts.
    pub fn add_bills(&mut self, date: NaiveDate, count: i64, gross: Money, discount: Money, net: Money) {
        if let Some(day) = self.bucket(date) {
            day.bills += count;
            day.gross += gross;
            day.discount += discount;
            day.net += net;
        }
    }

    /// One line of a completed bill; drives the tax columns.
    pub fn add_line(&mut self, date: NaiveDate, unit_price: Money, line_net: Money) {
        let tax = line_tax(unit_price, line_net, self.mode);
        if let Some(day) = self.bucket(date) {
            day.tax += tax;
        }
    }

    pub fn add_payment(&mut self, date: NaiveDate, method: PaymentMethod, amount: Money) {
        if let Some(day) = self.bucket(date) {
            match method {
                PaymentMethod::Cash => day.cash += amount,
                PaymentMethod::Card => day.card += amount,
                PaymentMethod::Upi => day.upi += amount,
                PaymentMethod::CreditNote => day.credit_note_redeemed += amount,
            }
        }
    }

    pub fn add_credit_note_issued(&mut self, date: NaiveDate, amount: Money) {
        self.add_credit_notes_issued(date, 1, amount);
    }

    pub fn add_credit_notes_issued(&mut self, date: NaiveDate, count: i64, amount: Money) {
        if let Some(day) = self.bucket(date) {
            day.credit_notes_issued += count;
            day.credit_notes_issued_amount += amount;
        }
    }

    /// Sum of every bucket.
    pub fn totals(&self) -> DayActivity {
        let mut total = DayActivity::default();
        for day in self.days.values() {
            total.absorb(day);
        }
        total
    }

    /// Activity for a single day, if it is inside the range.
    pub fn day(&self, date: NaiveDate) -> Option<&DayActivity> {
        self.days.get(&date)
    }

    pub fn finish(self) -> DailySalesReport {
        let totals = self.totals().to_row(TOTAL_LABEL.to_string());
        let rows = self
            .days
            .into_iter()
            .map(|(date, activity)| activity.to_row(date.format("%Y-%m-%d").to_string()))
            .collect();

        DailySalesReport {
            from: self.from,
            to: self.to,
            rows,
            totals,
        }
    }
}

/// Cash the drawer should hold at close: opening float plus cash takings.
pub fn expected_cash(opening: Money, activity: &DayActivity) -> Money {
    opening + activity.cash
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn sample() -> DailyReportBuilder {
        let mut b = DailyReportBuilder::new(d(1), d(5), TaxMode::Inclusive);

        b.add_bill(d(2), Money::from_major(2100), Money::from_major(100), Money::from_major(2000));
        b.add_line(d(2), Money::from_major(1050), Money::from_major(1050));
        b.add_line(d(2), Money::from_major(1050), Money::from_major(950));
        b.add_payment(d(2), PaymentMethod::Cash, Money::from_major(1500));
        b.add_payment(d(2), PaymentMethod::Upi, Money::from_major(500));

        b.add_bill(d(4), Money::from_major(2999), Money::zero(), Money::from_major(2999));
        b.add_line(d(4), Money::from_major(2999), Money::from_major(2999));
        b.add_payment(d(4), PaymentMethod::CreditNote, Money::from_major(2999));
        b.add_credit_note_issued(d(4), Money::from_major(500));
        b
    }

    #[test]
    fn test_every_day_has_a_row() {
        let report = sample().finish();
        assert_eq!(report.rows.len(), 5);

        let zero_rows = report.rows.iter().filter(|r| r.bills == 0).count();
        assert_eq!(zero_rows, 3);

        let zero = &report.rows[0];
        assert_eq!(zero.date, "2026-03-01");
        assert_eq!(zero.gross, "0.00");
        assert_eq!(zero.cgst, "0.00");
        assert_eq!(zero.credit_notes_issued_amount, "0.00");
    }

    #[test]
    fn test_rows_are_in_date_order() {
        let report = sample().finish();
        let dates: Vec<&str> = report.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            ["2026-03-01", "2026-03-02", "2026-03-03", "2026-03-04", "2026-03-05"]
        );
    }

    #[test]
    fn test_totals_equal_sum_of_rows() {
        let report = sample().finish();

        let sum = |f: fn(&DailySalesRow) -> &String| -> Money {
            report.rows.iter().map(|r| f(r).parse::<Money>().unwrap()).sum()
        };

        assert_eq!(report.totals.date, TOTAL_LABEL);
        assert_eq!(report.totals.bills, report.rows.iter().map(|r| r.bills).sum::<i64>());
        assert_eq!(sum(|r| &r.gross).to_fixed(), report.totals.gross);
        assert_eq!(sum(|r| &r.net).to_fixed(), report.totals.net);
        assert_eq!(sum(|r| &r.taxable).to_fixed(), report.totals.taxable);
        assert_eq!(sum(|r| &r.cgst).to_fixed(), report.totals.cgst);
        assert_eq!(sum(|r| &r.sgst).to_fixed(), report.totals.sgst);
        assert_eq!(sum(|r| &r.total_tax).to_fixed(), report.totals.total_tax);
        assert_eq!(sum(|r| &r.cash).to_fixed(), report.totals.cash);
        assert_eq!(
            sum(|r| &r.credit_note_redeemed).to_fixed(),
            report.totals.credit_note_redeemed
        );
    }

    #[test]
    fn test_tax_columns() {
        let report = sample().finish();
        let day2 = &report.rows[1];

        // 1050.00 incl. 5% → 1000.00 + 50.00; 950.00 incl. 5% → 904.76 + 45.24
        assert_eq!(day2.taxable, "1904.76");
        assert_eq!(day2.total_tax, "95.24");
        assert_eq!(day2.cgst, "47.62");
        assert_eq!(day2.sgst, "47.62");

        // 2999.00 is above the threshold → 18%
        let day4 = &report.rows[3];
        assert_eq!(day4.taxable, "2541.53");
        assert_eq!(day4.total_tax, "457.47");
        assert_eq!(day4.cgst, "228.74");
        assert_eq!(day4.sgst, "228.73");
    }

    #[test]
    fn test_payment_split() {
        let report = sample().finish();
        assert_eq!(report.rows[1].cash, "1500.00");
        assert_eq!(report.rows[1].upi, "500.00");
        assert_eq!(report.rows[3].credit_note_redeemed, "2999.00");
        assert_eq!(report.rows[3].credit_notes_issued, 1);
        assert_eq!(report.rows[3].credit_notes_issued_amount, "500.00");
    }

    #[test]
    fn test_rows_outside_range_are_ignored() {
        let mut b = DailyReportBuilder::new(d(1), d(1), TaxMode::Inclusive);
        b.add_bill(d(2), Money::from_major(10), Money::zero(), Money::from_major(10));
        let report = b.finish();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.totals.bills, 0);
    }

    #[test]
    fn test_identical_input_serializes_identically() {
        let a = serde_json::to_string(&sample().finish()).unwrap();
        let b = serde_json::to_string(&sample().finish()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_outlet_scope() {
        assert!(OutletScope::All.includes("x"));
        assert!(!OutletScope::All.is_empty());
        assert!(OutletScope::Outlets(vec![]).is_empty());
        assert!(OutletScope::single("o-1").includes("o-1"));
        assert!(!OutletScope::single("o-1").includes("o-2"));
    }

    #[test]
    fn test_expected_cash() {
        let b = sample();
        let day = b.day(d(2)).unwrap();
        assert_eq!(
            expected_cash(Money::from_major(2000), day),
            Money::from_major(3500)
        );
    }
}
