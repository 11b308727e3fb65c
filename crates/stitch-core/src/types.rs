//! # Domain Types
//!
//! Core domain types used throughout Stitch POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Outlet       │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  code           │   │  invoice_number │   │  method         │       │
//! │  │  name           │   │  outlet_id      │   │  amount_cents   │       │
//! │  └─────────────────┘   │  bill_date      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CreditNote     │   │ RegisterSession │   │ StockTransfer   │       │
//! │  │  number (CRN..) │   │ outlet + day    │   │ number (TRF..)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business number: (`INV000001`, `CRN00001`, ...) - issued by the
//!   sequence counter, printed on paper

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5%, 1800 bps = 18%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Whether shelf prices already include tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// MRP includes tax; reports extract the taxable value.
    #[default]
    Inclusive,
    /// Tax is charged on top of the price.
    Exclusive,
}

// =============================================================================
// Directory: outlets, employees, customers
// =============================================================================

/// A physical retail location; the scoping unit for stock, sales and payouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Outlet {
    pub id: String,
    /// Short code printed on documents, e.g. `BLR-01`.
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// Outlet the employee normally works at.
    pub home_outlet_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog article (one size/colour variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    /// Shelf code in the rolling `A-001` sequence (or a legacy value).
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    /// Maximum retail price in paise.
    pub mrp_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the MRP as Money.
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_cents(self.mrp_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid and an invoice number issued.
    Completed,
    /// Sale was cancelled after completion; excluded from reports.
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    /// Redemption of a previously issued credit note.
    CreditNote,
}

/// A completed sale (one invoice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub invoice_number: String,
    pub outlet_id: String,
    pub employee_id: String,
    pub customer_id: Option<String>,
    /// Business day the bill belongs to.
    pub bill_date: NaiveDate,
    pub status: SaleStatus,
    /// Sum of `unit_price × quantity` over all lines.
    pub gross_cents: i64,
    pub discount_cents: i64,
    /// `gross − discount`.
    pub net_cents: i64,
    /// Tax on the bill as computed at completion.
    pub tax_cents: i64,
    /// Amount the customer paid: `net` for inclusive pricing,
    /// `net + tax` for exclusive pricing.
    pub total_cents: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn net(&self) -> Money {
        Money::from_cents(self.net_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in paise at time of sale (frozen); drives the tax slab.
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub discount_cents: i64,
    /// `unit_price × quantity − discount`.
    pub line_net_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_net(&self) -> Money {
        Money::from_cents(self.line_net_cents)
    }
}

/// A payment towards a sale. A sale can carry several (split tender).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// Card slip / UPI reference, or the credit note number being redeemed.
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Credit Note
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteStatus {
    /// Has a remaining balance that can be redeemed.
    Open,
    /// Fully used against later sales.
    Redeemed,
    Cancelled,
}

/// A partial or full sale reversal, redeemable against future purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditNote {
    pub id: String,
    pub number: String,
    pub outlet_id: String,
    pub source_sale_id: Option<String>,
    pub customer_id: Option<String>,
    pub issue_date: NaiveDate,
    pub amount_cents: i64,
    pub redeemed_cents: i64,
    pub status: CreditNoteStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditNote {
    /// Amount still available for redemption.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.amount_cents - self.redeemed_cents)
    }
}

// =============================================================================
// Register Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
}

/// The open/closed state of a cash drawer for one outlet and business day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RegisterSession {
    pub id: String,
    pub outlet_id: String,
    pub business_date: NaiveDate,
    pub status: RegisterStatus,
    pub opening_cash_cents: i64,
    /// Opening cash plus cash takings; set on close.
    pub expected_cash_cents: Option<i64>,
    pub counted_cash_cents: Option<i64>,
    /// `counted − expected`; negative means the drawer is short.
    pub variance_cents: Option<i64>,
    pub opened_by: String,
    pub closed_by: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Stock Movement Documents
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Stock has left the source outlet.
    Dispatched,
    /// Stock has arrived at the destination outlet.
    Received,
}

/// A stock transfer between two outlets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTransfer {
    pub id: String,
    pub number: String,
    pub from_outlet_id: String,
    pub to_outlet_id: String,
    pub status: TransferStatus,
    pub created_by: String,
    pub received_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

/// Product and quantity on a transfer or consumption document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Packing and workshop material used up at an outlet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialConsumption {
    pub id: String,
    pub number: String,
    pub outlet_id: String,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1800);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_mode_default_is_inclusive() {
        assert_eq!(TaxMode::default(), TaxMode::Inclusive);
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::CreditNote).unwrap();
        assert_eq!(json, "\"credit_note\"");
    }

    #[test]
    fn test_credit_note_balance() {
        let now = Utc::now();
        let note = CreditNote {
            id: "cn-1".to_string(),
            number: "CRN00001".to_string(),
            outlet_id: "o-1".to_string(),
            source_sale_id: None,
            customer_id: None,
            issue_date: now.date_naive(),
            amount_cents: 50_000,
            redeemed_cents: 12_500,
            status: CreditNoteStatus::Open,
            created_by: "u-1".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(note.balance(), Money::from_cents(37_500));
    }
}
