//! # Sale Repository
//!
//! Database operations for sales, sale items and payments.
//!
//! ## Completing a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_sale(NewSale)                 one transaction                 │
//! │                                                                         │
//! │  1. validate input (ids, lines, payments)                              │
//! │  2. issue INV number              ◄── takes the write lock first       │
//! │  3. price lines from products (snapshot sku/name/price)                │
//! │  4. tax per line, total = amount due for the tax mode                  │
//! │  5. payments must equal the total exactly                              │
//! │  6. INSERT sale, items, payments                                       │
//! │  7. redeem credit-note payments                                        │
//! │  8. outlet stock −qty per line                                         │
//! │  9. payout for (employee, customer, day) when a customer is known     │
//! │                                                                         │
//! │  Any failure → ROLLBACK: no number consumed, no stock moved            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Voiding reverses steps 7 and 8. Payout entries are left as recorded.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use stitch_core::tax::{amount_due, line_tax, TaxBreakdown};
use stitch_core::validation::{validate_non_negative, validate_positive, validate_quantity, validate_required_id};
use stitch_core::{
    CoreError, DocumentFamily, Money, Payment, PaymentMethod, PayoutEntry, Sale, SaleItem, SaleStatus,
    ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::pool::Settings;
use crate::repository::payout::{record_payout_in, RecordPayout};
use crate::repository::sequence::SequenceRepository;
use crate::repository::{begin_write, credit_note, product};

const SALE_COLUMNS: &str = "id, invoice_number, outlet_id, employee_id, customer_id, bill_date, status, \
     gross_cents, discount_cents, net_cents, tax_cents, total_cents, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, sku_snapshot, name_snapshot, unit_price_cents, \
     quantity, discount_cents, line_net_cents";

const PAYMENT_COLUMNS: &str = "id, sale_id, method, amount_cents, reference, created_at";

// =============================================================================
// Input / Output
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    /// Selling price per unit; `None` sells at MRP.
    pub unit_price: Option<Money>,
    /// Discount on the whole line.
    pub discount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub method: PaymentMethod,
    pub amount: Money,
    /// Card slip or UPI reference; the credit note number for
    /// [`PaymentMethod::CreditNote`].
    pub reference: Option<String>,
}

/// Input for [`SaleRepository::complete_sale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub outlet_id: String,
    pub employee_id: String,
    pub customer_id: Option<String>,
    pub bill_date: NaiveDate,
    pub lines: Vec<NewSaleLine>,
    pub payments: Vec<NewPayment>,
    pub created_by: String,
}

/// Everything written by a completed sale.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
    pub payout: Option<PayoutEntry>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    settings: Settings,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, settings: Settings) -> Self {
        SaleRepository { pool, settings }
    }

    /// Completes a sale in one transaction. See the module docs for the
    /// steps.
    ///
    /// ## Errors
    /// - `Validation` for malformed input
    /// - `NotFound` for an unknown product
    /// - `PaymentMismatch` when payments do not equal the amount due
    /// - `CreditNoteUnavailable` for an unusable credit note
    pub async fn complete_sale(&self, new: NewSale) -> DbResult<CompletedSale> {
        validate_new_sale(&new)?;

        let mode = self.settings.tax_mode;
        let mut tx = begin_write(&self.pool).await?;

        let invoice_number = SequenceRepository::next_in(
            &mut tx,
            DocumentFamily::Invoice.prefix(),
            self.settings.default_pad_width,
        )
        .await?;

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        // Price every line from the catalog
        let mut items = Vec::with_capacity(new.lines.len());
        let mut tax = TaxBreakdown::default();
        for line in &new.lines {
            let product = product::fetch_in(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

            let unit_price = line.unit_price.unwrap_or_else(|| product.mrp());
            let line_gross = unit_price.multiply_quantity(line.quantity);
            if line.discount > line_gross {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: line_gross.cents(),
                }
                .into());
            }
            let line_net = line_gross - line.discount;
            tax += line_tax(unit_price, line_net, mode);

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                sku_snapshot: product.sku,
                name_snapshot: product.name,
                unit_price_cents: unit_price.cents(),
                quantity: line.quantity,
                discount_cents: line.discount.cents(),
                line_net_cents: line_net.cents(),
            });
        }

        let gross: Money = items
            .iter()
            .map(|i| i.unit_price().multiply_quantity(i.quantity))
            .sum();
        let discount: Money = items.iter().map(|i| Money::from_cents(i.discount_cents)).sum();
        let net = gross - discount;
        let total = amount_due(net, tax.total_tax(), mode);

        let paid: Money = new.payments.iter().map(|p| p.amount).sum();
        if paid != total {
            return Err(CoreError::PaymentMismatch {
                expected: total.to_fixed(),
                paid: paid.to_fixed(),
            }
            .into());
        }

        let sale = Sale {
            id: sale_id,
            invoice_number,
            outlet_id: new.outlet_id.clone(),
            employee_id: new.employee_id.clone(),
            customer_id: new.customer_id.clone(),
            bill_date: new.bill_date,
            status: SaleStatus::Completed,
            gross_cents: gross.cents(),
            discount_cents: discount.cents(),
            net_cents: net.cents(),
            tax_cents: tax.total_tax().cents(),
            total_cents: total.cents(),
            created_by: new.created_by.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, invoice = %sale.invoice_number, total = %total, "Inserting sale");
        insert_sale(&mut tx, &sale).await?;

        for item in &items {
            insert_item(&mut tx, item).await?;
        }

        let mut payments = Vec::with_capacity(new.payments.len());
        for p in &new.payments {
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                method: p.method,
                amount_cents: p.amount.cents(),
                reference: p.reference.as_deref().map(str::trim).map(str::to_string),
                created_at: now,
            };
            insert_payment(&mut tx, &payment).await?;

            if payment.method == PaymentMethod::CreditNote {
                let number = payment.reference.as_deref().unwrap_or_default();
                credit_note::redeem_in(&mut tx, number, payment.amount()).await?;
            }
            payments.push(payment);
        }

        for item in &items {
            product::adjust_in(&mut tx, &sale.outlet_id, &item.product_id, -item.quantity).await?;
        }

        let payout = match &sale.customer_id {
            Some(customer_id) => {
                let day_total = day_total_in(&mut tx, &sale, customer_id).await?;
                record_payout_in(
                    &mut tx,
                    &RecordPayout {
                        outlet_id: sale.outlet_id.clone(),
                        employee_id: sale.employee_id.clone(),
                        customer_id: customer_id.clone(),
                        bill_date: sale.bill_date,
                        sale_amount: day_total,
                        actor: sale.created_by.clone(),
                    },
                )
                .await?
            }
            None => None,
        };

        tx.commit().await?;

        info!(
            invoice = %sale.invoice_number,
            outlet_id = %sale.outlet_id,
            lines = items.len(),
            total = %sale.total(),
            payout = payout.is_some(),
            "Sale completed"
        );

        Ok(CompletedSale {
            sale,
            items,
            payments,
            payout,
        })
    }

    /// Voids a completed sale: stock goes back to the outlet and credit
    /// note redemptions are reversed.
    pub async fn void_sale(&self, id: &str, actor: &str) -> DbResult<Sale> {
        let mut tx = begin_write(&self.pool).await?;

        let sale = sale_in(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        if sale.status != SaleStatus::Completed {
            return Err(CoreError::InvalidStatus {
                document: "Sale".to_string(),
                id: sale.invoice_number,
                current_status: "voided".to_string(),
            }
            .into());
        }

        let sql = format!(
            "UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {SALE_COLUMNS}"
        );
        let voided = sqlx::query_as::<_, Sale>(&sql)
            .bind(&sale.id)
            .bind(SaleStatus::Voided)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        for item in items_in(&mut tx, &sale.id).await? {
            product::adjust_in(&mut tx, &sale.outlet_id, &item.product_id, item.quantity).await?;
        }

        for payment in payments_in(&mut tx, &sale.id).await? {
            if let (PaymentMethod::CreditNote, Some(number)) = (payment.method, &payment.reference) {
                credit_note::unredeem_in(&mut tx, number, payment.amount()).await?;
            }
        }

        tx.commit().await?;

        info!(invoice = %voided.invoice_number, actor, "Sale voided");
        Ok(voided)
    }

    /// Gets a sale by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        sale_in(&mut conn, id).await
    }

    pub async fn get_by_invoice(&self, invoice_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE invoice_number = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        items_in(&mut conn, sale_id).await
    }

    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        payments_in(&mut conn, sale_id).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_new_sale(new: &NewSale) -> DbResult<()> {
    validate_required_id("outlet_id", &new.outlet_id)?;
    validate_required_id("employee_id", &new.employee_id)?;
    validate_required_id("created_by", &new.created_by)?;

    if new.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }

    for line in &new.lines {
        validate_required_id("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
        validate_non_negative("discount", line.discount)?;
        if let Some(price) = line.unit_price {
            validate_non_negative("unit_price", price)?;
        }
    }

    for payment in &new.payments {
        validate_positive("payment amount", payment.amount)?;
        let has_reference = payment
            .reference
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if payment.method == PaymentMethod::CreditNote && !has_reference {
            return Err(ValidationError::Required {
                field: "credit note number".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, outlet_id, employee_id, customer_id, bill_date, status,
            gross_cents, discount_cents, net_cents, tax_cents, total_cents,
            created_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.invoice_number)
    .bind(&sale.outlet_id)
    .bind(&sale.employee_id)
    .bind(&sale.customer_id)
    .bind(sale.bill_date)
    .bind(sale.status)
    .bind(sale.gross_cents)
    .bind(sale.discount_cents)
    .bind(sale.net_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(&sale.created_by)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Snapshot pattern: sku, name and price are copied onto the item so the
/// bill survives later catalog edits.
async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, sku_snapshot, name_snapshot,
            unit_price_cents, quantity, discount_cents, line_net_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.discount_cents)
    .bind(item.line_net_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, sale_id, method, amount_cents, reference, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.sale_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(&payment.reference)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn sale_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(sale)
}

async fn items_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid");
    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

async fn payments_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE sale_id = ?1 ORDER BY rowid");
    let payments = sqlx::query_as::<_, Payment>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(payments)
}

/// Completed sales of one employee to one customer on the sale's bill date,
/// the sale itself included.
///
/// Counts every outlet, matching the payout entry key; the entry takes the
/// outlet (and its slabs) of the latest sale.
async fn day_total_in(conn: &mut SqliteConnection, sale: &Sale, customer_id: &str) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(total_cents), 0)
        FROM sales
        WHERE status = 'completed'
          AND employee_id = ?1
          AND customer_id = ?2
          AND bill_date = ?3
        "#,
    )
    .bind(&sale.employee_id)
    .bind(customer_id)
    .bind(sale.bill_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::credit_note::NewCreditNote;
    use crate::repository::directory::{NewCustomer, NewEmployee, NewOutlet};
    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};
    use stitch_core::{CreditNoteStatus, TaxMode};

    struct Shop {
        db: Database,
        outlet: String,
        employee: String,
        customer: String,
        shirt: String,
        blazer: String,
    }

    async fn shop(config: DbConfig) -> Shop {
        let db = Database::new(config).await.unwrap();
        let dir = db.directory();

        let outlet = dir
            .create_outlet(NewOutlet {
                code: "BLR-01".into(),
                name: "Indiranagar".into(),
            })
            .await
            .unwrap();
        let employee = dir
            .create_employee(NewEmployee {
                name: "Asha".into(),
                home_outlet_id: Some(outlet.id.clone()),
            })
            .await
            .unwrap();
        let customer = dir
            .create_customer(NewCustomer {
                name: "Ravi".into(),
                phone: Some("9876543210".into()),
            })
            .await
            .unwrap();

        let products = db.products();
        let shirt = products
            .create(NewProduct {
                sku: "SH-01".into(),
                name: "Linen Shirt".into(),
                category: Some("Shirts".into()),
                mrp: Money::from_major(1050),
                barcode: None,
            })
            .await
            .unwrap();
        let blazer = products
            .create(NewProduct {
                sku: "BZ-01".into(),
                name: "Wool Blazer".into(),
                category: Some("Blazers".into()),
                mrp: Money::from_major(2999),
                barcode: None,
            })
            .await
            .unwrap();
        products.adjust_stock(&outlet.id, &shirt.id, 10).await.unwrap();
        products.adjust_stock(&outlet.id, &blazer.id, 2).await.unwrap();

        Shop {
            db,
            outlet: outlet.id,
            employee: employee.id,
            customer: customer.id,
            shirt: shirt.id,
            blazer: blazer.id,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn line(product_id: &str, quantity: i64, discount: Money) -> NewSaleLine {
        NewSaleLine {
            product_id: product_id.to_string(),
            quantity,
            unit_price: None,
            discount,
        }
    }

    fn cash(amount: Money) -> NewPayment {
        NewPayment {
            method: PaymentMethod::Cash,
            amount,
            reference: None,
        }
    }

    fn sale(s: &Shop, lines: Vec<NewSaleLine>, payments: Vec<NewPayment>) -> NewSale {
        NewSale {
            outlet_id: s.outlet.clone(),
            employee_id: s.employee.clone(),
            customer_id: None,
            bill_date: day(),
            lines,
            payments,
            created_by: "cashier-1".into(),
        }
    }

    #[tokio::test]
    async fn test_complete_sale_inclusive_pricing() {
        let s = shop(DbConfig::in_memory()).await;

        let done = s
            .db
            .sales()
            .complete_sale(sale(
                &s,
                vec![line(&s.shirt, 2, Money::from_major(100))],
                vec![cash(Money::from_major(2000))],
            ))
            .await
            .unwrap();

        assert_eq!(done.sale.invoice_number, "INV000001");
        assert_eq!(done.sale.gross_cents, 210_000);
        assert_eq!(done.sale.discount_cents, 10_000);
        assert_eq!(done.sale.net_cents, 200_000);
        // 2000.00 incl. 5% → 95.24 tax
        assert_eq!(done.sale.tax_cents, 9_524);
        assert_eq!(done.sale.total(), Money::from_major(2000));
        assert_eq!(done.items[0].sku_snapshot, "SH-01");
        assert!(done.payout.is_none());

        assert_eq!(s.db.products().stock(&s.outlet, &s.shirt).await.unwrap(), 8);
        assert_eq!(s.db.sales().get_items(&done.sale.id).await.unwrap().len(), 1);
        assert_eq!(s.db.sales().get_payments(&done.sale.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exclusive_pricing_charges_tax_on_top() {
        let s = shop(DbConfig::in_memory().tax_mode(TaxMode::Exclusive)).await;

        let mut new = sale(&s, vec![line(&s.shirt, 1, Money::zero())], vec![]);
        new.lines[0].unit_price = Some(Money::from_major(1000));
        new.payments = vec![cash(Money::from_major(1050))];

        let done = s.db.sales().complete_sale(new).await.unwrap();
        assert_eq!(done.sale.net(), Money::from_major(1000));
        assert_eq!(done.sale.tax_cents, 5_000);
        assert_eq!(done.sale.total(), Money::from_major(1050));
    }

    #[tokio::test]
    async fn test_payment_mismatch_rolls_back_everything() {
        let s = shop(DbConfig::in_memory()).await;
        let sales = s.db.sales();

        let err = sales
            .complete_sale(sale(
                &s,
                vec![line(&s.shirt, 1, Money::zero())],
                vec![cash(Money::from_major(1000))],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::PaymentMismatch { .. })));
        assert_eq!(s.db.products().stock(&s.outlet, &s.shirt).await.unwrap(), 10);

        let ok = sales
            .complete_sale(sale(
                &s,
                vec![line(&s.shirt, 1, Money::zero())],
                vec![cash(Money::from_major(1050))],
            ))
            .await
            .unwrap();
        assert_eq!(ok.sale.invoice_number, "INV000001");
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let s = shop(DbConfig::in_memory()).await;
        let sales = s.db.sales();

        let empty = sale(&s, vec![], vec![]);
        assert!(matches!(
            sales.complete_sale(empty).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));

        let too_much_discount = sale(
            &s,
            vec![line(&s.shirt, 1, Money::from_major(1051))],
            vec![],
        );
        assert!(matches!(
            sales.complete_sale(too_much_discount).await.unwrap_err(),
            DbError::Domain(CoreError::Validation(_))
        ));

        let unknown = sale(
            &s,
            vec![line("missing", 1, Money::zero())],
            vec![cash(Money::from_major(1))],
        );
        assert!(matches!(
            sales.complete_sale(unknown).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_credit_note_redemption_and_void() {
        let s = shop(DbConfig::in_memory()).await;
        let note = s
            .db
            .credit_notes()
            .issue(NewCreditNote {
                outlet_id: s.outlet.clone(),
                source_sale_id: None,
                customer_id: None,
                issue_date: day(),
                amount: Money::from_major(500),
                created_by: "cashier-1".into(),
            })
            .await
            .unwrap();

        let done = s
            .db
            .sales()
            .complete_sale(sale(
                &s,
                vec![line(&s.shirt, 1, Money::zero())],
                vec![
                    NewPayment {
                        method: PaymentMethod::CreditNote,
                        amount: Money::from_major(500),
                        reference: Some(note.number.clone()),
                    },
                    cash(Money::from_major(550)),
                ],
            ))
            .await
            .unwrap();

        let used = s.db.credit_notes().get_by_number(&note.number).await.unwrap().unwrap();
        assert_eq!(used.status, CreditNoteStatus::Redeemed);
        assert_eq!(s.db.products().stock(&s.outlet, &s.shirt).await.unwrap(), 9);

        let voided = s.db.sales().void_sale(&done.sale.id, "manager-1").await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);

        let restored = s.db.credit_notes().get_by_number(&note.number).await.unwrap().unwrap();
        assert_eq!(restored.status, CreditNoteStatus::Open);
        assert_eq!(restored.balance(), Money::from_major(500));
        assert_eq!(s.db.products().stock(&s.outlet, &s.shirt).await.unwrap(), 10);

        let err = s.db.sales().void_sale(&done.sale.id, "manager-1").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_unknown_credit_note_fails_the_sale() {
        let s = shop(DbConfig::in_memory()).await;
        let err = s
            .db
            .sales()
            .complete_sale(sale(
                &s,
                vec![line(&s.shirt, 1, Money::zero())],
                vec![NewPayment {
                    method: PaymentMethod::CreditNote,
                    amount: Money::from_major(1050),
                    reference: Some("CRN09999".into()),
                }],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::CreditNoteUnavailable { .. })));
        assert!(s.db.sales().get_by_invoice("INV000001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sale_with_customer_records_day_payout() {
        let s = shop(DbConfig::in_memory()).await;
        s.db
            .payouts()
            .create_slab(&s.outlet, Money::from_major(1000), Money::from_major(50))
            .await
            .unwrap();

        let mut first = sale(
            &s,
            vec![line(&s.shirt, 2, Money::from_major(100))],
            vec![cash(Money::from_major(2000))],
        );
        first.customer_id = Some(s.customer.clone());
        let done = s.db.sales().complete_sale(first).await.unwrap();
        let entry = done.payout.unwrap();
        assert_eq!(entry.unit_count, 2);
        assert_eq!(entry.total_payout(), Money::from_major(100));

        // a blazer later the same day raises the day's total to 4999.00
        let mut second = sale(
            &s,
            vec![line(&s.blazer, 1, Money::zero())],
            vec![cash(Money::from_major(2999))],
        );
        second.customer_id = Some(s.customer.clone());
        let done = s.db.sales().complete_sale(second).await.unwrap();
        let updated = done.payout.unwrap();
        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.sale_amount_cents, 499_900);
        assert_eq!(updated.unit_count, 4);
        assert_eq!(updated.total_payout(), Money::from_major(200));
    }

    #[tokio::test]
    async fn test_day_payout_spans_outlets() {
        let s = shop(DbConfig::in_memory()).await;
        let second_outlet = s
            .db
            .directory()
            .create_outlet(NewOutlet {
                code: "MYS-02".into(),
                name: "Mysuru".into(),
            })
            .await
            .unwrap();
        s.db.products().adjust_stock(&second_outlet.id, &s.blazer, 1).await.unwrap();
        for outlet in [&s.outlet, &second_outlet.id] {
            s.db.payouts()
                .create_slab(outlet, Money::from_major(1000), Money::from_major(50))
                .await
                .unwrap();
        }

        let mut first = sale(
            &s,
            vec![line(&s.shirt, 2, Money::from_major(100))],
            vec![cash(Money::from_major(2000))],
        );
        first.customer_id = Some(s.customer.clone());
        let entry = s.db.sales().complete_sale(first).await.unwrap().payout.unwrap();
        assert_eq!(entry.sale_amount_cents, 200_000);

        let mut second = sale(
            &s,
            vec![line(&s.blazer, 1, Money::zero())],
            vec![cash(Money::from_major(2999))],
        );
        second.outlet_id = second_outlet.id.clone();
        second.customer_id = Some(s.customer.clone());
        let updated = s.db.sales().complete_sale(second).await.unwrap().payout.unwrap();

        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.outlet_id, second_outlet.id);
        assert_eq!(updated.sale_amount_cents, 499_900);
        assert_eq!(updated.unit_count, 4);
        assert_eq!(updated.total_payout(), Money::from_major(200));
    }
}
