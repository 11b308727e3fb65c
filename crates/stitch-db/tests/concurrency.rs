//! Concurrent issuance against a file-backed database.
//!
//! The in-memory pool used by the unit tests has a single connection, so
//! it cannot interleave writers. These tests open a real WAL database with
//! several pooled connections and race tasks against the counters and the
//! documents that read before they write.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use stitch_core::barcode::BarcodeCode;
use stitch_core::numbering::parse_number;
use stitch_core::{
    CoreError, Money, PaymentMethod, Product, RegisterStatus, StockLine, TransferStatus,
};
use stitch_db::{
    Database, DbConfig, DbError, NewConsumption, NewEmployee, NewOutlet, NewPayment, NewProduct,
    NewSale, NewSaleLine, NewTransfer,
};
use tempfile::TempDir;

const TASKS: usize = 8;
const PER_TASK: usize = 25;

async fn file_db(dir: &TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("stitch.db"))
        .max_connections(TASKS as u32)
        .busy_timeout(Duration::from_secs(30));
    Database::new(config).await.unwrap()
}

/// Two outlets, an employee based at the first and one product stocked
/// there.
struct Floor {
    outlet: String,
    second_outlet: String,
    employee: String,
    product: String,
}

async fn floor(db: &Database, stock: i64) -> Floor {
    let dir = db.directory();
    let outlet = dir
        .create_outlet(NewOutlet {
            code: "BLR-01".into(),
            name: "Indiranagar".into(),
        })
        .await
        .unwrap();
    let second_outlet = dir
        .create_outlet(NewOutlet {
            code: "MYS-02".into(),
            name: "Mysuru".into(),
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
    let product = db
        .products()
        .create(NewProduct {
            sku: "TR-CHN-32".into(),
            name: "Chinos (32)".into(),
            category: Some("Trousers".into()),
            mrp: Money::from_major(1299),
            barcode: None,
        })
        .await
        .unwrap();
    db.products()
        .adjust_stock(&outlet.id, &product.id, stock)
        .await
        .unwrap();

    Floor {
        outlet: outlet.id,
        second_outlet: second_outlet.id,
        employee: employee.id,
        product: product.id,
    }
}

fn one_unit(product_id: &str) -> Vec<StockLine> {
    vec![StockLine {
        product_id: product_id.to_string(),
        quantity: 1,
    }]
}

fn assert_gapless(prefix: &str, numbers: &[String]) {
    let values: HashSet<i64> = numbers
        .iter()
        .map(|n| parse_number(prefix, n).unwrap())
        .collect();
    assert_eq!(values.len(), numbers.len(), "{prefix} number issued twice");
    let expected: HashSet<i64> = (1..=numbers.len() as i64).collect();
    assert_eq!(values, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_document_numbers_are_unique_and_gapless() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let repo = db.sequences();
        handles.push(tokio::spawn(async move {
            let mut issued = Vec::with_capacity(PER_TASK);
            for _ in 0..PER_TASK {
                issued.push(repo.next("INV").await.unwrap());
            }
            issued
        }));
    }

    let mut values = HashSet::new();
    for handle in handles {
        let issued = handle.await.unwrap();

        // Within one task the numbers only go up
        let parsed: Vec<i64> = issued
            .iter()
            .map(|n| parse_number("INV", n).unwrap())
            .collect();
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));

        for value in parsed {
            assert!(values.insert(value), "INV{value} issued twice");
        }
    }

    let total = (TASKS * PER_TASK) as i64;
    assert_eq!(values.len() as i64, total);
    assert_eq!(values.iter().min(), Some(&1));
    assert_eq!(values.iter().max(), Some(&total));

    let counter = db.sequences().peek("INV").await.unwrap().unwrap();
    assert_eq!(counter.next_number, total + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_barcodes_are_unique() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    // An existing catalog the counter must continue from
    db.products()
        .create(NewProduct {
            sku: "SH-OXF-M".into(),
            name: "Oxford Shirt (M)".into(),
            category: Some("Shirts".into()),
            mrp: Money::from_major(1499),
            barcode: Some("C-120".into()),
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let repo = db.barcodes();
        handles.push(tokio::spawn(async move {
            let mut codes = Vec::with_capacity(PER_TASK);
            for _ in 0..PER_TASK {
                codes.push(repo.next_barcode().await.unwrap());
            }
            codes
        }));
    }

    let mut ordinals = HashSet::new();
    for handle in handles {
        for code in handle.await.unwrap() {
            let parsed = BarcodeCode::parse(&code).unwrap();
            assert!(ordinals.insert(parsed.ordinal()), "{code} issued twice");
        }
    }

    let first = BarcodeCode::parse("C-121").unwrap().ordinal();
    let expected: HashSet<i64> = (first..first + (TASKS * PER_TASK) as i64).collect();
    assert_eq!(ordinals, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_get_distinct_invoices() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let outlet = db
        .directory()
        .create_outlet(NewOutlet {
            code: "BLR-01".into(),
            name: "Indiranagar".into(),
        })
        .await
        .unwrap();
    let employee = db
        .directory()
        .create_employee(NewEmployee {
            name: "Asha".into(),
            home_outlet_id: Some(outlet.id.clone()),
        })
        .await
        .unwrap();
    let product = db
        .products()
        .create(NewProduct {
            sku: "KU-COT-L".into(),
            name: "Cotton Kurta (L)".into(),
            category: Some("Kurtas".into()),
            mrp: Money::from_major(899),
            barcode: None,
        })
        .await
        .unwrap();
    db.products()
        .adjust_stock(&outlet.id, &product.id, 100)
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let sales = db.sales();
        let sale = NewSale {
            outlet_id: outlet.id.clone(),
            employee_id: employee.id.clone(),
            customer_id: None,
            bill_date: day,
            lines: vec![NewSaleLine {
                product_id: product.id.clone(),
                quantity: 2,
                unit_price: None,
                discount: Money::zero(),
            }],
            payments: vec![NewPayment {
                method: PaymentMethod::Cash,
                amount: Money::from_major(1798),
                reference: None,
            }],
            created_by: "cashier-1".into(),
        };
        handles.push(tokio::spawn(async move {
            sales.complete_sale(sale).await.unwrap().sale.invoice_number
        }));
    }

    let mut invoices = HashSet::new();
    for handle in handles {
        assert!(invoices.insert(handle.await.unwrap()));
    }
    assert_eq!(invoices.len(), TASKS);

    let remaining = db.products().stock(&outlet.id, &product.id).await.unwrap();
    assert_eq!(remaining, 100 - 2 * TASKS as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumption_slips_all_succeed() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;
    let floor = floor(&db, 500).await;

    // The outlet comes from the employee's home, so every slip reads the
    // employee before it writes.
    let mut handles = Vec::new();
    for task in 0..TASKS {
        let repo = db.consumptions();
        let employee = floor.employee.clone();
        let product = floor.product.clone();
        handles.push(tokio::spawn(async move {
            let mut numbers = Vec::with_capacity(PER_TASK);
            for _ in 0..PER_TASK {
                let slip = repo
                    .record(NewConsumption {
                        employee_id: Some(employee.clone()),
                        lines: one_unit(&product),
                        created_by: format!("tailor-{task}"),
                        ..NewConsumption::default()
                    })
                    .await
                    .unwrap();
                numbers.push(slip.number);
            }
            numbers
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.extend(handle.await.unwrap());
    }
    assert_eq!(numbers.len(), TASKS * PER_TASK);
    assert_gapless("CONWS", &numbers);

    let remaining = db.products().stock(&floor.outlet, &floor.product).await.unwrap();
    assert_eq!(remaining, 500 - (TASKS * PER_TASK) as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_dispatch_and_receive() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;
    let floor = floor(&db, 500).await;

    // Each task dispatches a transfer and books the previous one in, so
    // receipts from one task interleave with dispatches from the others.
    let mut handles = Vec::new();
    for task in 0..TASKS {
        let repo = db.transfers();
        let from = floor.outlet.clone();
        let to = floor.second_outlet.clone();
        let product = floor.product.clone();
        handles.push(tokio::spawn(async move {
            let mut numbers = Vec::with_capacity(PER_TASK);
            let mut pending: Option<String> = None;
            for _ in 0..PER_TASK {
                let transfer = repo
                    .create(NewTransfer {
                        from_outlet_id: from.clone(),
                        to_outlet_id: to.clone(),
                        lines: one_unit(&product),
                        created_by: format!("manager-{task}"),
                    })
                    .await
                    .unwrap();
                numbers.push(transfer.number);

                if let Some(id) = pending.replace(transfer.id) {
                    let received = repo.receive(&id, "receiver").await.unwrap();
                    assert_eq!(received.status, TransferStatus::Received);
                }
            }
            if let Some(id) = pending {
                repo.receive(&id, "receiver").await.unwrap();
            }
            numbers
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.extend(handle.await.unwrap());
    }
    assert_gapless("TRF", &numbers);

    let moved = (TASKS * PER_TASK) as i64;
    let products = db.products();
    assert_eq!(products.stock(&floor.outlet, &floor.product).await.unwrap(), 500 - moved);
    assert_eq!(products.stock(&floor.second_outlet, &floor.product).await.unwrap(), moved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_register_close_settles_each_session_once() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;
    let floor = floor(&db, 10).await;

    let mut sessions = Vec::new();
    for day in 1..=PER_TASK as u32 {
        let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        let session = db
            .registers()
            .open(&floor.outlet, date, Money::from_major(2000), "opener")
            .await
            .unwrap();
        sessions.push(session.id);
    }

    // Every task tries to close every session; only one close per session
    // may win and the rest must see it closed, never a locked database.
    let mut handles = Vec::new();
    for task in 0..TASKS {
        let repo = db.registers();
        let sessions = sessions.clone();
        handles.push(tokio::spawn(async move {
            let mut won = Vec::new();
            for id in &sessions {
                match repo.close(id, Money::from_major(2000), &format!("closer-{task}")).await {
                    Ok(closed) => {
                        assert_eq!(closed.status, RegisterStatus::Closed);
                        won.push(closed.id);
                    }
                    Err(DbError::Domain(CoreError::InvalidStatus { .. })) => {}
                    Err(other) => panic!("close of {id} failed: {other}"),
                }
            }
            won
        }));
    }

    let mut closed = Vec::new();
    for handle in handles {
        closed.extend(handle.await.unwrap());
    }
    closed.sort();
    let mut expected = sessions.clone();
    expected.sort();
    assert_eq!(closed, expected);

    for id in &sessions {
        let session = db.registers().get(id).await.unwrap().unwrap();
        assert_eq!(session.status, RegisterStatus::Closed);
        assert_eq!(session.variance_cents, Some(0));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn auto_barcodes_pass_over_codes_entered_by_hand() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;
    let products = db.products();

    // Seeds the counter at A-001
    let first = products
        .create(NewProduct {
            sku: "SEED".into(),
            name: "Seed".into(),
            category: None,
            mrp: Money::from_major(100),
            barcode: None,
        })
        .await
        .unwrap();
    assert_eq!(first.barcode.as_deref(), Some("A-001"));

    // Shelf labels printed by hand ahead of the counter
    let mut by_hand = HashSet::new();
    for ordinal in (3..=90).step_by(3) {
        let code = BarcodeCode::from_ordinal(ordinal).to_string();
        products
            .create(NewProduct {
                sku: format!("HAND-{ordinal}"),
                name: "Hand labelled".into(),
                category: None,
                mrp: Money::from_major(100),
                barcode: Some(code),
            })
            .await
            .unwrap();
        by_hand.insert(ordinal);
    }

    // Auto-coded creates race with creates carrying manufacturer EANs
    let mut handles = Vec::new();
    for task in 0..TASKS {
        let products = db.products();
        handles.push(tokio::spawn(async move {
            let mut created: Vec<Product> = Vec::with_capacity(PER_TASK);
            for i in 0..PER_TASK {
                let barcode = (i % 5 == 0).then(|| format!("890{task:02}{i:08}"));
                created.push(
                    products
                        .create(NewProduct {
                            sku: format!("RACE-{task}-{i}"),
                            name: "Raced".into(),
                            category: None,
                            mrp: Money::from_major(100),
                            barcode,
                        })
                        .await
                        .unwrap(),
                );
            }
            created
        }));
    }

    let mut auto = HashSet::new();
    for handle in handles {
        for product in handle.await.unwrap() {
            let code = product.barcode.unwrap();
            if let Some(parsed) = BarcodeCode::parse(&code) {
                assert!(!by_hand.contains(&parsed.ordinal()), "{code} was already on a shelf");
                assert!(auto.insert(parsed.ordinal()), "{code} issued twice");
            }
        }
    }

    let wanted = TASKS * (PER_TASK - PER_TASK.div_ceil(5));
    assert_eq!(auto.len(), wanted);
    let expected: HashSet<i64> = (2..)
        .filter(|ordinal| !by_hand.contains(ordinal))
        .take(wanted)
        .collect();
    assert_eq!(auto, expected);
}
