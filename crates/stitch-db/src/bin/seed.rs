//! # Seed Data Generator
//!
//! Populates a development database with outlets, staff, payout slabs and
//! an apparel catalog.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p stitch-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p stitch-db --bin seed -- --count 1000 --db ./data/stitch.db
//! ```
//!
//! ## Generated Data
//! - Outlets `BLR-01` and `MYS-02`, one employee each
//! - Payout slabs per outlet (different thresholds per outlet)
//! - Products `{CATEGORY}-{STYLE}-{SIZE}` with shelf barcodes from the
//!   barcode generator, MRP on both sides of the GST threshold
//! - Opening stock at both outlets

use std::env;

use stitch_core::Money;
use stitch_db::repository::directory::{NewCustomer, NewEmployee, NewOutlet};
use stitch_db::repository::product::NewProduct;
use stitch_db::{Database, DbConfig};

/// Category code, category name, styles.
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    ("SH", "Shirts", &["Oxford", "Linen", "Denim", "Flannel", "Poplin"]),
    ("TR", "Trousers", &["Chino", "Formal", "Cargo", "Corduroy"]),
    ("KU", "Kurtas", &["Cotton", "Silk Blend", "Khadi", "Printed"]),
    ("BZ", "Blazers", &["Wool", "Linen", "Velvet"]),
    ("SR", "Sarees", &["Kanjeevaram", "Mysore Silk", "Chiffon", "Cotton"]),
];

/// Size and MRP add-on in whole rupees.
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 100), ("XL", 200), ("XXL", 300)];

/// Outlet code, outlet name, employee, slabs as (threshold, per unit).
const OUTLETS: &[(&str, &str, &str, &[(i64, i64)])] = &[
    ("BLR-01", "Indiranagar", "Asha", &[(1000, 50), (5000, 300), (10000, 800)]),
    ("MYS-02", "Mysuru", "Ravi", &[(2000, 100), (8000, 500)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stitch_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stitch POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stitch_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stitch POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Outlets, staff and slabs
    let mut outlet_ids = Vec::new();
    for (code, name, employee, slabs) in OUTLETS {
        let outlet = db
            .directory()
            .create_outlet(NewOutlet {
                code: code.to_string(),
                name: name.to_string(),
            })
            .await?;

        db.directory()
            .create_employee(NewEmployee {
                name: employee.to_string(),
                home_outlet_id: Some(outlet.id.clone()),
            })
            .await?;

        for (threshold, per_unit) in slabs.iter() {
            db.payouts()
                .create_slab(&outlet.id, Money::from_major(*threshold), Money::from_major(*per_unit))
                .await?;
        }

        println!("✓ Outlet {} with {} payout slabs", outlet.code, slabs.len());
        outlet_ids.push(outlet.id);
    }

    db.directory()
        .create_customer(NewCustomer {
            name: "Walk-in Regular".to_string(),
            phone: Some("9000000001".to_string()),
        })
        .await?;

    // Catalog
    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'catalog: for (category_idx, (code, category, styles)) in CATEGORIES.iter().enumerate() {
        for (style_idx, style) in styles.iter().enumerate() {
            for (size, addon) in SIZES {
                if generated >= count {
                    break 'catalog;
                }

                let seed = category_idx * 100 + style_idx * 10 + generated;
                let product = generate_product(code, category, style, size, *addon, seed);
                let sku = product.sku.clone();

                let created = match db.products().create(product).await {
                    Ok(p) => p,
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", sku, e);
                        continue;
                    }
                };

                for (n, outlet_id) in outlet_ids.iter().enumerate() {
                    let opening = 5 + ((seed + n * 7) % 20) as i64;
                    db.products().adjust_stock(outlet_id, &created.id, opening).await?;
                }

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let next = db.barcodes().peek_latest_row().await?;
    println!("  Next shelf code after the catalog: {}", next);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one catalog article.
fn generate_product(
    code: &str,
    category: &str,
    style: &str,
    size: &str,
    addon: i64,
    seed: usize,
) -> NewProduct {
    let style_code: String = style
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    // 799 - 4299: some articles fall above the 2500.00 GST threshold
    let base = 799 + ((seed * 137) % 3500) as i64;

    NewProduct {
        sku: format!("{}-{}-{}-{:03}", code, style_code, size, seed % 1000),
        name: format!("{} {} ({})", style, category.trim_end_matches('s'), size),
        category: Some(category.to_string()),
        mrp: Money::from_major(base + addon),
        barcode: None,
    }
}
