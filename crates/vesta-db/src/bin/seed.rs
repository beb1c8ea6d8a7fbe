//! # Seed Data Generator
//!
//! Populates the database with demo products and customers for development.
//!
//! ## Usage
//! ```bash
//! # Default database (./vesta_dev.db)
//! cargo run -p vesta-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p vesta-db --bin seed -- --count 500 --db ./data/vesta.db
//! ```
//!
//! ## Generated Data
//! - Products across grocery categories with SKU, barcode, price, stock,
//!   and reorder level
//! - A handful of customers with credit limits, so credit sales and
//!   payments can be exercised immediately

use std::env;

use tracing_subscriber::EnvFilter;
use vesta_core::{NewCustomer, NewProduct};
use vesta_db::{Database, DbConfig};

/// Product categories for realistic test data.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coca-Cola 330ml",
            "Pepsi 330ml",
            "Sprite 500ml",
            "Mineral Water 1.5L",
            "Orange Juice 1L",
            "Iced Tea 500ml",
            "Energy Drink 250ml",
            "Lemonade 1L",
        ],
    ),
    (
        "GRO",
        &[
            "Basmati Rice 1kg",
            "Wheat Flour 5kg",
            "Sugar 1kg",
            "Cooking Oil 1L",
            "Red Lentils 500g",
            "Black Tea 250g",
            "Table Salt 800g",
            "Spaghetti 500g",
        ],
    ),
    (
        "DRY",
        &[
            "Whole Milk 1L",
            "Butter 200g",
            "Cheddar Cheese 400g",
            "Yogurt 500g",
            "Eggs Dozen",
            "Cream 200ml",
        ],
    ),
    (
        "SNK",
        &[
            "Potato Chips Large",
            "Chocolate Bar",
            "Salted Peanuts 200g",
            "Biscuits Family Pack",
            "Gummy Bears 150g",
        ],
    ),
];

/// Customers with credit limits, for exercising the credit ledger.
const CUSTOMERS: &[(&str, &str, i64)] = &[
    ("Amina Khan", "0300-1234567", 500_000),
    ("Bilal Ahmed", "0321-7654321", 250_000),
    ("Sara Malik", "0333-1112223", 100_000),
    ("Walk-in Regular", "0345-9998887", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./vesta_dev.db");

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
                println!("Vesta POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./vesta_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vesta POS Seed Data Generator");
    println!("================================");
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

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: loop {
        for (category_code, names) in CATEGORIES {
            for (product_idx, product_name) in names.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(category_code, product_name, product_idx, generated);

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Generating customers...");
    for (name, phone, credit_limit_cents) in CUSTOMERS {
        db.customers()
            .insert(&NewCustomer {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                credit_limit_cents: *credit_limit_cents,
            })
            .await?;
    }
    println!("✓ Generated {} customers", CUSTOMERS.len());

    println!();
    println!("Verifying...");
    let low = db.products().get_low_stock().await?;
    println!("  Low-stock products: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(category: &str, name: &str, index: usize, seed: usize) -> NewProduct {
    // Unique SKU per generated row
    let sku = format!("{}-{:03}-{:04}", category, index, seed);

    // EAN-13 shaped barcode (checksum not validated)
    let barcode = Some(format!("590{:010}", seed));

    // Price $0.99 - $9.99
    let selling_price_cents = 99 + ((seed * 17) % 900) as i64;

    // Cost 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_price_cents = Some(selling_price_cents * cost_pct / 100);

    // Stock 0-100 with a reorder level that leaves some products low
    let current_stock = (seed % 101) as f64;
    let reorder_level = (seed % 11) as f64;

    NewProduct {
        sku,
        barcode,
        name: name.to_string(),
        selling_price_cents,
        cost_price_cents,
        current_stock,
        reorder_level,
        allow_negative_stock: false,
    }
}
