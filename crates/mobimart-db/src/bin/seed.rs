//! # Seed Data Generator
//!
//! Populates the database with a demo phone catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed into the default dev database
//! cargo run -p mobimart-db --bin seed
//!
//! # Specify database path
//! cargo run -p mobimart-db --bin seed -- --db ./data/mobimart.db
//! ```

use chrono::Utc;
use mobimart_core::{Product, ProductSpecs, SpecEntry};
use mobimart_db::repository::product::generate_product_id;
use mobimart_db::{Database, DbConfig};
use std::env;

/// Demo catalog: name, brand, price in minor units, discount %, stock, spec line.
const CATALOG: &[(&str, &str, i64, i64, i64, &str)] = &[
    (
        "iPhone 15",
        "Apple",
        79_999,
        0,
        12,
        "128GB, Midnight Black",
    ),
    (
        "Samsung Galaxy S24 Ultra",
        "Samsung",
        129_999,
        5,
        8,
        "256GB, Titanium Grey",
    ),
    (
        "OnePlus 12 5G",
        "OnePlus",
        64_999,
        0,
        15,
        "16GB RAM, Flowy Emerald",
    ),
    (
        "Redmi Note 13 Pro+",
        "Xiaomi",
        31_999,
        10,
        30,
        "12GB RAM, 256GB",
    ),
    (
        "Vivo V30 Pro",
        "Vivo",
        41_999,
        0,
        20,
        "Portrait Master, Andaman Blue",
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./mobimart_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("MobiMart Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./mobimart_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MobiMart Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

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
    println!("Seeding demo catalog...");

    for (name, brand, price_minor, discount_pct, stock, spec_line) in CATALOG {
        let product = demo_product(name, brand, *price_minor, *discount_pct, *stock, spec_line);
        db.products().insert(&product).await?;
        println!("  + {} ({})", product.name, spec_line);
    }

    println!();
    println!("✓ Seeded {} products!", CATALOG.len());

    Ok(())
}

fn demo_product(
    name: &str,
    brand: &str,
    price_minor: i64,
    discount_pct: i64,
    stock: i64,
    spec_line: &str,
) -> Product {
    let now = Utc::now();

    // Structured key/value specs where the line splits cleanly, legacy
    // free text otherwise (both shapes occur in real catalogs).
    let specs = if spec_line.contains(", ") {
        ProductSpecs::Pairs(
            spec_line
                .split(", ")
                .enumerate()
                .map(|(i, part)| SpecEntry {
                    key: if i == 0 { "Storage" } else { "Variant" }.to_string(),
                    value: part.to_string(),
                })
                .collect(),
        )
    } else {
        ProductSpecs::Text(spec_line.to_string())
    };

    Product {
        id: generate_product_id(),
        name: name.to_string(),
        brand: Some(brand.to_string()),
        price_minor,
        discount_pct,
        stock,
        specs,
        image_url: None,
        created_at: now,
        updated_at: now,
    }
}
