//! # Seed Data Generator
//!
//! Populates the database with the demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p bazaar-db --bin seed
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin seed -- --db ./data/bazaar.db
//! ```
//!
//! ## Generated Products
//! The three storefront categories, with a few discounted items and a
//! spread of stock levels so carts and checkouts have something to chew on:
//! - shoes (loafers, sneakers, sandals)
//! - clothes (kurtas, jackets, socks)
//! - food (momo, thukpa, sel roti - the tracked order type)

use std::env;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use bazaar_core::Product;
use bazaar_db::{migrations, Database, DbConfig};

/// Demo catalog: (name, category slug, price cents, discount cents, stock).
const CATALOG: &[(&str, &str, i64, Option<i64>, i64)] = &[
    // Shoes
    ("Leather Loafers", "shoes", 320_000, None, 12),
    ("Canvas Sneakers", "shoes", 180_000, Some(149_900), 20),
    ("Trail Runners", "shoes", 250_000, None, 8),
    ("Office Oxfords", "shoes", 410_000, None, 5),
    ("Summer Sandals", "shoes", 95_000, Some(79_900), 30),
    // Clothes
    ("Cotton Kurta", "clothes", 150_000, Some(120_000), 25),
    ("Denim Jacket", "clothes", 380_000, None, 10),
    ("Winter Fleece", "clothes", 220_000, None, 15),
    ("Wool Socks 3-Pack", "clothes", 45_000, None, 60),
    ("Pashmina Shawl", "clothes", 520_000, Some(450_000), 6),
    // Food (tracked orders)
    ("Chicken Momo", "food", 30_000, None, 40),
    ("Veg Momo", "food", 25_000, None, 40),
    ("Veg Thukpa", "food", 28_000, None, 30),
    ("Chicken Chowmein", "food", 32_000, None, 30),
    ("Sel Roti Pack", "food", 18_000, Some(15_000), 24),
    ("Milk Tea (1L)", "food", 12_000, None, 50),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG controls verbosity; default keeps repository debug visible.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bazaar=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bazaar_dev.db");

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
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Bazaar Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    let (total, applied) = migrations::migration_status(db.pool()).await?;
    println!("Connected ({applied}/{total} migrations applied)");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {existing} products");
        println!("Skipping seed to avoid duplicates.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    println!("Seeding catalog...");

    let now = Utc::now();
    let mut seeded = 0;
    for (name, category, price_cents, discount_price_cents, stock) in CATALOG {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            description: None,
            image_url: Some(format!(
                "https://cdn.bazaar.example/{}.jpg",
                name.to_lowercase().replace(' ', "-")
            )),
            category_slug: (*category).to_string(),
            price_cents: *price_cents,
            discount_price_cents: *discount_price_cents,
            stock: *stock,
            is_available: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.name, e);
            continue;
        }
        seeded += 1;
    }

    println!();
    println!("Seeded {seeded} products across shoes, clothes and food");
    println!("Seed complete!");

    Ok(())
}
