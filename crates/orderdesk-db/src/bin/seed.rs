//! # Seed Data Generator
//!
//! Populates a database with a small catalog and one demo order.
//!
//! ## Usage
//! ```bash
//! # Seed ./orderdesk.db (or ORDERDESK_DATABASE_PATH)
//! cargo run -p orderdesk-db --bin seed
//!
//! # Specify database path
//! cargo run -p orderdesk-db --bin seed -- --db ./data/orders.db
//! ```
//!
//! ## Generated Data
//! - Company 1 with net prices
//! - One customer
//! - Five products, each priced for groups 1 (retail) and 2 (wholesale)
//!   at tier 1 and tier 10
//! - One order over three of the products, printed as JSON

use orderdesk_core::{
    Company, CustomerAddress, Money, NewCustomer, NewOrder, NewOrderLine, NewProduct, PriceMatrixEntry,
    DEFAULT_UNIT,
};
use orderdesk_db::{AppConfig, Database};
use std::env;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// (number, name, net price in cents, unit weight in kg)
const CATALOG: &[(i64, &str, i64, f64)] = &[
    (1001, "Apfel rot", 50, 0.2),
    (1002, "Birne", 80, 0.25),
    (1003, "Bananen 1 kg", 199, 1.0),
    (1004, "Orangensaft 1 l", 249, 1.1),
    (1005, "Walnüsse 500 g", 699, 0.52),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = AppConfig::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("orderdesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./orderdesk.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("orderdesk Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.db.database_path.display());
    println!();

    let db = Database::new(config.db.clone())
        .await?
        .with_order_config(config.order.clone());

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    db.companies()
        .upsert(&Company {
            id: 1,
            prices_gross: false,
        })
        .await?;

    for (number, name, cents, weight) in CATALOG {
        db.products()
            .insert(&NewProduct {
                number: *number,
                matchcode: name.to_uppercase().replace(' ', "-"),
                name: name.to_string(),
                description: String::new(),
                unit_weight_kg: *weight,
                unit: DEFAULT_UNIT.to_string(),
                list_price: Money::from_cents(*cents),
                stock: 50.0,
                min_stock: 5.0,
                web_shop: true,
            })
            .await?;

        // wholesale is 20% off, tier 10 another 10%
        for (group, tier, price) in [
            (1, 1, *cents),
            (1, 10, cents * 9 / 10),
            (2, 1, cents * 8 / 10),
            (2, 10, cents * 72 / 100),
        ] {
            db.prices()
                .upsert(&PriceMatrixEntry {
                    product_number: *number,
                    quantity_tier: tier,
                    price_group: group,
                    net_unit_price: Money::from_cents(price),
                })
                .await?;
        }
    }
    println!("✓ Generated {} products", CATALOG.len());

    let customer = db
        .customers()
        .insert_unique(&NewCustomer {
            matchcode: "MUSTERMANN".to_string(),
            address: CustomerAddress {
                salutation: Some("Herr".into()),
                name: Some("Mustermann".into()),
                first_name: Some("Max".into()),
                street: Some("Musterstraße".into()),
                house_number: Some("12a".into()),
                city: Some("Berlin".into()),
                postal_code: Some("10115".into()),
                country: Some("DE".into()),
                email: Some("max@example.com".into()),
                ..Default::default()
            },
            note: None,
        })
        .await?;
    println!("✓ Created customer {}", customer.number);

    let created = db
        .order_builder()
        .create_order(
            &customer,
            &NewOrder {
                lines: vec![
                    NewOrderLine::new(1001, 6),
                    NewOrderLine::new(1003, 2).with_note("reif"),
                    NewOrderLine::new(1005, 1),
                ],
                ..Default::default()
            },
        )
        .await?;
    println!(
        "✓ Created order {} ({} lines, {} gross)",
        created.order.number,
        created.lines.len(),
        created.order.totals.total_gross
    );

    if let Some(full) = db.orders().get_with_lines(&created.order.number).await? {
        println!();
        println!("{}", serde_json::to_string_pretty(&full)?);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Log filter from `RUST_LOG`, default INFO with debug for the orderdesk crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,orderdesk=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}
