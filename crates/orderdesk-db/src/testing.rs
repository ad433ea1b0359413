//! Shared fixtures for the in-module test suites.

use orderdesk_core::{
    Customer, CustomerAddress, Money, NewCustomer, NewProduct, PriceMatrixEntry, Product,
    DEFAULT_PRICE_GROUP, DEFAULT_QUANTITY_TIER, DEFAULT_UNIT,
};

use crate::pool::{Database, DbConfig};

/// A migrated in-memory database.
pub(crate) async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A 333 g apple listed at 0.60.
pub(crate) fn apple(number: i64) -> NewProduct {
    NewProduct {
        number,
        matchcode: format!("APPLE-{number}"),
        name: "Red apple".to_string(),
        description: "Crisp".to_string(),
        unit_weight_kg: 0.333,
        unit: DEFAULT_UNIT.to_string(),
        list_price: Money::from_cents(60),
        stock: 100.0,
        min_stock: 10.0,
        web_shop: true,
    }
}

/// Inserts `apple(number)` priced at `cents` for the default group and tier.
pub(crate) async fn stock_apple(db: &Database, number: i64, cents: i64) -> Product {
    let product = db.products().insert(&apple(number)).await.unwrap();
    db.prices()
        .upsert(&PriceMatrixEntry {
            product_number: number,
            quantity_tier: DEFAULT_QUANTITY_TIER,
            price_group: DEFAULT_PRICE_GROUP,
            net_unit_price: Money::from_cents(cents),
        })
        .await
        .unwrap();
    product
}

/// Inserts a customer living in Berlin with no address supplement.
pub(crate) async fn customer(db: &Database) -> Customer {
    db.customers()
        .insert_unique(&NewCustomer {
            matchcode: "MUSTERMANN".to_string(),
            address: CustomerAddress {
                salutation: Some("Herr".into()),
                name: Some("Mustermann".into()),
                first_name: Some("Max".into()),
                street: Some("Hauptstraße".into()),
                house_number: Some("1".into()),
                city: Some("Berlin".into()),
                postal_code: Some("10115".into()),
                country: Some("DE".into()),
                email: Some("max@example.com".into()),
                ..Default::default()
            },
            note: None,
        })
        .await
        .unwrap()
}
