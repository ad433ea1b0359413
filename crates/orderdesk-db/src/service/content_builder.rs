//! # Order Content Builder
//!
//! Turns requested lines into persisted `FK_AuftragPos` rows.
//!
//! ## Per Line
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewOrderLine { product 17, qty 3 }                                    │
//! │       │                                                                 │
//! │       ├── price_product(product, order group, config tier)             │
//! │       │        └── NotFound ──► whole order rolls back                  │
//! │       ├── allocate(OrderContent)          ──► lNr                       │
//! │       ├── build_line_item(order, priced, index, qty, rate)             │
//! │       └── OrderContentRepository::insert                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the caller's connection, normally the order
//! builder's transaction.

use orderdesk_core::line_item::{build_line_item as compose_line, LineRequest};
use orderdesk_core::{NewOrderLine, Order, OrderConfig, OrderLineItem, PriceQuery};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::allocator::{allocate, IdFamily};
use crate::error::DbResult;
use crate::repository::order_content::OrderContentRepository;
use crate::repository::price_matrix::price_product;

/// Prices, composes and inserts the line at `index` of `order`.
///
/// ## Errors
/// - `DbError::NotFound` for an unknown product or a missing price
/// - `DbError::Core` if quantity or note are invalid
pub async fn build_line_item(
    conn: &mut SqliteConnection,
    order: &Order,
    index: usize,
    line: &NewOrderLine,
    config: &OrderConfig,
) -> DbResult<OrderLineItem> {
    let query = PriceQuery {
        product_number: line.product_number,
        price_group: order.terms.price_group,
        quantity_tier: config.quantity_tier,
    };
    let priced = price_product(conn, &query).await?;

    let line_number = allocate(conn, IdFamily::OrderContent).await?;
    let item = compose_line(
        order,
        &priced,
        LineRequest {
            index,
            quantity: line.quantity,
            note: &line.note,
            tax_rate: line.tax_rate.unwrap_or(config.default_tax_rate),
            line_number,
        },
    )?;

    OrderContentRepository::insert(conn, &item).await?;

    debug!(
        order = %order.number,
        position = item.position.sequence,
        gross = %item.total_gross,
        "Order line built"
    );
    Ok(item)
}

/// Builds every line in input order. Stops at the first failure.
pub async fn build_line_items(
    conn: &mut SqliteConnection,
    order: &Order,
    lines: &[NewOrderLine],
    config: &OrderConfig,
) -> DbResult<Vec<OrderLineItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        items.push(build_line_item(conn, order, index, line, config).await?);
    }
    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{customer, db, stock_apple};
    use orderdesk_core::{ErrorKind, NewOrder, TaxRate};

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;
        stock_apple(&db, 18, 250).await;
        let order = db
            .order_builder()
            .create_order(&customer, &NewOrder::default())
            .await
            .unwrap()
            .order;

        let mut tx = db.pool().begin().await.unwrap();
        let items = build_line_items(
            &mut tx,
            &order,
            &[
                NewOrderLine::new(18, 4).with_note("first"),
                NewOrderLine::new(17, 1),
                NewOrderLine::new(18, 1).with_tax_rate(TaxRate::from_bps(700)),
            ],
            db.order_config(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let products: Vec<i64> = items.iter().map(|i| i.product_number).collect();
        assert_eq!(products, vec![18, 17, 18]);
        let positions: Vec<_> = items
            .iter()
            .map(|i| {
                (
                    i.position.sequence,
                    i.position.display_position,
                    i.position.legacy_position,
                )
            })
            .collect();
        assert_eq!(positions, vec![(1, 1, 2), (2, 2, 3), (3, 3, 4)]);
        assert_eq!(items[0].total_net.cents(), 1000);
        assert_eq!(items[0].note, "first");
        assert_eq!(items[2].total_tax.cents(), 18);

        let mut conn = db.pool().acquire().await.unwrap();
        let stored = OrderContentRepository::list_for_order(&mut conn, &order.number)
            .await
            .unwrap();
        assert_eq!(stored, items);
    }

    #[tokio::test]
    async fn test_snapshot_copies_product_fields() {
        let db = db().await;
        let customer = customer(&db).await;
        let product = stock_apple(&db, 17, 100).await;
        let order = db
            .order_builder()
            .create_order(&customer, &NewOrder::default())
            .await
            .unwrap()
            .order;

        let mut conn = db.pool().acquire().await.unwrap();
        let item = build_line_item(
            &mut conn,
            &order,
            0,
            &NewOrderLine::new(17, 2),
            db.order_config(),
        )
        .await
        .unwrap();

        assert_eq!(item.product.name, product.name);
        assert_eq!(item.product.short_name, product.name);
        assert_eq!(item.product.matchcode, product.matchcode);
        assert_eq!(item.product.product_id, product.id);
        assert_eq!(item.product.unit, "Stück");
        assert_eq!(item.product.unit_weight.grams(), 333);
        assert_eq!(item.weight.grams(), 666);
        assert_eq!(item.price_factor, 2);
        assert_eq!(item.order_number, order.number);
    }

    #[tokio::test]
    async fn test_missing_price_writes_nothing() {
        let db = db().await;
        let customer = customer(&db).await;
        db.products().insert(&crate::testing::apple(17)).await.unwrap();
        let order = db
            .order_builder()
            .create_order(&customer, &NewOrder::default())
            .await
            .unwrap()
            .order;

        let mut conn = db.pool().acquire().await.unwrap();
        let err = build_line_item(
            &mut conn,
            &order,
            0,
            &NewOrderLine::new(17, 1),
            db.order_config(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        let stored = OrderContentRepository::list_for_order(&mut conn, &order.number)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
