//! # Order Builder
//!
//! Creates a complete order (header plus lines) for a customer.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_order(customer, request)                     │
//! │                                                                         │
//! │  validate_new_order(request)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  retry_on_conflict(attempts) ─────────────────────────────────────┐    │
//! │  │  BEGIN                                                        │    │
//! │  │  0. re-read the customer row          NotFound if missing     │    │
//! │  │  1. allocate(Order)                 SheetNr = AuftragsNr = n  │    │
//! │  │  2. header with address snapshot and zero totals             │    │
//! │  │  3. insert_header                                             │    │
//! │  │  4. content builder per line, input order                    │    │
//! │  │  5. OrderTotals::from_lines ──► update_totals                 │    │
//! │  │  COMMIT                                                       │    │
//! │  └── UniqueViolation / Busy ──► rollback, back off, retry ───────┘    │
//! │                                                                         │
//! │  Any other error (missing price, unknown product) rolls back and       │
//! │  is returned unchanged. No partial order is ever visible.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use orderdesk_core::validation::validate_new_order;
use orderdesk_core::{
    AddressSnapshot, Customer, NewOrder, Order, OrderConfig, OrderFlags, OrderLineItem,
    OrderTerms, OrderTotals, RecordAudit,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::allocator::{allocate, retry_on_conflict, IdFamily};
use crate::error::DbResult;
use crate::repository::customer::CustomerRepository;
use crate::repository::order::OrderRepository;
use crate::service::content_builder::build_line_items;

/// `AuftragsKennung` of a regular customer order.
pub const ORDER_KIND_STANDARD: i64 = 1;

/// The stored header and lines of a freshly created order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub lines: Vec<OrderLineItem>,
}

/// Builds orders inside one transaction per attempt.
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    pool: SqlitePool,
    config: OrderConfig,
}

impl OrderBuilder {
    /// Creates a new OrderBuilder.
    pub fn new(pool: SqlitePool, config: OrderConfig) -> Self {
        OrderBuilder { pool, config }
    }

    /// Creates an order for `customer` with the requested lines.
    ///
    /// Only `customer.number` is used; match code and address are copied
    /// from the stored row. The header's totals are the sums of the stored
    /// line totals.
    ///
    /// ## Errors
    /// - `DbError::Core` if the request fails validation
    /// - `DbError::NotFound` for an unknown customer, an unknown product or
    ///   a missing price
    /// - `DbError::Conflict` if allocation kept colliding
    pub async fn create_order(
        &self,
        customer: &Customer,
        request: &NewOrder,
    ) -> DbResult<CreatedOrder> {
        validate_new_order(request)?;

        let created = retry_on_conflict(self.config.allocation_attempts, "Order", |attempt| {
            self.try_create(customer, request, attempt)
        })
        .await?;

        info!(
            number = %created.order.number,
            customer = %customer.number,
            lines = created.lines.len(),
            gross = %created.order.totals.total_gross,
            "Order created"
        );
        Ok(created)
    }

    async fn try_create(
        &self,
        customer: &Customer,
        request: &NewOrder,
        attempt: u32,
    ) -> DbResult<CreatedOrder> {
        let mut tx = self.pool.begin().await?;

        let customer = CustomerRepository::fetch_by_number(&mut tx, &customer.number).await?;

        let id = allocate(&mut tx, IdFamily::Order).await?;
        debug!(id = id, attempt = attempt, customer = %customer.number, "Building order");

        let mut order = self.header(id, &customer, request);
        OrderRepository::insert_header(&mut tx, &order).await?;

        let lines = build_line_items(&mut tx, &order, &request.lines, &self.config).await?;

        order.totals = OrderTotals::from_lines(&lines);
        OrderRepository::update_totals(&mut tx, &order.number, &order.totals).await?;

        tx.commit().await?;

        Ok(CreatedOrder { order, lines })
    }

    /// Composes the header row with zero totals.
    fn header(&self, id: i64, customer: &Customer, request: &NewOrder) -> Order {
        let now = Utc::now();

        let mut terms = OrderTerms {
            price_group: request.price_group.unwrap_or(self.config.price_group),
            ..OrderTerms::default()
        };
        if let Some(method) = &request.delivery_method {
            terms.delivery_method = method.clone();
        }
        if let Some(percent) = request.discount_percent {
            terms.discount_percent = percent;
        }
        if let Some(currency) = request.currency {
            terms.currency = currency;
        }
        if let Some(method) = request.payment_method {
            terms.payment_method = method;
        }

        Order {
            id,
            number: id.to_string(),
            kind: ORDER_KIND_STANDARD,
            customer_number: customer.number.clone(),
            customer_matchcode: customer.matchcode.clone(),
            terms,
            address: AddressSnapshot::from(&customer.address),
            captured_at: now,
            paid_at: now,
            delivery_due: request.delivery_due.unwrap_or(now),
            totals: OrderTotals::default(),
            flags: OrderFlags::default(),
            audit: RecordAudit::now(&self.config.system_user),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::testing::{customer, db, stock_apple};
    use orderdesk_core::{CustomerAddress, ErrorKind, Money, NewOrderLine, PriceMatrixEntry, TaxRate};
    use std::collections::HashSet;

    fn request(lines: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            lines,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_line_reference_values() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 1000).await;

        let created = db
            .order_builder()
            .create_order(&customer, &request(vec![NewOrderLine::new(17, 3)]))
            .await
            .unwrap();

        let line = &created.lines[0];
        assert_eq!(line.total_net.cents(), 3000);
        assert_eq!(line.total_tax.cents(), 570);
        assert_eq!(line.total_gross.cents(), 3570);
        assert_eq!(line.unit_gross_price.cents(), 1190);
        assert_eq!(line.weight.grams(), 999);

        let totals = created.order.totals;
        assert_eq!(totals.net_main.cents(), 3000);
        assert_eq!(totals.tax.cents(), 570);
        assert_eq!(totals.total_gross.cents(), 3570);
        assert_eq!(totals.down_payment_claim.cents(), 3570);
        assert!(totals.net_secondary.is_zero());

        let stored = db.orders().get_by_number(&created.order.number).await.unwrap().unwrap();
        assert_eq!(stored.totals, totals);
        assert_eq!(stored.customer_number, customer.number);
        assert_eq!(stored.kind, ORDER_KIND_STANDARD);
        assert!(!stored.flags.paid);
    }

    #[tokio::test]
    async fn test_totals_are_sum_of_lines() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 333).await;
        stock_apple(&db, 18, 1999).await;

        let created = db
            .order_builder()
            .create_order(
                &customer,
                &request(vec![NewOrderLine::new(17, 7), NewOrderLine::new(18, 2)]),
            )
            .await
            .unwrap();

        let net: i64 = created.lines.iter().map(|l| l.total_net.cents()).sum();
        let tax: i64 = created.lines.iter().map(|l| l.total_tax.cents()).sum();
        let gross: i64 = created.lines.iter().map(|l| l.total_gross.cents()).sum();

        assert_eq!(created.order.totals.net_main.cents(), net);
        assert_eq!(created.order.totals.tax.cents(), tax);
        assert_eq!(created.order.totals.total_gross.cents(), gross);
        assert_eq!(net + tax, gross);
    }

    #[tokio::test]
    async fn test_positions_and_line_numbers() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;
        stock_apple(&db, 18, 200).await;

        let builder = db.order_builder();
        let first = builder
            .create_order(
                &customer,
                &request(vec![NewOrderLine::new(17, 1), NewOrderLine::new(18, 1)]),
            )
            .await
            .unwrap();
        let second = builder
            .create_order(
                &customer,
                &request(vec![NewOrderLine::new(18, 1), NewOrderLine::new(17, 1)]),
            )
            .await
            .unwrap();

        assert_eq!(first.order.number, "1");
        assert_eq!(second.order.number, "2");

        let positions: Vec<_> = second
            .lines
            .iter()
            .map(|l| {
                (
                    l.position.sequence,
                    l.position.display_position,
                    l.position.legacy_position,
                )
            })
            .collect();
        assert_eq!(positions, vec![(1, 1, 2), (2, 2, 3)]);
        assert_eq!(second.lines[0].product_number, 18);

        let line_numbers: Vec<i64> = first
            .lines
            .iter()
            .chain(second.lines.iter())
            .map(|l| l.line_number)
            .collect();
        assert_eq!(line_numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_address_snapshot_survives_customer_update() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;

        let created = db
            .order_builder()
            .create_order(&customer, &request(vec![NewOrderLine::new(17, 1)]))
            .await
            .unwrap();
        assert_eq!(created.order.address.city, "Berlin");
        assert_eq!(created.order.address.supplement, "");

        db.customers()
            .update_address(
                &customer.number,
                &CustomerAddress {
                    city: Some("Hamburg".into()),
                    ..customer.address.clone()
                },
            )
            .await
            .unwrap();

        let stored = db.orders().get_by_number(&created.order.number).await.unwrap().unwrap();
        assert_eq!(stored.address.city, "Berlin");
        assert_eq!(stored.address, created.order.address);
    }

    #[tokio::test]
    async fn test_missing_price_leaves_no_partial_order() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;

        let err = db
            .order_builder()
            .create_order(
                &customer,
                &NewOrder {
                    price_group: Some(2),
                    lines: vec![NewOrderLine::new(17, 1)],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("group 2"));

        let headers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM FK_Auftrag")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM FK_AuftragPos")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!((headers, lines), (0, 0));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let db = db().await;
        let customer = customer(&db).await;

        let err = db
            .order_builder()
            .create_order(&customer, &request(vec![NewOrderLine::new(99, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Product"));
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected_before_writing() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;

        let err = db
            .order_builder()
            .create_order(&customer, &request(vec![NewOrderLine::new(17, 0)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(db.orders().get_by_number("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tax_rate_default_and_line_override() {
        let db = db()
            .await
            .with_order_config(OrderConfig::default().tax_rate(TaxRate::from_bps(700)));
        let customer = customer(&db).await;
        stock_apple(&db, 17, 1000).await;

        let created = db
            .order_builder()
            .create_order(
                &customer,
                &request(vec![
                    NewOrderLine::new(17, 1),
                    NewOrderLine::new(17, 1).with_tax_rate(TaxRate::zero()),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(created.lines[0].total_tax.cents(), 70);
        assert_eq!(created.lines[1].total_tax.cents(), 0);
        assert_eq!(created.order.totals.total_gross.cents(), 2070);
    }

    #[tokio::test]
    async fn test_request_overrides_terms() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 1000).await;
        db.prices()
            .upsert(&PriceMatrixEntry {
                product_number: 17,
                quantity_tier: 1,
                price_group: 2,
                net_unit_price: Money::from_cents(800),
            })
            .await
            .unwrap();

        let created = db
            .order_builder()
            .create_order(
                &customer,
                &NewOrder {
                    price_group: Some(2),
                    delivery_method: Some("Abholung".into()),
                    lines: vec![NewOrderLine::new(17, 1)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(created.order.terms.price_group, 2);
        assert_eq!(created.order.terms.delivery_method, "Abholung");
        assert_eq!(created.lines[0].unit_net_price.cents(), 800);
    }

    #[tokio::test]
    async fn test_discount_currency_and_payment_are_persisted() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 1000).await;

        let created = db
            .order_builder()
            .create_order(
                &customer,
                &NewOrder {
                    discount_percent: Some(5.5),
                    currency: Some(756),
                    payment_method: Some(2),
                    lines: vec![NewOrderLine::new(17, 1)],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = db.orders().get_by_number(&created.order.number).await.unwrap().unwrap();
        assert_eq!(stored.terms, created.order.terms);
        assert_eq!(stored.terms.discount_percent, 5.5);
        assert_eq!(stored.terms.currency, 756);
        assert_eq!(stored.terms.payment_method, 2);
        assert_eq!(stored.terms.discount, 0.0);

        // recorded on the header only, line totals are undiscounted
        assert_eq!(stored.totals.total_gross.cents(), 1190);

        let plain = db
            .order_builder()
            .create_order(&customer, &request(vec![NewOrderLine::new(17, 1)]))
            .await
            .unwrap();
        assert_eq!(plain.order.terms, OrderTerms::default());
    }

    #[tokio::test]
    async fn test_out_of_range_discount_rejected() {
        let db = db().await;
        let customer = customer(&db).await;

        let err = db
            .order_builder()
            .create_order(
                &customer,
                &NewOrder {
                    discount_percent: Some(120.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(db.orders().get_by_number("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let db = db().await;
        stock_apple(&db, 17, 100).await;
        let stranger = Customer {
            id: 77,
            number: "77".to_string(),
            matchcode: "NOBODY".to_string(),
            address: CustomerAddress::default(),
            note: None,
        };

        let err = db
            .order_builder()
            .create_order(&stranger, &request(vec![NewOrderLine::new(17, 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, DbError::NotFound { ref entity, ref key } if entity == "Customer" && key == "77"));

        let headers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM FK_Auftrag")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(headers, 0);
    }

    #[tokio::test]
    async fn test_snapshot_comes_from_stored_customer() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;

        let stale = Customer {
            matchcode: "STALE".to_string(),
            address: CustomerAddress {
                city: Some("Nowhere".into()),
                ..customer.address.clone()
            },
            ..customer.clone()
        };

        let created = db
            .order_builder()
            .create_order(&stale, &request(vec![NewOrderLine::new(17, 1)]))
            .await
            .unwrap();

        assert_eq!(created.order.customer_matchcode, customer.matchcode);
        assert_eq!(created.order.address.city, "Berlin");
    }

    #[tokio::test]
    async fn test_get_with_lines_joins_products() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;
        stock_apple(&db, 18, 200).await;

        let created = db
            .order_builder()
            .create_order(
                &customer,
                &request(vec![
                    NewOrderLine::new(18, 2).with_note("gift wrap"),
                    NewOrderLine::new(17, 1),
                ]),
            )
            .await
            .unwrap();

        let full = db
            .orders()
            .get_with_lines(&created.order.number)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(full.order.number, created.order.number);
        assert_eq!(full.order.totals, created.order.totals);
        assert_eq!(full.lines.len(), 2);
        assert_eq!(full.lines[0].item, created.lines[0]);
        assert_eq!(full.lines[0].item.note, "gift wrap");
        assert_eq!(full.lines[0].product.number, 18);
        assert_eq!(full.lines[1].product.number, 17);

        assert!(db.orders().get_with_lines("404").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_get_distinct_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("orders.db")).max_connections(4))
            .await
            .unwrap()
            .with_order_config(OrderConfig::default().allocation_attempts(10));
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let builder = db.order_builder();
                let customer = customer.clone();
                tokio::spawn(async move {
                    builder
                        .create_order(
                            &customer,
                            &NewOrder {
                                lines: vec![NewOrderLine::new(17, 1), NewOrderLine::new(17, 2)],
                                ..Default::default()
                            },
                        )
                        .await
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        let mut line_numbers = HashSet::new();
        for task in tasks {
            let created = task.await.unwrap().unwrap();
            numbers.insert(created.order.number.clone());
            line_numbers.extend(created.lines.iter().map(|l| l.line_number));
        }

        assert_eq!(numbers.len(), 4);
        assert_eq!(line_numbers.len(), 8);

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM FK_Auftrag")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(stored, 4);
    }
}
