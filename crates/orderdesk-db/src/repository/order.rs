//! # Order Repository
//!
//! Database operations for `FK_Auftrag` headers and full-order retrieval.
//!
//! Header writes take an open connection so that the order builder can run
//! them inside its transaction. Reads go through the pool.

use orderdesk_core::{Order, OrderLine, OrderTotals, OrderWithLines, Product};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::order_content::OrderContentRepository;
use crate::repository::product::PRODUCT_COLUMNS;

const SELECT_ORDER: &str = r#"
    SELECT
        SheetNr, AuftragsNr, AuftragsKennung, KundenNr, KundenMatchcode,
        Konditionen_PreisgrpNr, Konditionen_Rabatt, Konditionen_Rabatt_Proz,
        Konditionen_Waehrung, Konditionen_Zahlungsart, Konditionen_Lieferart,
        Anschrift_Anrede, Anschrift_Firma, Anschrift_Name, Anschrift_Vorname,
        Anschrift_Zusatz, Anschrift_Strasse, Anschrift_HausNr, Anschrift_Ort,
        Anschrift_Plz, Anschrift_Land, Anschrift_Tel1, Anschrift_Tel2, Anschrift_Email,
        Datum_erfassung, Datum_zahlung, tsLieferTermin,
        Summen_netto_haupt, Summen_brutto_haupt, Summen_netto_neben, Summen_brutto_neben,
        Summen_ust_gesamt, Summen_gesamt, Summen_abschlag_forderung,
        dftSumme_GewinnNetto_NAR, dftSummen_Gewicht,
        bStatus_lagergebucht, bStatus_gebucht, bStatus_uebernommen, bStatus_gedruckt,
        bStatus_exportiert, bStatus_geliefert, bStatus_bezahlt, bStatus_weitergefuehrt,
        System_created, System_updated, System_created_user, System_updated_user
    FROM FK_Auftrag
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order header with explicit `SheetNr` and `AuftragsNr`.
    pub async fn insert_header(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(number = %order.number, customer = %order.customer_number, "Inserting order header");

        let terms = &order.terms;
        let address = &order.address;
        let totals = &order.totals;
        let flags = &order.flags;
        let audit = &order.audit;

        sqlx::query(
            r#"
            INSERT INTO FK_Auftrag (
                SheetNr, AuftragsNr, AuftragsKennung, KundenNr, KundenMatchcode,
                Konditionen_PreisgrpNr, Konditionen_Rabatt, Konditionen_Rabatt_Proz,
                Konditionen_Waehrung, Konditionen_Zahlungsart, Konditionen_Lieferart,
                Anschrift_Anrede, Anschrift_Firma, Anschrift_Name, Anschrift_Vorname,
                Anschrift_Zusatz, Anschrift_Strasse, Anschrift_HausNr, Anschrift_Ort,
                Anschrift_Plz, Anschrift_Land, Anschrift_Tel1, Anschrift_Tel2, Anschrift_Email,
                Datum_erfassung, Datum_zahlung, tsLieferTermin,
                Summen_netto_haupt, Summen_brutto_haupt, Summen_netto_neben, Summen_brutto_neben,
                Summen_ust_gesamt, Summen_gesamt, Summen_abschlag_forderung,
                dftSumme_GewinnNetto_NAR, dftSummen_Gewicht,
                bStatus_lagergebucht, bStatus_gebucht, bStatus_uebernommen, bStatus_gedruckt,
                bStatus_exportiert, bStatus_geliefert, bStatus_bezahlt, bStatus_weitergefuehrt,
                System_created, System_updated, System_created_user, System_updated_user
            ) VALUES (
                ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?
            )
            "#,
        )
        .bind(order.id)
        .bind(&order.number)
        .bind(order.kind)
        .bind(&order.customer_number)
        .bind(&order.customer_matchcode)
        .bind(terms.price_group)
        .bind(terms.discount)
        .bind(terms.discount_percent)
        .bind(terms.currency)
        .bind(terms.payment_method)
        .bind(&terms.delivery_method)
        .bind(&address.salutation)
        .bind(&address.company)
        .bind(&address.name)
        .bind(&address.first_name)
        .bind(&address.supplement)
        .bind(&address.street)
        .bind(&address.house_number)
        .bind(&address.city)
        .bind(&address.postal_code)
        .bind(&address.country)
        .bind(&address.phone1)
        .bind(&address.phone2)
        .bind(&address.email)
        .bind(order.captured_at)
        .bind(order.paid_at)
        .bind(order.delivery_due)
        .bind(totals.net_main.to_store())
        .bind(totals.gross_main.to_store())
        .bind(totals.net_secondary.to_store())
        .bind(totals.gross_secondary.to_store())
        .bind(totals.tax.to_store())
        .bind(totals.total_gross.to_store())
        .bind(totals.down_payment_claim.to_store())
        .bind(totals.net_profit.to_store())
        .bind(totals.weight.to_store())
        .bind(flags.stocked)
        .bind(flags.booked)
        .bind(flags.carried_over)
        .bind(flags.printed)
        .bind(flags.exported)
        .bind(flags.delivered)
        .bind(flags.paid)
        .bind(flags.carried_forward)
        .bind(audit.created_at)
        .bind(audit.updated_at)
        .bind(&audit.created_user)
        .bind(&audit.updated_user)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes the aggregate columns of an order header.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the order does not exist.
    pub async fn update_totals(
        conn: &mut SqliteConnection,
        number: &str,
        totals: &OrderTotals,
    ) -> DbResult<()> {
        debug!(number = %number, gross = %totals.total_gross, "Updating order totals");

        let result = sqlx::query(
            r#"
            UPDATE FK_Auftrag SET
                Summen_netto_haupt = ?,
                Summen_brutto_haupt = ?,
                Summen_netto_neben = ?,
                Summen_brutto_neben = ?,
                Summen_ust_gesamt = ?,
                Summen_gesamt = ?,
                Summen_abschlag_forderung = ?,
                dftSumme_GewinnNetto_NAR = ?,
                dftSummen_Gewicht = ?
            WHERE AuftragsNr = ?
            "#,
        )
        .bind(totals.net_main.to_store())
        .bind(totals.gross_main.to_store())
        .bind(totals.net_secondary.to_store())
        .bind(totals.gross_secondary.to_store())
        .bind(totals.tax.to_store())
        .bind(totals.total_gross.to_store())
        .bind(totals.down_payment_claim.to_store())
        .bind(totals.net_profit.to_store())
        .bind(totals.weight.to_store())
        .bind(number)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", number));
        }

        Ok(())
    }

    /// Gets an order header on an open connection.
    pub async fn fetch_by_number(conn: &mut SqliteConnection, number: &str) -> DbResult<Order> {
        sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE AuftragsNr = ?"))
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Order", number))
    }

    /// Gets an order header by business number.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE AuftragsNr = ?"))
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Lists a customer's orders, newest number first.
    pub async fn list_for_customer(&self, customer_number: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_ORDER} WHERE KundenNr = ? ORDER BY SheetNr DESC"
        ))
        .bind(customer_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Loads an order with its lines in position order, each joined with
    /// the current product row.
    ///
    /// Returns `None` for an unknown order number.
    pub async fn get_with_lines(&self, number: &str) -> DbResult<Option<OrderWithLines>> {
        let mut conn = self.pool.acquire().await?;

        let Some(order) = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE AuftragsNr = ?"))
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let items = OrderContentRepository::list_for_order(&mut conn, number).await?;

        let products: Vec<Product> = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT DISTINCT {PRODUCT_COLUMNS}
            FROM FK_Artikel p
            INNER JOIN FK_AuftragPos c ON c.ArtikelNr = p.ArtikelNr
            WHERE c.AuftragsNr = ?
            "#
        ))
        .bind(number)
        .fetch_all(&mut *conn)
        .await?;

        let by_number: HashMap<i64, Product> =
            products.into_iter().map(|product| (product.number, product)).collect();

        let lines = items
            .into_iter()
            .map(|item| {
                let product = by_number
                    .get(&item.product_number)
                    .cloned()
                    .ok_or_else(|| DbError::not_found("Product", item.product_number))?;
                Ok(OrderLine { item, product })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(number = %number, lines = lines.len(), "Loaded order with lines");
        Ok(Some(OrderWithLines { order, lines }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{customer, db, stock_apple};
    use orderdesk_core::{Money, NewOrder, NewOrderLine};

    #[tokio::test]
    async fn test_update_totals_unknown_order() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = OrderRepository::update_totals(&mut conn, "77", &OrderTotals::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref key, .. } if key == "77"));
    }

    #[tokio::test]
    async fn test_update_totals_round_trip() {
        let db = db().await;
        let customer = customer(&db).await;
        let created = db
            .order_builder()
            .create_order(&customer, &NewOrder::default())
            .await
            .unwrap();
        assert!(created.order.totals.total_gross.is_zero());

        let totals = OrderTotals {
            net_main: Money::from_cents(1000),
            gross_main: Money::from_cents(1190),
            tax: Money::from_cents(190),
            total_gross: Money::from_cents(1190),
            down_payment_claim: Money::from_cents(1190),
            ..Default::default()
        };
        let mut conn = db.pool().acquire().await.unwrap();
        OrderRepository::update_totals(&mut conn, &created.order.number, &totals)
            .await
            .unwrap();

        let stored = OrderRepository::fetch_by_number(&mut conn, &created.order.number)
            .await
            .unwrap();
        assert_eq!(stored.totals, totals);
    }

    #[tokio::test]
    async fn test_list_for_customer_newest_first() {
        let db = db().await;
        let customer = customer(&db).await;
        stock_apple(&db, 17, 100).await;

        let builder = db.order_builder();
        for quantity in [1, 2, 3] {
            builder
                .create_order(
                    &customer,
                    &NewOrder {
                        lines: vec![NewOrderLine::new(17, quantity)],
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let orders = db.orders().list_for_customer(&customer.number).await.unwrap();
        let numbers: Vec<&str> = orders.iter().map(|o| o.number.as_str()).collect();
        assert_eq!(numbers, vec!["3", "2", "1"]);
        assert_eq!(orders[0].totals.net_main.cents(), 300);

        assert!(db.orders().list_for_customer("999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_unknown_order() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = OrderRepository::fetch_by_number(&mut conn, "5").await.unwrap_err();
        assert_eq!(err.to_string(), "Order not found: 5");
        drop(conn);

        assert!(db.orders().get_by_number("5").await.unwrap().is_none());
    }
}
