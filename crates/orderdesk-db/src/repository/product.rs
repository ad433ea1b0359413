//! # Product Repository
//!
//! Database operations for `FK_Artikel`.
//!
//! Products are read-only to the order workflow. `insert` exists for
//! seeding and tests.
//!
//! ## Products With Prices
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FK_Artikel ⋈ FK_Preismatrix ON ArtikelNr                              │
//! │             WHERE PreisGrpNr = group AND MengeNr = tier                 │
//! │                                                                         │
//! │  ArtikelNr | Bezeichnung | ... | Vk_preis_eur                          │
//! │  17        | Red apple   | ... | 0.50          ──► PricedProduct        │
//! │  18        | Pear        | ... | 0.80          ──► PricedProduct        │
//! │  19        | (no row for this group/tier)      ──► not listed           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use orderdesk_core::validation::validate_new_product;
use orderdesk_core::{Money, NewProduct, PricedProduct, Product, DEFAULT_SYSTEM_USER};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    p.SheetNr, p.ArtikelNr, p.Matchcode, p.Bezeichnung, p.Beschreibung,
    p.Gewicht, p.Einheit, p.Vk_preis, p.Menge_bestand, p.Menge_minbestand,
    p.bStatus_WebShop,
    p.System_created, p.System_updated, p.System_created_user, p.System_updated_user
"#;

/// A product row joined with its price matrix entry.
#[derive(Debug, sqlx::FromRow)]
struct PricedProductRow {
    #[sqlx(flatten)]
    product: Product,
    #[sqlx(rename = "Vk_preis_eur", try_from = "f64")]
    net_unit_price: Money,
}

impl From<PricedProductRow> for PricedProduct {
    fn from(row: PricedProductRow) -> Self {
        PricedProduct {
            product: row.product,
            net_unit_price: row.net_unit_price,
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns the stored row.
    ///
    /// ## Errors
    /// - `DbError::Core` if the input fails validation
    /// - `DbError::UniqueViolation` if the product number exists
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;
        debug!(number = product.number, name = %product.name, "Inserting product");

        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            INSERT INTO FK_Artikel (
                ArtikelNr, Matchcode, Bezeichnung, Beschreibung,
                Gewicht, Einheit, Vk_preis, Menge_bestand, Menge_minbestand,
                bStatus_WebShop,
                System_created, System_updated, System_created_user, System_updated_user
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.number)
        .bind(&product.matchcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_weight_kg)
        .bind(&product.unit)
        .bind(product.list_price.to_store())
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.web_shop)
        .bind(now)
        .bind(now)
        .bind(DEFAULT_SYSTEM_USER)
        .bind(DEFAULT_SYSTEM_USER)
        .execute(&mut *conn)
        .await?;

        Self::fetch_by_number(&mut conn, product.number).await
    }

    /// Gets a product by its business number.
    pub async fn get_by_number(&self, number: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM FK_Artikel p WHERE p.ArtikelNr = ?"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by business number on an open connection.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no product has that number.
    pub async fn fetch_by_number(conn: &mut SqliteConnection, number: i64) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM FK_Artikel p WHERE p.ArtikelNr = ?"
        ))
        .bind(number)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", number))
    }

    /// Lists every product that has a price for `group` and `tier`.
    ///
    /// Products without a matching price matrix row are left out.
    pub async fn list_with_prices(&self, group: i64, tier: i64) -> DbResult<Vec<PricedProduct>> {
        debug!(group = group, tier = tier, "Listing products with prices");

        let rows = sqlx::query_as::<_, PricedProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, m.Vk_preis_eur
            FROM FK_Artikel p
            INNER JOIN FK_Preismatrix m ON m.ArtikelNr = p.ArtikelNr
            WHERE m.PreisGrpNr = ? AND m.MengeNr = ?
            ORDER BY p.ArtikelNr
            "#
        ))
        .bind(group)
        .bind(tier)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PricedProduct::from).collect())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM FK_Artikel")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Lists products at or below their minimum stock.
    pub async fn list_needing_restock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM FK_Artikel p \
             WHERE p.Menge_bestand <= p.Menge_minbestand ORDER BY p.ArtikelNr"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::testing::apple;
    use orderdesk_core::PriceMatrixEntry;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let inserted = db.products().insert(&apple(17)).await.unwrap();

        assert_eq!(inserted.number, 17);
        assert_eq!(inserted.list_price.cents(), 60);
        assert_eq!(inserted.unit, "Stück");
        assert!(inserted.audit.created_at.is_some());
        assert_eq!(inserted.audit.created_user, DEFAULT_SYSTEM_USER);

        let found = db.products().get_by_number(17).await.unwrap();
        assert_eq!(found, Some(inserted));
        assert_eq!(db.products().count().await.unwrap(), 1);
        assert!(db.products().get_by_number(18).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&apple(17)).await.unwrap();

        let err = db.products().insert(&apple(17)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_with_prices_filters_group_and_tier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&apple(17)).await.unwrap();
        db.products().insert(&apple(18)).await.unwrap();

        let prices = db.prices();
        for (product, group, price) in [(17, 1, 50), (17, 2, 40), (18, 2, 70)] {
            prices
                .upsert(&PriceMatrixEntry {
                    product_number: product,
                    quantity_tier: 1,
                    price_group: group,
                    net_unit_price: Money::from_cents(price),
                })
                .await
                .unwrap();
        }

        let retail = db.products().list_with_prices(1, 1).await.unwrap();
        assert_eq!(retail.len(), 1);
        assert_eq!(retail[0].product.number, 17);
        assert_eq!(retail[0].net_unit_price.cents(), 50);

        let wholesale = db.products().list_with_prices(2, 1).await.unwrap();
        assert_eq!(wholesale.len(), 2);
        assert_eq!(wholesale[1].net_unit_price.cents(), 70);

        assert!(db.products().list_with_prices(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_needing_restock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&apple(17)).await.unwrap();
        db.products()
            .insert(&NewProduct {
                stock: 3.0,
                ..apple(18)
            })
            .await
            .unwrap();

        let low = db.products().list_needing_restock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].number, 18);
        assert!(low[0].needs_restock());
    }
}
