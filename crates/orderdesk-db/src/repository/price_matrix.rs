//! # Price Resolver
//!
//! Looks up net unit prices in `FK_Preismatrix`.
//!
//! ## Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PriceQuery { product 17, group 1, tier 1 }                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT Vk_preis_eur FROM FK_Preismatrix                               │
//! │  WHERE ArtikelNr = 17 AND PreisGrpNr = 1 AND MengeNr = 1               │
//! │       │                                                                 │
//! │       ├── row found  ──► Money (net, rounded half-up to cents)         │
//! │       └── no row     ──► DbError::NotFound("Price", query)             │
//! │                                                                         │
//! │  There is no fallback to another tier, group or the list price.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderdesk_core::validation::{validate_price_cents, validate_price_group, validate_quantity_tier};
use orderdesk_core::{Money, PriceMatrixEntry, PriceQuery, PricedProduct};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;

/// Returns the net unit price for `query`.
///
/// ## Errors
/// `DbError::NotFound` naming the (product, group, tier) key if no row matches.
pub async fn resolve_price(conn: &mut SqliteConnection, query: &PriceQuery) -> DbResult<Money> {
    debug!(query = %query, "Resolving price");

    let price: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT Vk_preis_eur FROM FK_Preismatrix
        WHERE ArtikelNr = ? AND PreisGrpNr = ? AND MengeNr = ?
        "#,
    )
    .bind(query.product_number)
    .bind(query.price_group)
    .bind(query.quantity_tier)
    .fetch_optional(&mut *conn)
    .await?;

    match price {
        Some(value) => Ok(Money::from_store(value)?),
        None => Err(DbError::not_found("Price", query)),
    }
}

/// Loads the product for `query` together with its resolved price.
///
/// ## Errors
/// - `DbError::NotFound("Product", ..)` for an unknown product number
/// - `DbError::NotFound("Price", ..)` if the product has no matching price
pub async fn price_product(conn: &mut SqliteConnection, query: &PriceQuery) -> DbResult<PricedProduct> {
    let product = ProductRepository::fetch_by_number(conn, query.product_number).await?;
    let net_unit_price = resolve_price(conn, query).await?;

    Ok(PricedProduct {
        product,
        net_unit_price,
    })
}

/// Repository for price matrix rows.
#[derive(Debug, Clone)]
pub struct PriceMatrixRepository {
    pool: SqlitePool,
}

impl PriceMatrixRepository {
    /// Creates a new PriceMatrixRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PriceMatrixRepository { pool }
    }

    /// Inserts a price row, replacing the price of an existing key.
    pub async fn upsert(&self, entry: &PriceMatrixEntry) -> DbResult<()> {
        validate_price_group(entry.price_group)?;
        validate_quantity_tier(entry.quantity_tier)?;
        validate_price_cents(entry.net_unit_price.cents())?;

        debug!(
            product = entry.product_number,
            group = entry.price_group,
            tier = entry.quantity_tier,
            price = %entry.net_unit_price,
            "Upserting price"
        );

        sqlx::query(
            r#"
            INSERT INTO FK_Preismatrix (ArtikelNr, MengeNr, PreisGrpNr, Vk_preis_eur)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (ArtikelNr, MengeNr, PreisGrpNr)
            DO UPDATE SET Vk_preis_eur = excluded.Vk_preis_eur
            "#,
        )
        .bind(entry.product_number)
        .bind(entry.quantity_tier)
        .bind(entry.price_group)
        .bind(entry.net_unit_price.to_store())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolves a price on a pooled connection.
    pub async fn resolve(&self, query: &PriceQuery) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        resolve_price(&mut conn, query).await
    }

    /// Lists every price row of a product.
    pub async fn list_for_product(&self, product_number: i64) -> DbResult<Vec<PriceMatrixEntry>> {
        let entries = sqlx::query_as::<_, PriceMatrixEntry>(
            r#"
            SELECT ArtikelNr, MengeNr, PreisGrpNr, Vk_preis_eur
            FROM FK_Preismatrix
            WHERE ArtikelNr = ?
            ORDER BY PreisGrpNr, MengeNr
            "#,
        )
        .bind(product_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
