//! # Schema Migrations
//!
//! The legacy `FK_*` tables are created by SQL files embedded at compile
//! time from `migrations/sqlite/`. sqlx records applied versions in
//! `_sqlx_migrations`, so opening an existing database only runs what is
//! new.
//!
//! ```text
//! 001_legacy_schema.sql
//!     FK_Firma        company flags (gross price entry)
//!     FK_Kunde        customers, address, price group
//!     FK_Artikel      products, weight, unit, stock
//!     FK_Preismatrix  (product, tier, group) -> price
//!     FK_Auftrag      order headers with address snapshot and totals
//!     FK_AuftragPos   order lines
//! ```
//!
//! Table and column names are shared with other programs reading the same
//! file. Changes go into a new numbered file; applied files stay untouched.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
