//! Database operations for `FK_Firma`.

use orderdesk_core::Company;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for company records.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Inserts or replaces a company record.
    pub async fn upsert(&self, company: &Company) -> DbResult<()> {
        debug!(id = company.id, gross = company.prices_gross, "Upserting company");

        sqlx::query(
            r#"
            INSERT INTO FK_Firma (lID_Firma, bBrutto) VALUES (?, ?)
            ON CONFLICT (lID_Firma) DO UPDATE SET bBrutto = excluded.bBrutto
            "#,
        )
        .bind(company.id)
        .bind(company.prices_gross)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a company by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT lID_Firma, bBrutto FROM FK_Firma WHERE lID_Firma = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Whether the company presents prices gross.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the company does not exist.
    pub async fn prices_gross(&self, id: i64) -> DbResult<bool> {
        self.get(id)
            .await?
            .map(|company| company.prices_gross)
            .ok_or_else(|| DbError::not_found("Company", id))
    }
}
