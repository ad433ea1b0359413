//! # Persistence Errors
//!
//! [`DbError`] is what every repository, the allocator and both builders
//! return.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ─────────┐                                                 │
//! │  ValidationError ─────┼──► DbError ──► kind() ──► ErrorKind             │
//! │  CoreError ───────────┘       │                                          │
//! │                               └── is_retryable()                        │
//! │                                     UniqueViolation | Busy              │
//! │                                     └── retry_on_conflict reruns the    │
//! │                                         transaction, then Conflict      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderdesk_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

/// SQLite result codes signalling lock contention.
///
/// 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED, 517 = SQLITE_BUSY_SNAPSHOT.
const BUSY_CODES: &[&str] = &["5", "6", "517"];

/// Failure of a database-backed operation.
#[derive(Debug, Error)]
pub enum DbError {
    /// A lookup came back empty: unknown product, customer or order
    /// number, or no `FK_Preismatrix` row for (product, tier, group).
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Two writers picked the same SheetNr, KundenNr, AuftragsNr or lNr,
    /// or a product number / price key was inserted twice.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Identifier allocation kept colliding after every retry.
    #[error("{entity} {key} conflicts with an existing record after {attempts} attempt(s)")]
    Conflict {
        entity: String,
        key: String,
        attempts: u32,
    },

    /// A row references a customer, product or order that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another connection holds the write lock.
    #[error("Database busy: {0}")]
    Busy(String),

    /// The SQLite file could not be opened, or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement error reported by SQLite.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("No database connection available")]
    PoolExhausted,

    /// Validation or arithmetic failure from orderdesk-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `Price not found: product 17`
    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether rerunning the transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. } | DbError::Busy(_))
    }

    /// Coarse category for callers that do not match on variants.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::Conflict { .. } => ErrorKind::Conflict,
            DbError::Core(err) => err.kind(),
            DbError::ForeignKeyViolation { .. }
            | DbError::Busy(_)
            | DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::Persistence,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(err.into())
    }
}

/// Constraint failures are recognised by sqlx's classification first and
/// SQLite's message text second; lock contention by result code.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                key: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let code = db_err.code();

                // "UNIQUE constraint failed: FK_Auftrag.AuftragsNr"
                if db_err.is_unique_violation() || msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if db_err.is_foreign_key_violation()
                    || msg.contains("FOREIGN KEY constraint failed")
                {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if code.as_deref().is_some_and(|c| BUSY_CODES.contains(&c))
                    || msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DbError::not_found("Price", "product 1").kind(), ErrorKind::NotFound);
        assert_eq!(DbError::duplicate("FK_Kunde.KundenNr", "7").kind(), ErrorKind::Conflict);
        assert_eq!(DbError::Busy("locked".into()).kind(), ErrorKind::Persistence);
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Persistence);

        let validation: DbError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert_eq!(validation.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_retryable() {
        assert!(DbError::duplicate("FK_Auftrag.AuftragsNr", "3").is_retryable());
        assert!(DbError::Busy("database is locked".into()).is_retryable());
        assert!(!DbError::not_found("Order", "3").is_retryable());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
