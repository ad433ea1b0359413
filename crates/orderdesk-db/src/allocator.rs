//! # Identifier Allocator
//!
//! Runs the "max + 1" rule of `orderdesk_core::allocator` against the
//! database, inside the caller's transaction.
//!
//! ## Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  writer A: BEGIN ─ scan max=7 ─ INSERT 8 ─ COMMIT ✓                    │
//! │  writer B: BEGIN ─ scan max=7 ─ INSERT 8 ─ UNIQUE / BUSY ✗             │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │            ROLLBACK ─ back off ─ BEGIN ─ scan max=8 ─ INSERT 9 ✓       │
//! │                                                                         │
//! │  The unique constraints on SheetNr / KundenNr / AuftragsNr / lNr make  │
//! │  a lost race visible. `retry_on_conflict` reruns the whole unit of     │
//! │  work a bounded number of times, then reports DbError::Conflict.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderdesk_core::allocator::{next_dual_id, next_id};
use sqlx::SqliteConnection;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Base delay between attempts; attempt `n` waits `n × RETRY_BACKOFF`.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// The tables whose identifiers are allocated by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFamily {
    /// `FK_Kunde`: SheetNr + KundenNr.
    Customer,
    /// `FK_Auftrag`: SheetNr + AuftragsNr.
    Order,
    /// `FK_AuftragPos`: lNr.
    OrderContent,
}

impl IdFamily {
    /// Entity name used in logs and errors.
    pub fn entity(&self) -> &'static str {
        match self {
            IdFamily::Customer => "Customer",
            IdFamily::Order => "Order",
            IdFamily::OrderContent => "OrderContent",
        }
    }
}

impl fmt::Display for IdFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity())
    }
}

/// Returns the next free identifier of `family`.
///
/// Call it on the transaction that performs the insert, so the scan and
/// the write commit or roll back together.
///
/// ## Errors
/// `CoreError::IdentifiersExhausted` (kind Conflict) if a stored id or
/// business number is already `i64::MAX`. Never retried.
///
/// ## Example
/// ```rust,ignore
/// let mut tx = pool.begin().await?;
/// let id = allocate(&mut *tx, IdFamily::Order).await?;
/// // insert with SheetNr = id, AuftragsNr = id.to_string()
/// tx.commit().await?;
/// ```
pub async fn allocate(conn: &mut SqliteConnection, family: IdFamily) -> DbResult<i64> {
    let next = match family {
        IdFamily::Customer => {
            let rows: Vec<(i64, String)> = sqlx::query_as("SELECT SheetNr, KundenNr FROM FK_Kunde")
                .fetch_all(&mut *conn)
                .await?;
            next_dual_id(&rows)
        }
        IdFamily::Order => {
            let rows: Vec<(i64, String)> =
                sqlx::query_as("SELECT SheetNr, AuftragsNr FROM FK_Auftrag")
                    .fetch_all(&mut *conn)
                    .await?;
            next_dual_id(&rows)
        }
        IdFamily::OrderContent => {
            let rows: Vec<i64> = sqlx::query_scalar("SELECT lNr FROM FK_AuftragPos")
                .fetch_all(&mut *conn)
                .await?;
            next_id(&rows, |id| *id)
        }
    }
    .map_err(|err| {
        warn!(family = %family, error = %err, "Identifier space exhausted");
        err
    })?;

    debug!(family = %family, next = next, "Allocated identifier");
    Ok(next)
}

/// Runs `operation` until it succeeds, fails with a non-retryable error,
/// or `max_attempts` is used up.
///
/// `operation` receives the 1-based attempt number and must run a complete
/// transaction; a failed attempt has already rolled back when it returns.
///
/// ## Errors
/// - The operation's own error if it is not retryable
/// - `DbError::Conflict` naming `entity` after the last attempt
pub async fn retry_on_conflict<T, F, Fut>(
    max_attempts: u32,
    entity: &str,
    mut operation: F,
) -> DbResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt >= max_attempts {
                    warn!(entity = %entity, attempts = attempt, error = %err, "Giving up after conflicts");
                    let key = match err {
                        DbError::UniqueViolation { field, .. } => field,
                        other => other.to_string(),
                    };
                    return Err(DbError::Conflict {
                        entity: entity.to_string(),
                        key,
                        attempts: attempt,
                    });
                }

                warn!(entity = %entity, attempt = attempt, error = %err, "Conflict, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
