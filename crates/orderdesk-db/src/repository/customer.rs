//! # Customer Repository
//!
//! Database operations for `FK_Kunde`.
//!
//! Customers are created with an allocated `SheetNr` and a `KundenNr`
//! holding the same number as text. See [`crate::allocator`].

use orderdesk_core::validation::validate_new_customer;
use orderdesk_core::{Customer, CustomerAddress, NewCustomer, OrderConfig};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::allocator::{allocate, retry_on_conflict, IdFamily};
use crate::error::{DbError, DbResult};

/// Note written when a new customer has none.
pub const DEFAULT_CUSTOMER_NOTE: &str = "Customer created by ORDERDESK";

const SELECT_CUSTOMER: &str = r#"
    SELECT
        SheetNr, KundenNr, Matchcode,
        Anschrift_Anrede, Anschrift_Firma, Anschrift_Name, Anschrift_Vorname,
        Anschrift_Zusatz, Anschrift_Strasse, Anschrift_HausNr, Anschrift_Ort,
        Anschrift_Plz, Anschrift_Land, Anschrift_Tel1, Anschrift_Tel2,
        Anschrift_Email, Anschrift_Web,
        Bemerkung
    FROM FK_Kunde
"#;

/// Repository for customer database operations.
///
/// ## Usage
/// ```rust,ignore
/// let customer = db.customers().insert_unique(&NewCustomer {
///     matchcode: "MUSTER".into(),
///     ..Default::default()
/// }).await?;
/// assert_eq!(customer.number, customer.id.to_string());
/// ```
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    config: OrderConfig,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool, config: OrderConfig) -> Self {
        CustomerRepository { pool, config }
    }

    /// Inserts a customer with a freshly allocated id and number.
    ///
    /// Missing address fields are stored as empty text.
    ///
    /// ## Errors
    /// - `DbError::Core` if the input fails validation
    /// - `DbError::Conflict` if allocation kept colliding
    pub async fn insert_unique(&self, customer: &NewCustomer) -> DbResult<Customer> {
        validate_new_customer(customer)?;

        let created = retry_on_conflict(self.config.allocation_attempts, "Customer", |attempt| {
            self.try_insert(customer, attempt)
        })
        .await?;

        info!(number = %created.number, matchcode = %created.matchcode, "Customer created");
        Ok(created)
    }

    async fn try_insert(&self, customer: &NewCustomer, attempt: u32) -> DbResult<Customer> {
        let mut tx = self.pool.begin().await?;

        let id = allocate(&mut tx, IdFamily::Customer).await?;
        debug!(id = id, attempt = attempt, "Inserting customer");

        let address = &customer.address;
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO FK_Kunde (
                SheetNr, KundenNr, Matchcode,
                Anschrift_Anrede, Anschrift_Firma, Anschrift_Name, Anschrift_Vorname,
                Anschrift_Zusatz, Anschrift_Strasse, Anschrift_HausNr, Anschrift_Ort,
                Anschrift_Plz, Anschrift_Land, Anschrift_Tel1, Anschrift_Tel2,
                Anschrift_Email, Anschrift_Web,
                Bemerkung
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(id.to_string())
        .bind(&customer.matchcode)
        .bind(text(&address.salutation))
        .bind(text(&address.company))
        .bind(text(&address.name))
        .bind(text(&address.first_name))
        .bind(text(&address.supplement))
        .bind(text(&address.street))
        .bind(text(&address.house_number))
        .bind(text(&address.city))
        .bind(text(&address.postal_code))
        .bind(text(&address.country))
        .bind(text(&address.phone1))
        .bind(text(&address.phone2))
        .bind(text(&address.email))
        .bind(text(&address.web))
        .bind(customer.note.as_deref().unwrap_or(DEFAULT_CUSTOMER_NOTE))
        .execute(&mut *tx)
        .await?;

        let created = Self::fetch_by_number(&mut tx, &id.to_string()).await?;
        tx.commit().await?;

        Ok(created)
    }

    /// Gets a customer by business number.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE KundenNr = ?"))
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Gets a customer by business number on an open connection.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no customer has that number.
    pub async fn fetch_by_number(conn: &mut SqliteConnection, number: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE KundenNr = ?"))
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", number))
    }

    /// Replaces a customer's address.
    ///
    /// Orders created earlier keep their own copy.
    pub async fn update_address(&self, number: &str, address: &CustomerAddress) -> DbResult<()> {
        orderdesk_core::validation::validate_address(address)?;
        debug!(number = %number, "Updating customer address");

        let result = sqlx::query(
            r#"
            UPDATE FK_Kunde SET
                Anschrift_Anrede = ?, Anschrift_Firma = ?, Anschrift_Name = ?,
                Anschrift_Vorname = ?, Anschrift_Zusatz = ?, Anschrift_Strasse = ?,
                Anschrift_HausNr = ?, Anschrift_Ort = ?, Anschrift_Plz = ?,
                Anschrift_Land = ?, Anschrift_Tel1 = ?, Anschrift_Tel2 = ?,
                Anschrift_Email = ?, Anschrift_Web = ?
            WHERE KundenNr = ?
            "#,
        )
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
        .bind(&address.web)
        .bind(number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", number));
        }

        Ok(())
    }

    /// Counts customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM FK_Kunde")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
