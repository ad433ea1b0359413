//! # orderdesk-db: Database Layer for orderdesk
//!
//! This crate provides database access for the order workflow.
//! It uses SQLite with the legacy table layout and sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        orderdesk Data Flow                              │
//! │                                                                         │
//! │  Embedding application (create_order)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   orderdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌────────────────┐  ┌─────────────────┐  │   │
//! │  │   │   Services    │  │  Repositories  │  │   Allocator     │  │   │
//! │  │   │               │  │                │  │                 │  │   │
//! │  │   │ OrderBuilder  │─►│ OrderRepo      │  │ allocate()      │  │   │
//! │  │   │ content_      │─►│ OrderContent   │◄─│ retry_on_       │  │   │
//! │  │   │   builder     │─►│ PriceMatrix    │  │   conflict()    │  │   │
//! │  │   │               │  │ Product, Cust. │  │                 │  │   │
//! │  │   └───────────────┘  └────────────────┘  └─────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   Database (pool.rs) • migrations (embedded) • AppConfig       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: FK_Kunde, FK_Artikel, FK_Preismatrix,                 │   │
//! │  │           FK_Auftrag, FK_AuftragPos, FK_Firma                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - `DbConfig` and the `Database` handle
//! - [`config`] - Environment-driven application configuration
//! - [`migrations`] - Legacy `FK_*` schema, embedded at compile time
//! - [`error`] - `DbError` and its mapping from sqlx
//! - [`allocator`] - Transactional "max + 1" allocation with retries
//! - [`repository`] - Table-level repositories, including the Price Resolver
//! - [`service`] - Order Builder and Order Content Builder
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderdesk_core::{NewOrder, NewOrderLine};
//! use orderdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("orders.db")).await?;
//!
//! let customer = db.customers().get_by_number("42").await?.unwrap();
//! let created = db
//!     .order_builder()
//!     .create_order(&customer, &NewOrder {
//!         lines: vec![NewOrderLine::new(17, 3)],
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repositories
pub use repository::company::CompanyRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::order_content::OrderContentRepository;
pub use repository::price_matrix::{resolve_price, PriceMatrixRepository};
pub use repository::product::ProductRepository;

pub use service::order_builder::{CreatedOrder, OrderBuilder};
