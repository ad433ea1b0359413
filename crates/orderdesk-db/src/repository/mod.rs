//! # Repository Module
//!
//! Database repository implementations for the legacy order tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Embedding application                                                 │
//! │       │                                                                 │
//! │       │  db.customers().insert_unique(&new_customer)                   │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── insert_unique(&self, customer)                                    │
//! │  ├── get_by_number(&self, number)                                      │
//! │  └── update_address(&self, number, address)                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Methods taking `&mut SqliteConnection` instead of `&self` run on the  │
//! │  caller's connection, so the order builder can combine them in one     │
//! │  transaction.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - `FK_Kunde`
//! - [`CompanyRepository`](company::CompanyRepository) - `FK_Firma`
//! - [`ProductRepository`](product::ProductRepository) - `FK_Artikel`
//! - [`PriceMatrixRepository`](price_matrix::PriceMatrixRepository) - `FK_Preismatrix`, the Price Resolver
//! - [`OrderRepository`](order::OrderRepository) - `FK_Auftrag`
//! - [`OrderContentRepository`](order_content::OrderContentRepository) - `FK_AuftragPos`

pub mod company;
pub mod customer;
pub mod order;
pub mod order_content;
pub mod price_matrix;
pub mod product;
