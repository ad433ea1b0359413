//! # orderdesk-core: Pure Order Logic
//!
//! This crate holds every calculation of the order workflow as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        orderdesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Embedding application (any)                     │   │
//! │  │        create_order, get_with_lines, insert_customer ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              orderdesk-db (Database Layer)                      │   │
//! │  │    Order Builder ─► Content Builder ─► Price Resolver           │   │
//! │  │    Identifier Allocator (transaction + retry)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ orderdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌────────────────┐  │   │
//! │  │   │  money   │ │  weight  │ │ allocator │ │   line_item    │  │   │
//! │  │   │  Money   │ │  Weight  │ │  next_id  │ │ build_line_item│  │   │
//! │  │   │ apply_tax│ │  scaled  │ │           │ │  OrderTotals   │  │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   pure arithmetic and types, nothing here touches SQLite       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Product, Order, OrderLineItem, ...)
//! - [`money`] - Money in integer cents, tax and line totals
//! - [`weight`] - Weight with gram (3 decimal kg) precision
//! - [`allocator`] - The "max + 1" identifier rule
//! - [`address`] - Customer address → order address snapshot
//! - [`line_item`] - Composition of one order line item
//! - [`config`] - Order workflow configuration
//! - [`error`] - CoreError, ValidationError and ErrorKind
//! - [`validation`] - Request checks run before any write
//!
//! ## Example Usage
//!
//! ```rust
//! use orderdesk_core::money::{line_total, Money};
//! use orderdesk_core::types::TaxRate;
//!
//! let unit_price = Money::from_cents(1000); // 10.00
//! let totals = line_total(unit_price, 3, TaxRate::from_bps(1900));
//!
//! assert_eq!(totals.net.cents(), 3000);
//! assert_eq!(totals.tax.cents(), 570);
//! assert_eq!(totals.gross.cents(), 3570);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod address;
pub mod allocator;
pub mod config;
pub mod error;
pub mod line_item;
pub mod money;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::OrderConfig;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;
pub use weight::Weight;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Price group used when an order does not name one.
pub const DEFAULT_PRICE_GROUP: i64 = 1;

/// Quantity tier used for price lookups unless tiered pricing is requested.
///
/// ## Business Reason
/// Tiers are pricing breakpoints (1, 10, 100 units), not the ordered
/// quantity. Callers opt into tiered pricing explicitly.
pub const DEFAULT_QUANTITY_TIER: i64 = 1;

/// Default VAT rate in basis points (19%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1900;

/// ISO 4217 numeric code for EUR, the legacy schema's currency column.
pub const CURRENCY_EUR: i64 = 978;

/// Legacy payment method code for online payment.
pub const PAYMENT_METHOD_ONLINE: i64 = 4;

/// Legacy default delivery method text.
pub const DEFAULT_DELIVERY_METHOD: &str = "Lieferung per Postversand";

/// Default unit of measure for products and line items.
pub const DEFAULT_UNIT: &str = "Stück";

/// User name written into the audit columns.
pub const DEFAULT_SYSTEM_USER: &str = "ORDERDESK";
