//! # Services
//!
//! Multi-table workflows built on the repositories.
//!
//! - [`order_builder`] - the Order Builder (header, lines and totals in one transaction)
//! - [`content_builder`] - the Order Content Builder (one priced line item per request line)

pub mod content_builder;
pub mod order_builder;
