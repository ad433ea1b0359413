//! # Line Item Composition
//!
//! Builds one [`OrderLineItem`] from a priced product, a quantity and a
//! position, and folds persisted lines into [`OrderTotals`].
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricedProduct ──┬── net unit price ──► line_total(qty, rate)          │
//! │                  │                        │                             │
//! │                  │                        ▼                             │
//! │                  │                 net / tax / gross (rounded)          │
//! │                  │                                                      │
//! │                  └── name, matchcode, unit, weight, id ──► snapshot     │
//! │                                                                         │
//! │  index ──► LinePosition { index+1, index+1, index+2 }                  │
//! │                                                                         │
//! │  lines ──► OrderTotals::from_lines ──► header aggregates                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No I/O happens here. Price lookup, `lNr` allocation and the insert are
//! done by `orderdesk-db`.

use crate::error::CoreResult;
use crate::money::{apply_tax, line_total, Money};
use crate::types::{
    LinePosition, Order, OrderLineItem, OrderTotals, PricedProduct, ProductSnapshot, TaxRate,
};
use crate::validation::{validate_note, validate_quantity};
use crate::weight::Weight;

/// Goods group written to every line.
pub const DEFAULT_GOODS_GROUP: i64 = 1;

/// Everything needed to compose one line besides the product.
#[derive(Debug, Clone, Copy)]
pub struct LineRequest<'a> {
    /// 0-based position in the order.
    pub index: usize,
    pub quantity: i64,
    pub note: &'a str,
    pub tax_rate: TaxRate,
    /// Pre-allocated `lNr`.
    pub line_number: i64,
}

/// Composes a line item for `order`.
///
/// ## Example
/// ```rust,ignore
/// let line = build_line_item(&order, &priced, LineRequest {
///     index: 0, quantity: 3, note: "", tax_rate: TaxRate::from_bps(1900), line_number: 1,
/// })?;
/// assert_eq!(line.total_gross.cents(), 3570); // 10.00 × 3 + 19%
/// ```
pub fn build_line_item(
    order: &Order,
    priced: &PricedProduct,
    request: LineRequest<'_>,
) -> CoreResult<OrderLineItem> {
    validate_quantity(request.quantity)?;
    validate_note(request.note)?;

    let product = &priced.product;
    let unit_net = priced.net_unit_price;
    let totals = line_total(unit_net, request.quantity, request.tax_rate);
    let unit_gross = apply_tax(unit_net, request.tax_rate).gross;

    Ok(OrderLineItem {
        line_number: request.line_number,
        order_number: order.number.clone(),
        order_kind: order.kind,
        position: LinePosition::from_index(request.index),
        note: request.note.to_string(),
        product_number: product.number,
        goods_group: DEFAULT_GOODS_GROUP,
        product: ProductSnapshot {
            name: product.name.clone(),
            matchcode: product.matchcode.clone(),
            unit: product.unit.clone(),
            unit_weight: Weight::from_store(product.unit_weight_kg)?,
            product_id: product.id,
            short_name: product.name.clone(),
        },
        quantity: request.quantity,
        price_factor: request.quantity,
        unit_net_price: unit_net,
        unit_gross_price: unit_gross,
        total_net: totals.net,
        total_tax: totals.tax,
        total_gross: totals.gross,
        tax_rate: request.tax_rate,
        with_order_discount: true,
        discount_warning: true,
        unit_cost: Money::zero(),
        net_profit: Money::zero(),
        weight: Weight::scaled(product.unit_weight_kg, request.quantity)?,
    })
}

impl OrderTotals {
    /// Sums already-rounded line values. Nothing is re-rounded.
    ///
    /// The claimed amount equals the gross total and secondary sums stay 0.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a OrderLineItem>) -> Self {
        let mut totals = OrderTotals::default();
        for line in lines {
            totals.net_main += line.total_net;
            totals.gross_main += line.total_gross;
            totals.tax += line.total_tax;
            totals.net_profit += line.net_profit;
            totals.weight = totals.weight + line.weight;
        }
        totals.total_gross = totals.gross_main;
        totals.down_payment_claim = totals.total_gross;
        totals
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
