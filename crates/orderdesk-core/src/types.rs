//! # Domain Types
//!
//! Core domain types of the order workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Customer     │   │     Order       │   │   OrderLineItem      │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  id (SheetNr)   │   │  id (SheetNr)   │   │  line_number (lNr)   │  │
//! │  │  number         │──►│  number         │◄──│  order_number        │  │
//! │  │  address ───────┼─┐ │  address (copy) │   │  position (3 ctrs)   │  │
//! │  └─────────────────┘ └►│  totals, flags  │   │  product (snapshot)  │  │
//! │                        └─────────────────┘   └──────────▲───────────┘  │
//! │  ┌─────────────────┐   ┌─────────────────┐              │              │
//! │  │    Product      │◄──│ PriceMatrixEntry│              │              │
//! │  │  number         │   │ (number, tier,  │──── net unit price          │
//! │  │  name, weight   │───┼─ group) → price │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every allocated entity has:
//! - `id`: internal storage identifier (`SheetNr`, `lNr`)
//! - a business number (`KundenNr`, `AuftragsNr`) kept in lockstep with `id`
//!
//! ## Legacy Column Names
//! With the `sqlx` feature enabled, each type derives `sqlx::FromRow` with
//! the legacy (German) column names. Those names are an external contract
//! and must not change.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, ValidationError};
use crate::money::{decimal_from_store, LineTotals, Money};
use crate::weight::Weight;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1900 bps = 19% = fraction 0.19, the form the legacy schema stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a fraction such as `0.19`.
    ///
    /// ## Rules
    /// - Between 0 and 1 inclusive
    /// - At most 4 decimal places (whole basis points)
    pub fn from_fraction(fraction: Decimal) -> Result<Self, ValidationError> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: 1,
            });
        }

        let bps = fraction * Decimal::from(10_000);
        if bps.fract() != Decimal::ZERO {
            return Err(ValidationError::InvalidFormat {
                field: "tax_rate".to_string(),
                reason: "must have at most 4 decimal places".to_string(),
            });
        }

        bps.to_u32()
            .map(TaxRate)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "tax_rate".to_string(),
                reason: fraction.to_string(),
            })
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an exact fraction (`0.1900`).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }

    /// Fraction for the legacy REAL column.
    #[inline]
    pub fn to_store(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl TryFrom<f64> for TaxRate {
    type Error = CoreError;

    fn try_from(fraction: f64) -> Result<Self, Self::Error> {
        Ok(TaxRate::from_fraction(decimal_from_store(fraction)?)?)
    }
}

// =============================================================================
// Audit Columns
// =============================================================================

/// Creation/update bookkeeping present on products and orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecordAudit {
    /// GMT timestamp of creation.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "System_created"))]
    pub created_at: Option<DateTime<Utc>>,

    /// GMT timestamp of last update.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "System_updated"))]
    pub updated_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "System_created_user"))]
    pub created_user: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "System_updated_user"))]
    pub updated_user: String,
}

impl RecordAudit {
    /// Audit values for a row written now by `user`.
    pub fn now(user: &str) -> Self {
        let now = Utc::now();
        RecordAudit {
            created_at: Some(now),
            updated_at: now,
            created_user: user.to_string(),
            updated_user: user.to_string(),
        }
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// A customer's address as stored. Legacy rows may hold NULL in any field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerAddress {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Anrede"))]
    pub salutation: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Firma"))]
    pub company: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Name"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Vorname"))]
    pub first_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Zusatz"))]
    pub supplement: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Strasse"))]
    pub street: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_HausNr"))]
    pub house_number: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Ort"))]
    pub city: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Plz"))]
    pub postal_code: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Land"))]
    pub country: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Tel1"))]
    pub phone1: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Tel2"))]
    pub phone2: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Email"))]
    pub email: Option<String>,
    /// Not part of the order snapshot.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Web"))]
    pub web: Option<String>,
}

/// The address copied onto an order at creation time.
///
/// A value, not a reference: later edits to the customer never reach it.
/// See [`crate::address`] for the field mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AddressSnapshot {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Anrede"))]
    pub salutation: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Firma"))]
    pub company: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Name"))]
    pub name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Vorname"))]
    pub first_name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Zusatz"))]
    pub supplement: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Strasse"))]
    pub street: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_HausNr"))]
    pub house_number: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Ort"))]
    pub city: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Plz"))]
    pub postal_code: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Land"))]
    pub country: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Tel1"))]
    pub phone1: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Tel2"))]
    pub phone2: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Anschrift_Email"))]
    pub email: String,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer (`FK_Kunde`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Internal identifier.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SheetNr"))]
    pub id: i64,

    /// Unique customer number, stored as text.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "KundenNr"))]
    pub number: String,

    /// Short name for the customer. Should be unique.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Matchcode"))]
    pub matchcode: String,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: CustomerAddress,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Bemerkung"))]
    pub note: Option<String>,
}

/// Input for creating a customer; id and number are allocated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub matchcode: String,
    pub address: CustomerAddress,
    /// Falls back to the schema default note when `None`.
    pub note: Option<String>,
}

// =============================================================================
// Company
// =============================================================================

/// A company record (`FK_Firma`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "lID_Firma"))]
    pub id: i64,

    /// Whether the company presents prices gross (tax included).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bBrutto"))]
    pub prices_gross: bool,
}

// =============================================================================
// Product
// =============================================================================

/// A product (`FK_Artikel`). Read-only for the order workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Internal identifier, copied into line items as `lArtikelID`.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SheetNr"))]
    pub id: i64,

    /// Business identifier referenced by the price matrix and line items.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ArtikelNr"))]
    pub number: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Matchcode"))]
    pub matchcode: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Bezeichnung"))]
    pub name: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Beschreibung"))]
    pub description: String,

    /// Unit weight in kg, as stored (unrounded).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Gewicht"))]
    pub unit_weight_kg: f64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Einheit"))]
    pub unit: String,

    /// List price. Orders are priced from the price matrix instead.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Vk_preis", try_from = "f64"))]
    pub list_price: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Menge_bestand"))]
    pub stock: f64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Menge_minbestand"))]
    pub min_stock: f64,

    /// Visible in the web shop?
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_WebShop"))]
    pub web_shop: bool,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: RecordAudit,
}

impl Product {
    /// Checks whether stock is at or below the minimum threshold.
    pub fn needs_restock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub number: i64,
    pub matchcode: String,
    pub name: String,
    pub description: String,
    pub unit_weight_kg: f64,
    pub unit: String,
    pub list_price: Money,
    pub stock: f64,
    pub min_stock: f64,
    pub web_shop: bool,
}

// =============================================================================
// Price Matrix
// =============================================================================

/// One price matrix row (`FK_Preismatrix`).
///
/// (product, tier, group) is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceMatrixEntry {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ArtikelNr"))]
    pub product_number: i64,

    /// Volume breakpoint (1, 10, 100 ...), not an ordered quantity.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "MengeNr"))]
    pub quantity_tier: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "PreisGrpNr"))]
    pub price_group: i64,

    /// Net (!) selling price per unit.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Vk_preis_eur", try_from = "f64"))]
    pub net_unit_price: Money,
}

/// Key of a price lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceQuery {
    pub product_number: i64,
    pub price_group: i64,
    pub quantity_tier: i64,
}

impl fmt::Display for PriceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "product {}, group {}, tier {}",
            self.product_number, self.price_group, self.quantity_tier
        )
    }
}

/// A product together with its resolved net unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedProduct {
    pub product: Product,
    pub net_unit_price: Money,
}

// =============================================================================
// Order
// =============================================================================

/// Commercial terms (`Konditionen_*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderTerms {
    /// Selects the price matrix column (retail, wholesale, ...).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Konditionen_PreisgrpNr"))]
    pub price_group: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Konditionen_Rabatt"))]
    pub discount: f64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Konditionen_Rabatt_Proz"))]
    pub discount_percent: f64,

    /// ISO 4217 numeric code (978 = EUR).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Konditionen_Waehrung"))]
    pub currency: i64,

    /// Legacy payment method code (4 = online).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Konditionen_Zahlungsart"))]
    pub payment_method: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Konditionen_Lieferart"))]
    pub delivery_method: String,
}

impl Default for OrderTerms {
    fn default() -> Self {
        OrderTerms {
            price_group: crate::DEFAULT_PRICE_GROUP,
            discount: 0.0,
            discount_percent: 0.0,
            currency: crate::CURRENCY_EUR,
            payment_method: crate::PAYMENT_METHOD_ONLINE,
            delivery_method: crate::DEFAULT_DELIVERY_METHOD.to_string(),
        }
    }
}

/// Aggregate totals of an order header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderTotals {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_netto_haupt", try_from = "f64"))]
    pub net_main: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_brutto_haupt", try_from = "f64"))]
    pub gross_main: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_netto_neben", try_from = "f64"))]
    pub net_secondary: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_brutto_neben", try_from = "f64"))]
    pub gross_secondary: Money,

    /// VAT only.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_ust_gesamt", try_from = "f64"))]
    pub tax: Money,

    /// Gross total including tax.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_gesamt", try_from = "f64"))]
    pub total_gross: Money,

    /// Amount claimed; equals the gross total for new orders.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_abschlag_forderung", try_from = "f64"))]
    pub down_payment_claim: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "dftSumme_GewinnNetto_NAR", try_from = "f64"))]
    pub net_profit: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "dftSummen_Gewicht", try_from = "f64"))]
    pub weight: Weight,
}

/// Boolean-as-integer status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderFlags {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_lagergebucht"))]
    pub stocked: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_gebucht"))]
    pub booked: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_uebernommen"))]
    pub carried_over: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_gedruckt"))]
    pub printed: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_exportiert"))]
    pub exported: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_geliefert"))]
    pub delivered: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_bezahlt"))]
    pub paid: bool,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bStatus_weitergefuehrt"))]
    pub carried_forward: bool,
}

/// An order header (`FK_Auftrag`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SheetNr"))]
    pub id: i64,

    /// Unique order number, stored as text.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "AuftragsNr"))]
    pub number: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "AuftragsKennung"))]
    pub kind: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "KundenNr"))]
    pub customer_number: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "KundenMatchcode"))]
    pub customer_matchcode: String,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub terms: OrderTerms,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: AddressSnapshot,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Datum_erfassung"))]
    pub captured_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Datum_zahlung"))]
    pub paid_at: DateTime<Utc>,

    /// Expected delivery date (time of day does not matter).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tsLieferTermin"))]
    pub delivery_due: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub totals: OrderTotals,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub flags: OrderFlags,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: RecordAudit,
}

// =============================================================================
// Order Line Item
// =============================================================================

/// The three position counters of a line item.
///
/// Legacy-compatibility debt: `sequence` and `display_position` are always
/// equal and `legacy_position` is one larger. New schemas need only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LinePosition {
    /// 1-based, gapless within the order.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "LfdNr"))]
    pub sequence: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "szPosNr"))]
    pub display_position: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PosNr"))]
    pub legacy_position: i64,
}

impl LinePosition {
    /// Positions for the line at 0-based `index`.
    pub const fn from_index(index: usize) -> Self {
        let index = index as i64;
        LinePosition {
            sequence: index + 1,
            display_position: index + 1,
            legacy_position: index + 2,
        }
    }
}

/// Product attributes frozen at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSnapshot {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Artikel_Bezeichnung"))]
    pub name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Artikel_Matchcode"))]
    pub matchcode: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Artikel_Einheit"))]
    pub unit: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Artikel_kg_Einheit", try_from = "f64"))]
    pub unit_weight: Weight,
    /// Internal id of the product (`SheetNr`).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "lArtikelID"))]
    pub product_id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "szArtikel_Kurzbezeichnung"))]
    pub short_name: String,
}

/// One line of an order (`FK_AuftragPos`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLineItem {
    /// Table-wide line identifier, allocated as max + 1.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "lNr"))]
    pub line_number: i64,

    /// Parent order's business number (not its internal id).
    #[cfg_attr(feature = "sqlx", sqlx(rename = "AuftragsNr"))]
    pub order_number: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "AuftragsKennung"))]
    pub order_kind: i64,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub position: LinePosition,

    /// Free text per line, e.g. "the apples should be green".
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PosText"))]
    pub note: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "ArtikelNr"))]
    pub product_number: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "WarengrpNr"))]
    pub goods_group: i64,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub product: ProductSnapshot,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Artikel_Menge"))]
    pub quantity: i64,

    /// Always equal to `quantity`.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Artikel_Preisfaktor"))]
    pub price_factor: i64,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_preis", try_from = "f64"))]
    pub unit_net_price: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "dftArtikelpreisBrutto", try_from = "f64"))]
    pub unit_gross_price: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_netto", try_from = "f64"))]
    pub total_net: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_ust_gesamt", try_from = "f64"))]
    pub total_tax: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_brutto", try_from = "f64"))]
    pub total_gross: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "Summen_ust_proz", try_from = "f64"))]
    pub tax_rate: TaxRate,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "bMitAuftragsrabatt"))]
    pub with_order_discount: bool,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "fRabattWarnung"))]
    pub discount_warning: bool,

    /// Cost of the product for the company, without profit.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "dftArtikel_Selbstkosten", try_from = "f64"))]
    pub unit_cost: Money,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "dftSumme_GewinnNetto_NAR", try_from = "f64"))]
    pub net_profit: Money,

    /// Line weight: unit weight × quantity.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "dftSummen_Gewicht", try_from = "f64"))]
    pub weight: Weight,
}

impl OrderLineItem {
    /// Returns the line totals.
    #[inline]
    pub fn totals(&self) -> LineTotals {
        LineTotals {
            net: self.total_net,
            tax: self.total_tax,
            gross: self.total_gross,
        }
    }
}

// =============================================================================
// Order Requests
// =============================================================================

/// One requested line: product, quantity and an optional note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_number: i64,
    pub quantity: i64,
    #[serde(default)]
    pub note: String,
    /// Overrides the configured default tax rate for this line.
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
}

impl NewOrderLine {
    pub fn new(product_number: i64, quantity: i64) -> Self {
        NewOrderLine {
            product_number,
            quantity,
            note: String::new(),
            tax_rate: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = Some(rate);
        self
    }
}

/// Input for creating an order for an existing customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Falls back to the configured price group.
    #[serde(default)]
    pub price_group: Option<i64>,

    #[serde(default)]
    pub delivery_method: Option<String>,

    /// Falls back to the capture time.
    #[serde(default)]
    pub delivery_due: Option<DateTime<Utc>>,

    /// Recorded on the header; line prices are not reduced.
    #[serde(default)]
    pub discount_percent: Option<f64>,

    /// ISO 4217 numeric code. Falls back to EUR.
    #[serde(default)]
    pub currency: Option<i64>,

    /// Legacy payment method code. Falls back to online.
    #[serde(default)]
    pub payment_method: Option<i64>,

    /// Lines in position order.
    pub lines: Vec<NewOrderLine>,
}

/// A persisted line item joined with the current product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: OrderLineItem,
    pub product: Product,
}

/// A persisted order with its lines in position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================
