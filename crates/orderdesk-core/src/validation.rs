//! # Validation Module
//!
//! Business rule checks run before any row is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Embedding application                                        │
//! │  └── Type validation (deserialization into NewOrder, NewCustomer)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantities, price groups, tiers                                   │
//! │  └── Text lengths of the legacy varchar columns                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite does not enforce varchar lengths, so the limits of the legacy
//! schema are checked here.

use crate::error::ValidationError;
use crate::types::{CustomerAddress, NewCustomer, NewOrder, NewOrderLine, NewProduct};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest quantity accepted on one line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Most lines accepted in one order.
pub const MAX_ORDER_LINES: usize = 999;

const MAX_TEXT: usize = 255;
const MAX_MATCHCODE: usize = 35;
const MAX_PHONE: usize = 20;
const MAX_UNIT: usize = 20;
const MAX_NOTE: usize = 5000;

// =============================================================================
// String Validators
// =============================================================================

/// Checks a text against a column length, counted in characters.
pub fn validate_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Checks a required text: non-blank and within `max` characters.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    validate_length(field, value, max)
}

/// Validates a match code (short search name).
///
/// ## Example
/// ```rust
/// use orderdesk_core::validation::validate_matchcode;
///
/// assert!(validate_matchcode("APPLE-RED").is_ok());
/// assert!(validate_matchcode("").is_err());
/// assert!(validate_matchcode(&"A".repeat(36)).is_err());
/// ```
pub fn validate_matchcode(matchcode: &str) -> ValidationResult<()> {
    validate_required("matchcode", matchcode, MAX_MATCHCODE)
}

/// Validates the free text of a line item.
pub fn validate_note(note: &str) -> ValidationResult<()> {
    validate_length("note", note, MAX_NOTE)
}

/// Validates every field of a customer address against its column length.
pub fn validate_address(address: &CustomerAddress) -> ValidationResult<()> {
    let fields = [
        ("salutation", &address.salutation, MAX_TEXT),
        ("company", &address.company, MAX_TEXT),
        ("name", &address.name, MAX_TEXT),
        ("first_name", &address.first_name, MAX_TEXT),
        ("supplement", &address.supplement, MAX_TEXT),
        ("street", &address.street, MAX_TEXT),
        ("house_number", &address.house_number, MAX_TEXT),
        ("city", &address.city, MAX_TEXT),
        ("postal_code", &address.postal_code, MAX_TEXT),
        ("country", &address.country, MAX_TEXT),
        ("phone1", &address.phone1, MAX_PHONE),
        ("phone2", &address.phone2, MAX_PHONE),
        ("email", &address.email, MAX_TEXT),
        ("web", &address.web, MAX_TEXT),
    ];

    for (field, value, max) in fields {
        if let Some(value) = value {
            validate_length(field, value, max)?;
        }
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an ordered quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Price groups are numbered from 1.
pub fn validate_price_group(group: i64) -> ValidationResult<()> {
    if group < 1 {
        return Err(ValidationError::MustBePositive {
            field: "price_group".to_string(),
        });
    }
    Ok(())
}

/// Quantity tiers are numbered from 1.
pub fn validate_quantity_tier(tier: i64) -> ValidationResult<()> {
    if tier < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity_tier".to_string(),
        });
    }
    Ok(())
}

/// A discount percentage between 0 and 100.
pub fn validate_discount_percent(percent: f64) -> ValidationResult<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// ISO 4217 numeric codes have three digits.
pub fn validate_currency(code: i64) -> ValidationResult<()> {
    if !(1..=999).contains(&code) {
        return Err(ValidationError::OutOfRange {
            field: "currency".to_string(),
            min: 1,
            max: 999,
        });
    }
    Ok(())
}

/// Validates a price in cents (zero allowed for free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a customer before insertion.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_matchcode(&customer.matchcode)?;
    validate_address(&customer.address)?;
    if let Some(note) = &customer.note {
        validate_length("note", note, MAX_TEXT)?;
    }
    Ok(())
}

/// Validates a product before insertion.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    if product.number < 1 {
        return Err(ValidationError::MustBePositive {
            field: "product_number".to_string(),
        });
    }
    validate_matchcode(&product.matchcode)?;
    validate_required("name", &product.name, MAX_TEXT)?;
    validate_length("description", &product.description, MAX_TEXT)?;
    validate_required("unit", &product.unit, MAX_UNIT)?;
    validate_price_cents(product.list_price.cents())?;

    if !product.unit_weight_kg.is_finite() || product.unit_weight_kg < 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "unit_weight".to_string(),
            reason: product.unit_weight_kg.to_string(),
        });
    }
    Ok(())
}

/// Validates one requested line.
pub fn validate_order_line(line: &NewOrderLine) -> ValidationResult<()> {
    validate_quantity(line.quantity)?;
    validate_note(&line.note)
}

/// Validates an order request: line count, every line and the price group.
///
/// An order without lines is allowed and gets zero totals.
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    if order.lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 0,
            max: MAX_ORDER_LINES as i64,
        });
    }

    if let Some(group) = order.price_group {
        validate_price_group(group)?;
    }

    if let Some(method) = &order.delivery_method {
        validate_length("delivery_method", method, 200)?;
    }

    if let Some(percent) = order.discount_percent {
        validate_discount_percent(percent)?;
    }

    if let Some(code) = order.currency {
        validate_currency(code)?;
    }

    if let Some(method) = order.payment_method {
        if method < 0 {
            return Err(ValidationError::OutOfRange {
                field: "payment_method".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    order.lines.iter().try_for_each(validate_order_line)
}

// =============================================================================
// Unit Tests
// =============================================================================
