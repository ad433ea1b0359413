//! # Errors
//!
//! ```text
//! CoreError
//! ├── NotFound        price row, product, customer, order
//! ├── IdentifiersExhausted  highest identifier is already i64::MAX
//! ├── InvalidAmount   stored float that is NaN, infinite or out of range
//! └── Validation(ValidationError)
//!
//! kind() ──► ErrorKind { NotFound, Conflict, Validation, Persistence }
//! ```
//!
//! `Persistence` is only produced by orderdesk-db. Messages carry the
//! offending key, e.g. `Price not found: product 17, group 1, tier 1`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse error category an embedding application can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced record (price row, product, customer, order) is missing.
    NotFound,
    /// Identifier collision or business-key uniqueness violation.
    Conflict,
    /// Input did not satisfy a business rule.
    Validation,
    /// The store is unavailable or a transaction aborted.
    Persistence,
}

// =============================================================================
// Core Error
// =============================================================================

/// Failures that need no database to detect.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// "max + 1" has no successor.
    #[error("No identifier left after {highest}")]
    IdentifiersExhausted { highest: i64 },

    /// A stored amount cannot be represented as money or weight
    /// (NaN, infinity, or out of range).
    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    pub fn invalid_amount(field: impl Into<String>, value: impl ToString) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::IdentifiersExhausted { .. } => ErrorKind::Conflict,
            CoreError::InvalidAmount { .. } | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected request input. Raised before any row is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long for its legacy column.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// e.g. a tax rate with more than two decimal places in percent.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Price", "product 17, group 1, tier 1");
        assert_eq!(err.to_string(), "Price not found: product 17, group 1, tier 1");

        let err = CoreError::IdentifiersExhausted { highest: i64::MAX };
        assert_eq!(err.to_string(), "No identifier left after 9223372036854775807");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::not_found("Product", 1).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::invalid_amount("price", f64::NAN).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ErrorKind::NotFound).unwrap(), "\"not_found\"");
        assert_eq!(serde_json::to_string(&ErrorKind::Persistence).unwrap(), "\"persistence\"");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
