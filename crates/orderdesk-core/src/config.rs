//! Order workflow configuration.

use serde::{Deserialize, Serialize};

use crate::types::TaxRate;
use crate::{DEFAULT_PRICE_GROUP, DEFAULT_QUANTITY_TIER, DEFAULT_SYSTEM_USER, DEFAULT_TAX_RATE_BPS};

/// Settings applied while building orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Tax rate for lines that do not carry their own.
    pub default_tax_rate: TaxRate,

    /// Quantity tier for every price lookup. Not derived from the ordered quantity.
    pub quantity_tier: i64,

    /// Price group for orders that do not name one.
    pub price_group: i64,

    /// How often a transaction is attempted before giving up on collisions.
    pub allocation_attempts: u32,

    /// Name written into the audit columns.
    pub system_user: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        OrderConfig {
            default_tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            quantity_tier: DEFAULT_QUANTITY_TIER,
            price_group: DEFAULT_PRICE_GROUP,
            allocation_attempts: 3,
            system_user: DEFAULT_SYSTEM_USER.to_string(),
        }
    }
}

impl OrderConfig {
    /// Sets the default tax rate.
    pub fn tax_rate(mut self, rate: TaxRate) -> Self {
        self.default_tax_rate = rate;
        self
    }

    /// Sets the quantity tier used for price lookups.
    pub fn quantity_tier(mut self, tier: i64) -> Self {
        self.quantity_tier = tier;
        self
    }

    /// Sets the fallback price group.
    pub fn price_group(mut self, group: i64) -> Self {
        self.price_group = group;
        self
    }

    /// Sets the number of attempts (at least 1).
    pub fn allocation_attempts(mut self, attempts: u32) -> Self {
        self.allocation_attempts = attempts.max(1);
        self
    }

    /// Sets the audit user name.
    pub fn system_user(mut self, user: impl Into<String>) -> Self {
        self.system_user = user.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrderConfig::default();
        assert_eq!(config.default_tax_rate.bps(), 1900);
        assert_eq!(config.quantity_tier, 1);
        assert_eq!(config.price_group, 1);
        assert_eq!(config.allocation_attempts, 3);
    }

    #[test]
    fn test_attempts_never_zero() {
        let config = OrderConfig::default().allocation_attempts(0);
        assert_eq!(config.allocation_attempts, 1);
    }
}
