//! Application configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                        | Default          |
//! |---------------------------------|------------------|
//! | `ORDERDESK_DATABASE_PATH`       | `orderdesk.db`   |
//! | `ORDERDESK_MAX_CONNECTIONS`     | `5`              |
//! | `ORDERDESK_TAX_RATE`            | `0.19`           |
//! | `ORDERDESK_QUANTITY_TIER`       | `1`              |
//! | `ORDERDESK_PRICE_GROUP`         | `1`              |
//! | `ORDERDESK_ALLOCATION_ATTEMPTS` | `3`              |
//! | `ORDERDESK_SYSTEM_USER`         | `ORDERDESK`      |

use orderdesk_core::validation::{validate_price_group, validate_quantity_tier};
use orderdesk_core::{OrderConfig, TaxRate};
use std::env;
use std::str::FromStr;

use crate::pool::DbConfig;

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "orderdesk.db";

/// Database and order workflow settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub order: OrderConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut db = DbConfig::new(
            lookup("ORDERDESK_DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
        );
        if let Some(max) = parse::<u32>(&lookup, "ORDERDESK_MAX_CONNECTIONS")? {
            if max == 0 {
                return Err(ConfigError::InvalidValue("ORDERDESK_MAX_CONNECTIONS".to_string()));
            }
            db = db.max_connections(max);
        }

        let mut order = OrderConfig::default();

        if let Some(rate) = parse::<f64>(&lookup, "ORDERDESK_TAX_RATE")? {
            let rate = TaxRate::try_from(rate)
                .map_err(|_| ConfigError::InvalidValue("ORDERDESK_TAX_RATE".to_string()))?;
            order = order.tax_rate(rate);
        }

        if let Some(tier) = parse::<i64>(&lookup, "ORDERDESK_QUANTITY_TIER")? {
            validate_quantity_tier(tier)
                .map_err(|_| ConfigError::InvalidValue("ORDERDESK_QUANTITY_TIER".to_string()))?;
            order = order.quantity_tier(tier);
        }

        if let Some(group) = parse::<i64>(&lookup, "ORDERDESK_PRICE_GROUP")? {
            validate_price_group(group)
                .map_err(|_| ConfigError::InvalidValue("ORDERDESK_PRICE_GROUP".to_string()))?;
            order = order.price_group(group);
        }

        if let Some(attempts) = parse::<u32>(&lookup, "ORDERDESK_ALLOCATION_ATTEMPTS")? {
            order = order.allocation_attempts(attempts);
        }

        if let Some(user) = lookup("ORDERDESK_SYSTEM_USER") {
            if user.trim().is_empty() {
                return Err(ConfigError::InvalidValue("ORDERDESK_SYSTEM_USER".to_string()));
            }
            order = order.system_user(user);
        }

        Ok(AppConfig { db, order })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.order, OrderConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ORDERDESK_DATABASE_PATH", "/tmp/shop.db"),
            ("ORDERDESK_MAX_CONNECTIONS", "8"),
            ("ORDERDESK_TAX_RATE", "0.07"),
            ("ORDERDESK_QUANTITY_TIER", "10"),
            ("ORDERDESK_PRICE_GROUP", "2"),
            ("ORDERDESK_ALLOCATION_ATTEMPTS", "5"),
            ("ORDERDESK_SYSTEM_USER", "SHOP"),
        ]))
        .unwrap();

        assert_eq!(config.db.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.db.max_connections, 8);
        assert_eq!(config.order.default_tax_rate.bps(), 700);
        assert_eq!(config.order.quantity_tier, 10);
        assert_eq!(config.order.price_group, 2);
        assert_eq!(config.order.allocation_attempts, 5);
        assert_eq!(config.order.system_user, "SHOP");
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        for (key, value) in [
            ("ORDERDESK_MAX_CONNECTIONS", "many"),
            ("ORDERDESK_MAX_CONNECTIONS", "0"),
            ("ORDERDESK_TAX_RATE", "19%"),
            ("ORDERDESK_TAX_RATE", "1.5"),
            ("ORDERDESK_QUANTITY_TIER", "0"),
            ("ORDERDESK_SYSTEM_USER", "  "),
        ] {
            let err = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid value for {key}"));
        }
    }
}
