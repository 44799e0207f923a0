use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::domain::models::types::Price;
use crate::workload::PriceDistribution;

const NOTIFICATION_CAPACITY: &str = "MATCHER_NOTIFICATION_CAPACITY";
const ORDER_COUNT: &str = "MATCHER_ORDER_COUNT";
const PRICE_LOW: &str = "MATCHER_PRICE_LOW";
const PRICE_HIGH: &str = "MATCHER_PRICE_HIGH";
const DISTRIBUTION: &str = "MATCHER_DISTRIBUTION";
const SEED: &str = "MATCHER_SEED";
const LOG_LEVEL: &str = "MATCHER_LOG_LEVEL";

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse environment variable {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("notification capacity must be greater than zero")]
    ZeroCapacity,

    #[error("price range is empty (low {low}, high {high})")]
    InvalidPriceRange { low: Price, high: Price },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Slots in the notification ring handed to the engine.
    pub notification_capacity: usize,
    /// Orders generated per side by the perf runner.
    pub order_count: usize,
    pub price_low: Price,
    pub price_high: Price,
    pub distribution: PriceDistribution,
    pub seed: u64,
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            notification_capacity: 2,
            order_count: 1_000_000,
            price_low: 1_000,
            price_high: 1_500,
            distribution: PriceDistribution::Flat,
            seed: 1,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from the environment (and a `.env` file if present),
    /// falling back to defaults for unset variables.
    pub fn try_from_env() -> Result<Config, ConfigError> {
        dotenv().ok();
        let defaults = Config::default();

        let distribution = match env::var(DISTRIBUTION) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "flat" => PriceDistribution::Flat,
                "pyramid" => PriceDistribution::Pyramid,
                _ => return Err(ConfigError::Invalid { key: DISTRIBUTION, value }),
            },
            Err(_) => defaults.distribution,
        };

        let config = Config {
            notification_capacity: parse_var(NOTIFICATION_CAPACITY, defaults.notification_capacity)?,
            order_count: parse_var(ORDER_COUNT, defaults.order_count)?,
            price_low: parse_var(PRICE_LOW, defaults.price_low)?,
            price_high: parse_var(PRICE_HIGH, defaults.price_high)?,
            distribution,
            seed: parse_var(SEED, defaults.seed)?,
            log_level: env::var(LOG_LEVEL).unwrap_or(defaults.log_level),
        };
        config.validate()?;

        info!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Checks cross-field constraints. Called again after CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.price_high <= self.price_low {
            return Err(ConfigError::InvalidPriceRange {
                low: self.price_low,
                high: self.price_high,
            });
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
