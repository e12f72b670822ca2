//! Configuration management for the Gold Bar Inventory Engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with GOLD_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Pricing defaults used to pre-fill settlement inputs
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Currency label for invoices and reports
    pub currency: String,

    /// Default margin percent suggested when closing bars
    pub default_margin_percent: Decimal,

    /// Default spread added to the base price to suggest the reference
    /// cost price (EUR per gram)
    pub reference_cost_spread: Decimal,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let environment =
            std::env::var("GOLD_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("pricing.currency", "EUR")?
            .set_default("pricing.default_margin_percent", 6.0)?
            .set_default("pricing.reference_cost_spread", 0.25)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GOLD_ prefix)
            .add_source(
                Environment::with_prefix("GOLD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            default_margin_percent: Decimal::from(6),
            reference_cost_spread: Decimal::new(25, 2),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            pricing: PricingConfig::default(),
        }
    }
}
