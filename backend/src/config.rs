//! Configuration management for the Resto Back-Office Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with RBO_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Reporting configuration
    pub reporting: ReportingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportingConfig {
    /// Target food cost percentage shown on the dashboard
    pub target_food_cost_percent: Decimal,

    /// COGS method feeding the P&L profit lines: "accrual" or "cash"
    pub cogs_method: String,

    /// When true, revenue denominators include service and local taxes
    pub include_taxes_in_revenue: bool,

    /// Storage write-off reasons excluded from KPI-oriented COGS
    pub excluded_storage_reasons: Vec<String>,

    /// Preparation write-off reasons excluded from KPI-oriented COGS
    pub excluded_preparation_reasons: Vec<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RBO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("reporting.target_food_cost_percent", "30")?
            .set_default("reporting.cogs_method", "accrual")?
            .set_default("reporting.include_taxes_in_revenue", false)?
            .set_default("reporting.excluded_storage_reasons", Vec::<String>::new())?
            .set_default(
                "reporting.excluded_preparation_reasons",
                Vec::<String>::new(),
            )?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RBO_ prefix)
            .add_source(
                Environment::with_prefix("RBO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
