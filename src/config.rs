use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::db::{DEFAULT_ORDER_LIMIT, DEFAULT_RETENTION_DAYS};
use crate::error::{FncmError, Result};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub orders: OrdersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub to_file: bool,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    pub list_limit: usize,
    pub retention_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "data.db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                to_file: true,
                format: "text".to_string(),
            },
            orders: OrdersConfig {
                list_limit: DEFAULT_ORDER_LIMIT,
                retention_days: DEFAULT_RETENTION_DAYS,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence.
    ///
    /// Later sources win: built-in defaults, `config/default`, `config/local`,
    /// the explicit file if given, then `FNCM__*` environment variables
    /// (e.g. `FNCM__DATABASE__PATH`).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("database.path", defaults.database.path)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.directory", defaults.logging.directory)?
            .set_default("logging.to_file", defaults.logging.to_file)?
            .set_default("logging.format", defaults.logging.format)?
            .set_default("orders.list_limit", defaults.orders.list_limit as u64)?
            .set_default("orders.retention_days", u64::from(defaults.orders.retention_days))?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let app_config: Self = builder
            .add_source(Environment::with_prefix("FNCM").prefix_separator("__").separator("__"))
            .build()?
            .try_deserialize()?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(FncmError::Config("database.path cannot be empty".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(FncmError::Config(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(FncmError::Config(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        if self.logging.to_file && self.logging.directory.trim().is_empty() {
            return Err(FncmError::Config(
                "logging.directory cannot be empty when logging to file".to_string(),
            ));
        }

        if self.orders.list_limit == 0 {
            return Err(FncmError::Config("orders.list_limit must be greater than 0".to_string()));
        }

        if self.orders.retention_days == 0 {
            return Err(FncmError::Config(
                "orders.retention_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| FncmError::Config(e.to_string()))
    }
}
