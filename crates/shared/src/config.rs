//! Application configuration management.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::types::CurrencyCode;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Currency conversion configuration.
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Currency conversion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    /// Currency every stored rate is quoted from. Must match the rate provider.
    #[serde(default = "default_base_currency")]
    pub base_currency: CurrencyCode,
    /// Earliest date callers are expected to convert at.
    #[serde(default = "default_earliest_supported_date")]
    pub earliest_supported_date: NaiveDate,
    /// Decimal places used when rounding amounts for display.
    #[serde(default = "default_display_decimal_places")]
    pub display_decimal_places: u32,
}

fn default_base_currency() -> CurrencyCode {
    CurrencyCode::usd()
}

fn default_earliest_supported_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_display_decimal_places() -> u32 {
    2
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            earliest_supported_date: default_earliest_supported_date(),
            display_decimal_places: default_display_decimal_places(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "tally=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_file(None)
    }

    /// Loads configuration, layering an explicit file over the defaults.
    ///
    /// Precedence, lowest first: `config/default`, `config/{RUN_MODE}`, the
    /// explicit file, then `TALLY__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any source is
    /// malformed.
    pub fn load_with_file(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
