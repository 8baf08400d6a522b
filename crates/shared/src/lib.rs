//! Shared types, errors, and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Validated ISO 4217 currency codes
//! - Money types with decimal precision
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ConversionConfig, LoggingConfig};
pub use error::{AppError, AppResult};
pub use types::{CurrencyCode, CurrencyCodeError, Money};
