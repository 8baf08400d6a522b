//! Core conversion logic for Tally.
//!
//! This crate contains pure conversion logic with ZERO file, network or
//! database dependencies. Rates and transactions are fetched by the caller
//! and passed in.
//!
//! # Modules
//!
//! - `currency` - Rate indexing, date fallback, and triangulated conversion
//! - `transaction` - Batch conversion of statement transactions

pub mod currency;
pub mod transaction;

pub use currency::{Conversion, CurrencyConverter, ExchangeRate, RateIndex};
pub use transaction::{ConversionSummary, Transaction, convert_transactions};
