//! Common types used across the application.

pub mod currency;
pub mod money;

pub use currency::{CurrencyCode, CurrencyCodeError};
pub use money::Money;
