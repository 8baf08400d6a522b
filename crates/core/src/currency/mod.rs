//! Multi-currency conversion over historical daily rates.

pub mod converter;
pub mod exchange;
pub mod index;
pub mod lookup;
pub mod observer;
pub mod rounding;

#[cfg(test)]
mod props;

pub use converter::{Conversion, ConversionError, ConversionPath, CurrencyConverter};
pub use exchange::ExchangeRate;
pub use index::{DateBounds, RateIndex, RateIndexBuilder, RateIndexError};
pub use lookup::{find_nearest_rate, RateResolution, ResolvedRate};
pub use observer::{ConversionEvent, ConversionObserver, NoopObserver, Severity, TracingObserver};
pub use rounding::round_for_display;
