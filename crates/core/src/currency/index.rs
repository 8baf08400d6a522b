//! Two-level rate index: date, then target currency.
//!
//! An index is built once per fetched rate set and never patched. The
//! earliest and latest dates are computed during the build and stored on the
//! index value, so they are invalidated simply by building a new index.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::CurrencyCode;
use thiserror::Error;
use tracing::debug;

use super::exchange::ExchangeRate;

/// Structural problems in a rate set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateIndexError {
    /// Rate must be positive.
    #[error("Exchange rate for {currency} on {date} must be positive, got {rate}")]
    NonPositiveRate {
        /// Target currency of the offending record.
        currency: CurrencyCode,
        /// Date of the offending record.
        date: NaiveDate,
        /// The rate supplied.
        rate: Decimal,
    },

    /// All records in one index must share a quoting base.
    #[error("Rate set mixes base currencies: expected {expected}, found {found} on {date}")]
    MixedBaseCurrency {
        /// Base currency of the first record.
        expected: CurrencyCode,
        /// Base currency of the offending record.
        found: CurrencyCode,
        /// Date of the offending record.
        date: NaiveDate,
    },
}

/// Earliest and latest dates present in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    /// Earliest date with at least one rate.
    pub earliest: NaiveDate,
    /// Latest date with at least one rate.
    pub latest: NaiveDate,
}

impl DateBounds {
    fn include(self, date: NaiveDate) -> Self {
        Self {
            earliest: self.earliest.min(date),
            latest: self.latest.max(date),
        }
    }

    /// Returns true if `date` lies within `[earliest, latest]`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.earliest <= date && date <= self.latest
    }
}

/// Rates keyed by date, then by target currency.
#[derive(Debug, Clone, Default)]
pub struct RateIndex {
    by_date: HashMap<NaiveDate, HashMap<CurrencyCode, ExchangeRate>>,
    bounds: Option<DateBounds>,
    base_currency: Option<CurrencyCode>,
}

impl RateIndex {
    /// Builds an index from rates in any order.
    ///
    /// Duplicate `(date, target_currency)` pairs are allowed; the last one
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a rate is not positive or the records are quoted
    /// from more than one base currency.
    pub fn build<I>(rates: I) -> Result<Self, RateIndexError>
    where
        I: IntoIterator<Item = ExchangeRate>,
    {
        let mut builder = RateIndexBuilder::new();
        builder.extend(rates)?;
        Ok(builder.finish())
    }

    /// Creates an empty index.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the index holds no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Number of rates held after de-duplication.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_date.values().map(HashMap::len).sum()
    }

    /// Number of distinct dates.
    #[must_use]
    pub fn date_count(&self) -> usize {
        self.by_date.len()
    }

    /// Base currency every rate in the index is quoted from.
    #[must_use]
    pub fn base_currency(&self) -> Option<&CurrencyCode> {
        self.base_currency.as_ref()
    }

    /// Earliest and latest dates, or `None` for an empty index.
    #[must_use]
    pub const fn bounds(&self) -> Option<DateBounds> {
        self.bounds
    }

    /// Earliest date with a rate.
    #[must_use]
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.bounds.map(|b| b.earliest)
    }

    /// Latest date with a rate.
    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.bounds.map(|b| b.latest)
    }

    /// Exact lookup.
    #[must_use]
    pub fn get(&self, date: NaiveDate, currency: &CurrencyCode) -> Option<&ExchangeRate> {
        self.by_date.get(&date).and_then(|rates| rates.get(currency))
    }

    /// All dates, ascending.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.by_date.keys().copied().collect();
        dates.sort_unstable();
        dates
    }

    /// All target currencies seen on any date.
    #[must_use]
    pub fn currencies(&self) -> BTreeSet<CurrencyCode> {
        self.by_date
            .values()
            .flat_map(HashMap::keys)
            .cloned()
            .collect()
    }
}

impl TryFrom<Vec<ExchangeRate>> for RateIndex {
    type Error = RateIndexError;

    fn try_from(rates: Vec<ExchangeRate>) -> Result<Self, Self::Error> {
        Self::build(rates)
    }
}

/// Incremental single-pass builder for [`RateIndex`].
#[derive(Debug, Default)]
pub struct RateIndexBuilder {
    index: RateIndex,
    duplicates: usize,
}

impl RateIndexBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one rate, overwriting any earlier rate for the same date and
    /// target currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is not positive or its base currency
    /// differs from earlier records.
    pub fn push(&mut self, rate: ExchangeRate) -> Result<&mut Self, RateIndexError> {
        if rate.rate <= Decimal::ZERO {
            return Err(RateIndexError::NonPositiveRate {
                currency: rate.target_currency,
                date: rate.date,
                rate: rate.rate,
            });
        }

        if let Some(expected) = &self.index.base_currency {
            if *expected != rate.base_currency {
                return Err(RateIndexError::MixedBaseCurrency {
                    expected: expected.clone(),
                    found: rate.base_currency,
                    date: rate.date,
                });
            }
        } else {
            self.index.base_currency = Some(rate.base_currency.clone());
        }

        let date = rate.date;
        self.index.bounds = Some(match self.index.bounds {
            Some(bounds) => bounds.include(date),
            None => DateBounds {
                earliest: date,
                latest: date,
            },
        });

        let replaced = self
            .index
            .by_date
            .entry(date)
            .or_default()
            .insert(rate.target_currency.clone(), rate);
        if let Some(previous) = replaced {
            self.duplicates += 1;
            debug!(
                currency = %previous.target_currency,
                %date,
                replaced_rate = %previous.rate,
                "Duplicate rate replaced"
            );
        }

        Ok(self)
    }

    /// Adds every rate from `rates`.
    ///
    /// # Errors
    ///
    /// Stops at the first structurally invalid record.
    pub fn extend<I>(&mut self, rates: I) -> Result<&mut Self, RateIndexError>
    where
        I: IntoIterator<Item = ExchangeRate>,
    {
        for rate in rates {
            self.push(rate)?;
        }
        Ok(self)
    }

    /// Finishes the build.
    #[must_use]
    pub fn finish(self) -> RateIndex {
        debug!(
            rates = self.index.len(),
            dates = self.index.date_count(),
            duplicates = self.duplicates,
            "Rate index built"
        );
        self.index
    }
}
