//! Currency conversion through a single quoting base.
//!
//! Every rate in a [`RateIndex`] is quoted from the base currency, so:
//! - base -> X multiplies by X's rate
//! - X -> base divides by X's rate
//! - X -> Y divides by X's rate, then multiplies by Y's rate
//!
//! The operation order is fixed; reordering changes rounding.
//!
//! Missing rates never produce an error. The original amount is returned
//! unchanged, flagged as degraded, and reported to the observer.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::{ConversionConfig, CurrencyCode, Money};
use thiserror::Error;

use super::index::RateIndex;
use super::lookup::{find_nearest_rate, ResolvedRate};
use super::observer::{ConversionEvent, ConversionObserver, TracingObserver};

/// Caller contract violations. Missing data is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The index is quoted from a different base than the converter.
    #[error("Rate index is quoted from {index}, converter expects {expected}")]
    BaseCurrencyMismatch {
        /// Converter's base currency.
        expected: CurrencyCode,
        /// Index's base currency.
        index: CurrencyCode,
    },

    /// Decimal arithmetic overflowed.
    #[error("Arithmetic overflow converting {amount} {source_currency} to {target_currency}")]
    Overflow {
        /// Amount being converted.
        amount: Decimal,
        /// Source currency.
        source_currency: CurrencyCode,
        /// Target currency.
        target_currency: CurrencyCode,
    },
}

/// Which formula a conversion used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPath {
    /// Source and target are the same currency.
    Identity,
    /// Source is the base currency.
    FromBase,
    /// Target is the base currency.
    ToBase,
    /// Neither side is the base currency.
    Triangulated,
}

/// A converted amount with full rate provenance.
///
/// Triangulated conversions resolve each leg independently, so the two legs
/// may have used rates from different dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// Converted amount, or the original amount when degraded.
    pub amount: Decimal,
    /// Amount before conversion.
    pub original_amount: Decimal,
    /// Source currency.
    pub source: CurrencyCode,
    /// Target currency.
    pub target: CurrencyCode,
    /// Requested conversion date.
    pub date: NaiveDate,
    /// Formula used.
    pub path: ConversionPath,
    /// Rate used for the source currency (`ToBase`, `Triangulated`).
    pub source_leg: Option<ResolvedRate>,
    /// Rate used for the target currency (`FromBase`, `Triangulated`).
    pub target_leg: Option<ResolvedRate>,
    /// True when a required rate was missing and `amount` is unconverted.
    pub degraded: bool,
}

impl Conversion {
    fn identity(amount: Decimal, currency: &CurrencyCode, date: NaiveDate) -> Self {
        Self {
            amount,
            original_amount: amount,
            source: currency.clone(),
            target: currency.clone(),
            date,
            path: ConversionPath::Identity,
            source_leg: None,
            target_leg: None,
            degraded: false,
        }
    }

    /// Returns true if any resolved leg used a rate from another date.
    #[must_use]
    pub fn used_fallback_rate(&self) -> bool {
        self.legs().any(ResolvedRate::is_fallback)
    }

    /// Resolved legs, source first.
    pub fn legs(&self) -> impl Iterator<Item = &ResolvedRate> {
        self.source_leg.iter().chain(self.target_leg.iter())
    }

    /// Currency `amount` is actually denominated in.
    #[must_use]
    pub const fn amount_currency(&self) -> &CurrencyCode {
        if self.degraded {
            &self.source
        } else {
            &self.target
        }
    }
}

/// Converts amounts between currencies using a [`RateIndex`].
#[derive(Clone)]
pub struct CurrencyConverter {
    base_currency: CurrencyCode,
    earliest_supported_date: NaiveDate,
    observer: Arc<dyn ConversionObserver>,
}

impl fmt::Debug for CurrencyConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyConverter")
            .field("base_currency", &self.base_currency)
            .field("earliest_supported_date", &self.earliest_supported_date)
            .finish_non_exhaustive()
    }
}

impl CurrencyConverter {
    /// Creates a converter that logs through `tracing`, with the default
    /// earliest supported date.
    #[must_use]
    pub fn new(base_currency: CurrencyCode) -> Self {
        let defaults = ConversionConfig::default();
        Self {
            base_currency,
            earliest_supported_date: defaults.earliest_supported_date,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Creates a converter from configuration.
    #[must_use]
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.base_currency.clone())
            .with_earliest_supported_date(config.earliest_supported_date)
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ConversionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the date before which requests are reported as out of range.
    #[must_use]
    pub const fn with_earliest_supported_date(mut self, date: NaiveDate) -> Self {
        self.earliest_supported_date = date;
        self
    }

    /// Base currency all rates must be quoted from.
    #[must_use]
    pub const fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    /// Converts `amount` from `source` to `target` as of `date`.
    ///
    /// Returns `amount` unchanged when `source == target`, or when a required
    /// rate cannot be resolved (see [`Self::convert_detailed`] for the
    /// provenance).
    ///
    /// # Errors
    ///
    /// Returns an error if the index is quoted from a different base, or the
    /// arithmetic overflows.
    pub fn convert(
        &self,
        amount: Decimal,
        date: NaiveDate,
        source: &CurrencyCode,
        target: &CurrencyCode,
        index: &RateIndex,
    ) -> Result<Decimal, ConversionError> {
        self.convert_detailed(amount, date, source, target, index)
            .map(|conversion| conversion.amount)
    }

    /// Converts `amount` and reports which rates were used.
    ///
    /// # Errors
    ///
    /// Same as [`Self::convert`].
    pub fn convert_detailed(
        &self,
        amount: Decimal,
        date: NaiveDate,
        source: &CurrencyCode,
        target: &CurrencyCode,
        index: &RateIndex,
    ) -> Result<Conversion, ConversionError> {
        if source == target {
            return Ok(Conversion::identity(amount, source, date));
        }

        if let Some(index_base) = index.base_currency() {
            if *index_base != self.base_currency {
                return Err(ConversionError::BaseCurrencyMismatch {
                    expected: self.base_currency.clone(),
                    index: index_base.clone(),
                });
            }
        }

        if date < self.earliest_supported_date {
            self.observer.on_event(&ConversionEvent::BeforeSupportedRange {
                requested: date,
                floor: self.earliest_supported_date,
            });
        }

        let observer = self.observer.as_ref();
        let (path, source_leg, target_leg) = if *source == self.base_currency {
            let target_leg = find_nearest_rate(date, target, index, observer);
            (ConversionPath::FromBase, None, target_leg)
        } else if *target == self.base_currency {
            let source_leg = find_nearest_rate(date, source, index, observer);
            (ConversionPath::ToBase, source_leg, None)
        } else {
            let source_leg = find_nearest_rate(date, source, index, observer);
            let target_leg = find_nearest_rate(date, target, index, observer);
            (ConversionPath::Triangulated, source_leg, target_leg)
        };

        let converted = match path {
            ConversionPath::FromBase => target_leg.as_ref().map(|t| amount.checked_mul(t.rate)),
            ConversionPath::ToBase => source_leg.as_ref().map(|s| amount.checked_div(s.rate)),
            ConversionPath::Triangulated => match (&source_leg, &target_leg) {
                (Some(s), Some(t)) => Some(
                    amount
                        .checked_div(s.rate)
                        .and_then(|in_base| in_base.checked_mul(t.rate)),
                ),
                _ => None,
            },
            ConversionPath::Identity => Some(Some(amount)),
        };

        let (converted_amount, degraded) = match converted {
            Some(Some(value)) => (value, false),
            Some(None) => {
                return Err(ConversionError::Overflow {
                    amount,
                    source_currency: source.clone(),
                    target_currency: target.clone(),
                });
            }
            None => {
                self.observer.on_event(&ConversionEvent::Degraded {
                    source: source.clone(),
                    target: target.clone(),
                    date,
                    amount,
                });
                (amount, true)
            }
        };

        Ok(Conversion {
            amount: converted_amount,
            original_amount: amount,
            source: source.clone(),
            target: target.clone(),
            date,
            path,
            source_leg,
            target_leg,
            degraded,
        })
    }

    /// Converts `money` into `target` as of `date`.
    ///
    /// A degraded conversion keeps the original currency, so the result is
    /// never labelled with a currency it is not denominated in.
    ///
    /// # Errors
    ///
    /// Same as [`Self::convert`].
    pub fn convert_money(
        &self,
        money: &Money,
        date: NaiveDate,
        target: &CurrencyCode,
        index: &RateIndex,
    ) -> Result<Money, ConversionError> {
        let conversion = self.convert_detailed(money.amount, date, &money.currency, target, index)?;
        Ok(Money::new(
            conversion.amount,
            conversion.amount_currency().clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::exchange::ExchangeRate;
    use crate::currency::lookup::RateResolution;
    use crate::currency::observer::testing::RecordingObserver;
    use crate::currency::observer::NoopObserver;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn usd_rate(target: &str, on: NaiveDate, rate: Decimal) -> ExchangeRate {
        ExchangeRate::new(CurrencyCode::usd(), code(target), on, rate)
    }

    fn quiet() -> CurrencyConverter {
        CurrencyConverter::new(CurrencyCode::usd()).with_observer(Arc::new(NoopObserver))
    }

    fn recording() -> (CurrencyConverter, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let converter = CurrencyConverter::new(CurrencyCode::usd()).with_observer(observer.clone());
        (converter, observer)
    }

    fn single_day_index() -> RateIndex {
        RateIndex::build(vec![
            usd_rate("THB", date(2025, 10, 10), dec!(33.5)),
            usd_rate("JPY", date(2025, 10, 10), dec!(150)),
        ])
        .unwrap()
    }

    #[test]
    fn test_identity_skips_lookup() {
        let (converter, observer) = recording();
        let thb = code("THB");

        let result = converter
            .convert_detailed(dec!(42.5), date(1990, 1, 1), &thb, &thb, &RateIndex::empty())
            .unwrap();

        assert_eq!(result.amount, dec!(42.5));
        assert_eq!(result.path, ConversionPath::Identity);
        assert!(result.legs().next().is_none());
        assert!(!result.degraded);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_identity_ignores_foreign_base_index() {
        let eur_index = RateIndex::build(vec![ExchangeRate::new(
            code("EUR"),
            code("THB"),
            date(2025, 10, 10),
            dec!(38.9),
        )])
        .unwrap();
        let thb = code("THB");

        let result = quiet().convert(dec!(7), date(2025, 10, 10), &thb, &thb, &eur_index);
        assert_eq!(result, Ok(dec!(7)));
    }

    #[test]
    fn test_from_base_exact_match() {
        let result = quiet()
            .convert_detailed(
                dec!(100),
                date(2025, 10, 10),
                &CurrencyCode::usd(),
                &code("THB"),
                &single_day_index(),
            )
            .unwrap();

        assert_eq!(result.amount, dec!(3350));
        assert_eq!(result.path, ConversionPath::FromBase);
        assert!(result.source_leg.is_none());
        assert_eq!(
            result.target_leg.as_ref().unwrap().resolution,
            RateResolution::Exact
        );
        assert!(!result.used_fallback_rate());
        assert_eq!(result.amount_currency(), &code("THB"));
    }

    #[test]
    fn test_to_base_divides() {
        let result = quiet()
            .convert_detailed(
                dec!(3350),
                date(2025, 10, 10),
                &code("THB"),
                &CurrencyCode::usd(),
                &single_day_index(),
            )
            .unwrap();

        assert_eq!(result.amount, dec!(100));
        assert_eq!(result.path, ConversionPath::ToBase);
        assert!(result.target_leg.is_none());
        assert_eq!(result.source_leg.as_ref().unwrap().rate, dec!(33.5));
    }

    #[test]
    fn test_triangulation_through_base() {
        let result = quiet()
            .convert_detailed(
                dec!(335),
                date(2025, 10, 10),
                &code("THB"),
                &code("JPY"),
                &single_day_index(),
            )
            .unwrap();

        assert_eq!(result.amount, dec!(1500));
        assert_eq!(result.path, ConversionPath::Triangulated);
        assert_eq!(result.source_leg.as_ref().unwrap().rate, dec!(33.5));
        assert_eq!(result.target_leg.as_ref().unwrap().rate, dec!(150));
    }

    #[test]
    fn test_future_date_uses_latest_rate() {
        let index = RateIndex::build(vec![
            usd_rate("THB", date(2025, 10, 10), dec!(33.5)),
            usd_rate("THB", date(2025, 10, 14), dec!(33.51)),
        ])
        .unwrap();
        let (converter, observer) = recording();

        let result = converter
            .convert_detailed(
                dec!(100),
                date(2025, 12, 1),
                &CurrencyCode::usd(),
                &code("THB"),
                &index,
            )
            .unwrap();

        assert_eq!(result.amount, dec!(3351));
        assert!(result.used_fallback_rate());
        assert_eq!(
            result.target_leg.as_ref().unwrap().rate_date,
            date(2025, 10, 14)
        );
        assert_eq!(
            observer.events(),
            vec![ConversionEvent::ClampedToLatest {
                currency: code("THB"),
                requested: date(2025, 12, 1),
                used: date(2025, 10, 14),
            }]
        );
    }

    #[test]
    fn test_pre_history_date_is_flagged_separately() {
        let (converter, observer) = recording();

        let result = converter
            .convert_detailed(
                dec!(100),
                date(1999, 6, 30),
                &CurrencyCode::usd(),
                &code("THB"),
                &single_day_index(),
            )
            .unwrap();

        assert_eq!(result.amount, dec!(3350));
        assert_eq!(
            result.target_leg.as_ref().unwrap().resolution,
            RateResolution::ClampedToEarliest
        );
        assert_eq!(
            observer.events(),
            vec![
                ConversionEvent::BeforeSupportedRange {
                    requested: date(1999, 6, 30),
                    floor: date(2000, 1, 1),
                },
                ConversionEvent::ClampedToEarliest {
                    currency: code("THB"),
                    requested: date(1999, 6, 30),
                    used: date(2025, 10, 10),
                },
            ]
        );
    }

    #[test]
    fn test_empty_index_degrades_to_original_amount() {
        let (converter, observer) = recording();

        let result = converter
            .convert_detailed(
                dec!(100),
                date(2025, 1, 1),
                &CurrencyCode::usd(),
                &code("THB"),
                &RateIndex::empty(),
            )
            .unwrap();

        assert_eq!(result.amount, dec!(100));
        assert!(result.degraded);
        assert_eq!(result.amount_currency(), &CurrencyCode::usd());
        assert_eq!(
            observer.events(),
            vec![
                ConversionEvent::RateUnavailable {
                    currency: code("THB"),
                    requested: date(2025, 1, 1),
                },
                ConversionEvent::Degraded {
                    source: CurrencyCode::usd(),
                    target: code("THB"),
                    date: date(2025, 1, 1),
                    amount: dec!(100),
                },
            ]
        );
    }

    #[test]
    fn test_triangulation_degrades_when_one_leg_missing() {
        let result = quiet()
            .convert_detailed(
                dec!(335),
                date(2025, 10, 10),
                &code("THB"),
                &code("EUR"),
                &single_day_index(),
            )
            .unwrap();

        assert_eq!(result.amount, dec!(335));
        assert!(result.degraded);
        assert!(result.source_leg.is_some());
        assert!(result.target_leg.is_none());
    }

    #[test]
    fn test_triangulation_legs_can_fall_back_to_different_dates() {
        // THB has a rate on the 12th; JPY does not and falls back to the 10th.
        let index = RateIndex::build(vec![
            usd_rate("THB", date(2025, 10, 10), dec!(33.5)),
            usd_rate("JPY", date(2025, 10, 10), dec!(150)),
            usd_rate("THB", date(2025, 10, 12), dec!(33.6)),
            usd_rate("THB", date(2025, 10, 14), dec!(33.7)),
            usd_rate("JPY", date(2025, 10, 14), dec!(151)),
        ])
        .unwrap();

        let result = quiet()
            .convert_detailed(
                dec!(336),
                date(2025, 10, 12),
                &code("THB"),
                &code("JPY"),
                &index,
            )
            .unwrap();

        let source_leg = result.source_leg.as_ref().unwrap();
        let target_leg = result.target_leg.as_ref().unwrap();
        assert_eq!(source_leg.rate_date, date(2025, 10, 12));
        assert_eq!(source_leg.resolution, RateResolution::Exact);
        assert_eq!(target_leg.rate_date, date(2025, 10, 10));
        assert_eq!(target_leg.resolution, RateResolution::GapFallback);
        assert!(result.used_fallback_rate());
        assert_eq!(result.amount, dec!(1500));
    }

    #[test]
    fn test_foreign_base_index_is_rejected() {
        let eur_index = RateIndex::build(vec![ExchangeRate::new(
            code("EUR"),
            code("THB"),
            date(2025, 10, 10),
            dec!(38.9),
        )])
        .unwrap();

        let result = quiet().convert(
            dec!(100),
            date(2025, 10, 10),
            &CurrencyCode::usd(),
            &code("THB"),
            &eur_index,
        );

        assert_eq!(
            result,
            Err(ConversionError::BaseCurrencyMismatch {
                expected: CurrencyCode::usd(),
                index: code("EUR"),
            })
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let index = RateIndex::build(vec![usd_rate("THB", date(2025, 10, 10), dec!(1000))]).unwrap();

        let result = quiet().convert(
            Decimal::MAX,
            date(2025, 10, 10),
            &CurrencyCode::usd(),
            &code("THB"),
            &index,
        );

        assert!(matches!(result, Err(ConversionError::Overflow { .. })));
    }

    #[test]
    fn test_end_to_end_gap_scenario() {
        let index = RateIndex::build(vec![
            usd_rate("THB", date(2025, 10, 10), dec!(33.5)),
            usd_rate("THB", date(2025, 10, 11), dec!(33.48)),
            usd_rate("THB", date(2025, 10, 13), dec!(33.52)),
        ])
        .unwrap();
        let (converter, observer) = recording();
        let usd = CurrencyCode::usd();
        let thb = code("THB");

        let exact = converter
            .convert(dec!(-52.34), date(2025, 10, 10), &usd, &thb, &index)
            .unwrap();
        assert_eq!(exact, dec!(-1753.39));
        assert!(observer.events().is_empty());

        let gap = converter
            .convert_detailed(dec!(-52.34), date(2025, 10, 12), &usd, &thb, &index)
            .unwrap();
        assert_eq!(gap.amount, dec!(-1753.39));
        assert_eq!(
            gap.target_leg.as_ref().unwrap().resolution,
            RateResolution::GapFallback
        );
        assert_eq!(
            observer.events(),
            vec![ConversionEvent::GapInSeries {
                currency: thb,
                requested: date(2025, 10, 12),
                used: date(2025, 10, 10),
            }]
        );
    }

    #[test]
    fn test_convert_money_keeps_source_currency_when_degraded() {
        let money = Money::new(dec!(100), CurrencyCode::usd());

        let converted = quiet()
            .convert_money(&money, date(2025, 10, 10), &code("THB"), &single_day_index())
            .unwrap();
        assert_eq!(converted, Money::new(dec!(3350), code("THB")));

        let degraded = quiet()
            .convert_money(&money, date(2025, 10, 10), &code("EUR"), &single_day_index())
            .unwrap();
        assert_eq!(degraded, money);
    }

    #[test]
    fn test_from_config() {
        let config = ConversionConfig {
            base_currency: code("EUR"),
            earliest_supported_date: date(2010, 1, 1),
            display_decimal_places: 2,
        };
        let converter = CurrencyConverter::from_config(&config);
        assert_eq!(converter.base_currency(), &code("EUR"));
    }
}
