//! Property-based tests for currency conversion.
//!
//! - Identity law
//! - Exact-rate formulas
//! - Round-trip stability
//! - Missing data never errors

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::CurrencyCode;

use super::converter::CurrencyConverter;
use super::exchange::ExchangeRate;
use super::index::RateIndex;
use super::observer::NoopObserver;

/// Strategy to generate signed amounts (-1,000,000.00 to 1,000,000.00).
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate dates from 1995 to roughly 2050.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..20_000).prop_map(|days| NaiveDate::from_ymd_opt(1995, 1, 1).unwrap() + Duration::days(days))
}

/// Strategy to pick a currency, base included.
fn any_currency() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(vec!["USD", "THB", "JPY", "EUR", "GBP"])
        .prop_map(|code| CurrencyCode::new(code).unwrap())
}

/// Strategy to generate a small USD-quoted rate set with arbitrary gaps.
fn usd_rate_set() -> impl Strategy<Value = Vec<ExchangeRate>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["THB", "JPY", "EUR"]),
            0i64..30,
            positive_rate(),
        ),
        0..20,
    )
    .prop_map(|rows| {
        let start = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        rows.into_iter()
            .map(|(target, offset, rate)| {
                ExchangeRate::new(
                    CurrencyCode::usd(),
                    CurrencyCode::new(target).unwrap(),
                    start + Duration::days(offset),
                    rate,
                )
            })
            .collect()
    })
}

fn converter() -> CurrencyConverter {
    CurrencyConverter::new(CurrencyCode::usd()).with_observer(Arc::new(NoopObserver))
}

fn thb() -> CurrencyCode {
    CurrencyCode::new("THB").unwrap()
}

fn jpy() -> CurrencyCode {
    CurrencyCode::new("JPY").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Converting to the same currency returns the amount, whatever the index.
    #[test]
    fn prop_identity_law(
        amount in signed_amount(),
        date in any_date(),
        currency in any_currency(),
        rates in usd_rate_set(),
    ) {
        let index = RateIndex::build(rates).unwrap();
        let result = converter().convert(amount, date, &currency, &currency, &index).unwrap();
        prop_assert_eq!(result, amount);
    }

    /// Base to X with an exact rate is a single multiplication.
    #[test]
    fn prop_from_base_multiplies(
        amount in signed_amount(),
        rate in positive_rate(),
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        let index = RateIndex::build(vec![
            ExchangeRate::new(CurrencyCode::usd(), thb(), date, rate),
        ]).unwrap();

        let result = converter().convert(amount, date, &CurrencyCode::usd(), &thb(), &index).unwrap();
        prop_assert_eq!(result, amount * rate);
    }

    /// Base to X and back returns the original amount.
    #[test]
    fn prop_round_trip_through_base(
        amount in signed_amount(),
        rate in positive_rate(),
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        let index = RateIndex::build(vec![
            ExchangeRate::new(CurrencyCode::usd(), thb(), date, rate),
        ]).unwrap();
        let converter = converter();

        let there = converter.convert(amount, date, &CurrencyCode::usd(), &thb(), &index).unwrap();
        let back = converter.convert(there, date, &thb(), &CurrencyCode::usd(), &index).unwrap();
        prop_assert!((back - amount).abs() <= dec!(0.000001), "{} != {}", back, amount);
    }

    /// X to Y and back via triangulation returns the original amount.
    #[test]
    fn prop_round_trip_triangulated(
        amount in signed_amount(),
        thb_rate in positive_rate(),
        jpy_rate in positive_rate(),
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        let index = RateIndex::build(vec![
            ExchangeRate::new(CurrencyCode::usd(), thb(), date, thb_rate),
            ExchangeRate::new(CurrencyCode::usd(), jpy(), date, jpy_rate),
        ]).unwrap();
        let converter = converter();

        let there = converter.convert(amount, date, &thb(), &jpy(), &index).unwrap();
        let back = converter.convert(there, date, &jpy(), &thb(), &index).unwrap();
        prop_assert!((back - amount).abs() <= dec!(0.000001), "{} != {}", back, amount);
    }

    /// Missing data degrades to the original amount and never errors.
    #[test]
    fn prop_missing_data_never_errors(
        amount in signed_amount(),
        date in any_date(),
        source in any_currency(),
        target in any_currency(),
        rates in usd_rate_set(),
    ) {
        let index = RateIndex::build(rates).unwrap();
        let conversion = converter()
            .convert_detailed(amount, date, &source, &target, &index)
            .unwrap();

        if conversion.degraded {
            prop_assert_eq!(conversion.amount, amount);
        }
        // GBP is never in the rate set.
        if source.as_str() == "GBP" && target != source {
            prop_assert!(conversion.degraded);
        }
    }
}
