//! Rate resolution with deterministic date fallback.
//!
//! Lookup order:
//! 1. Exact `(date, currency)` entry
//! 2. Date before the indexed range: clamp to the earliest date
//! 3. Date after the indexed range: clamp to the latest date
//! 4. Date inside the range without an entry: use the earliest date
//!
//! Step 4 is not a nearest-date search. Daily series are expected to be
//! gap-free, so a gap is reported as a provider defect and the earliest rate
//! is used as a stable, reproducible answer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::CurrencyCode;

use super::index::RateIndex;
use super::observer::{ConversionEvent, ConversionObserver};

/// How a rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateResolution {
    /// Rate for the exact requested date.
    Exact,
    /// Requested date predates the index; earliest rate used.
    ClampedToEarliest,
    /// Requested date is after the index; latest rate used.
    ClampedToLatest,
    /// Requested date falls in a gap; earliest rate used.
    GapFallback,
}

impl RateResolution {
    /// Returns true for anything other than an exact match.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::Exact)
    }
}

/// A resolved rate together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    /// Currency the rate prices.
    pub currency: CurrencyCode,
    /// Units of `currency` per one unit of base.
    pub rate: Decimal,
    /// Date the caller asked for.
    pub requested_date: NaiveDate,
    /// Date of the rate actually used.
    pub rate_date: NaiveDate,
    /// Provider publication date of the rate used, if known.
    pub published_date: Option<NaiveDate>,
    /// How the rate was obtained.
    pub resolution: RateResolution,
}

impl ResolvedRate {
    /// Returns true if the rate is not for the exact requested date.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.resolution.is_fallback()
    }
}

/// Finds the rate for `currency` on `date`, falling back as described in the
/// module docs.
///
/// Returns `None` when no rate can be resolved: the index is empty, or the
/// fallback date has no entry for `currency`. Fallbacks and failures are
/// reported to `observer`; an exact hit reports nothing.
pub fn find_nearest_rate(
    date: NaiveDate,
    currency: &CurrencyCode,
    index: &RateIndex,
    observer: &dyn ConversionObserver,
) -> Option<ResolvedRate> {
    if let Some(rate) = index.get(date, currency) {
        return Some(ResolvedRate {
            currency: currency.clone(),
            rate: rate.rate,
            requested_date: date,
            rate_date: rate.date,
            published_date: rate.published_date,
            resolution: RateResolution::Exact,
        });
    }

    let Some(bounds) = index.bounds() else {
        observer.on_event(&ConversionEvent::RateUnavailable {
            currency: currency.clone(),
            requested: date,
        });
        return None;
    };

    let (fallback_date, resolution, event) = if date < bounds.earliest {
        (
            bounds.earliest,
            RateResolution::ClampedToEarliest,
            ConversionEvent::ClampedToEarliest {
                currency: currency.clone(),
                requested: date,
                used: bounds.earliest,
            },
        )
    } else if date > bounds.latest {
        (
            bounds.latest,
            RateResolution::ClampedToLatest,
            ConversionEvent::ClampedToLatest {
                currency: currency.clone(),
                requested: date,
                used: bounds.latest,
            },
        )
    } else {
        (
            bounds.earliest,
            RateResolution::GapFallback,
            ConversionEvent::GapInSeries {
                currency: currency.clone(),
                requested: date,
                used: bounds.earliest,
            },
        )
    };

    // Reported before the fallback lookup so a missing entry keeps its severity.
    observer.on_event(&event);

    let Some(rate) = index.get(fallback_date, currency) else {
        observer.on_event(&ConversionEvent::RateUnavailable {
            currency: currency.clone(),
            requested: date,
        });
        return None;
    };

    Some(ResolvedRate {
        currency: currency.clone(),
        rate: rate.rate,
        requested_date: date,
        rate_date: rate.date,
        published_date: rate.published_date,
        resolution,
    })
}
