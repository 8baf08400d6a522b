//! Observability hook for rate fallbacks and degraded conversions.
//!
//! The converter never fails on missing data. Instead it reports what
//! happened through a [`ConversionObserver`] so the host can route it to its
//! own telemetry.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::CurrencyCode;
use tracing::{error, warn};

/// How serious a conversion event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected data gaps, e.g. today's rate not yet published.
    Warning,
    /// Upstream contract violations or provider defects.
    Error,
}

/// Something noteworthy that happened while resolving a rate or converting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// Requested date is after the latest indexed date; falling back to the
    /// latest date.
    ClampedToLatest {
        /// Currency being resolved.
        currency: CurrencyCode,
        /// Date the caller asked for.
        requested: NaiveDate,
        /// Fallback date chosen.
        used: NaiveDate,
    },
    /// Requested date is before the earliest indexed date; falling back to
    /// the earliest date.
    ClampedToEarliest {
        /// Currency being resolved.
        currency: CurrencyCode,
        /// Date the caller asked for.
        requested: NaiveDate,
        /// Fallback date chosen.
        used: NaiveDate,
    },
    /// Requested date predates the earliest date callers may convert at.
    BeforeSupportedRange {
        /// Date the caller asked for.
        requested: NaiveDate,
        /// Configured floor.
        floor: NaiveDate,
    },
    /// Requested date is inside the indexed range but has no rate for the
    /// currency; falling back to the earliest date.
    GapInSeries {
        /// Currency being resolved.
        currency: CurrencyCode,
        /// Date the caller asked for.
        requested: NaiveDate,
        /// Fallback date chosen.
        used: NaiveDate,
    },
    /// No rate could be resolved for the currency.
    RateUnavailable {
        /// Currency being resolved.
        currency: CurrencyCode,
        /// Date the caller asked for.
        requested: NaiveDate,
    },
    /// A conversion returned the original amount unchanged.
    Degraded {
        /// Source currency.
        source: CurrencyCode,
        /// Target currency.
        target: CurrencyCode,
        /// Conversion date.
        date: NaiveDate,
        /// Amount returned unconverted.
        amount: Decimal,
    },
}

impl ConversionEvent {
    /// Severity the default observer logs this event at.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ClampedToLatest { .. } | Self::RateUnavailable { .. } | Self::Degraded { .. } => {
                Severity::Warning
            }
            Self::ClampedToEarliest { .. }
            | Self::BeforeSupportedRange { .. }
            | Self::GapInSeries { .. } => Severity::Error,
        }
    }

    /// Human-readable summary for logs.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ClampedToLatest { .. } => {
                "No rate published for requested date yet, using latest available"
            }
            Self::ClampedToEarliest { .. } => {
                "Requested date precedes rate history, falling back to earliest date"
            }
            Self::BeforeSupportedRange { .. } => {
                "Conversion requested before earliest supported date"
            }
            Self::GapInSeries { .. } => "Gap in rate series, falling back to earliest date",
            Self::RateUnavailable { .. } => "No exchange rate available",
            Self::Degraded { .. } => "Conversion degraded, returning original amount",
        }
    }
}

/// Receives conversion events.
pub trait ConversionObserver: Send + Sync {
    /// Called once per event, synchronously, on the converting thread.
    fn on_event(&self, event: &ConversionEvent);
}

/// Emits every event as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ConversionObserver for TracingObserver {
    fn on_event(&self, event: &ConversionEvent) {
        let message = event.message();
        match event.severity() {
            Severity::Warning => warn!(?event, "{message}"),
            Severity::Error => error!(?event, "{message}"),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {
    fn on_event(&self, _event: &ConversionEvent) {}
}
