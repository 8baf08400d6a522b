//! Exchange rate records as supplied by the rate provider.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::CurrencyCode;

/// A daily exchange rate quoted from the base currency.
///
/// `1 base_currency = rate target_currency` on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// Currency the rate is quoted from.
    pub base_currency: CurrencyCode,
    /// Currency being priced.
    pub target_currency: CurrencyCode,
    /// Calendar date the rate applies to.
    pub date: NaiveDate,
    /// Units of target per one unit of base.
    pub rate: Decimal,
    /// Date the provider published the rate, which may lag `date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<NaiveDate>,
}

impl ExchangeRate {
    /// Creates a new exchange rate with no published date.
    #[must_use]
    pub const fn new(
        base_currency: CurrencyCode,
        target_currency: CurrencyCode,
        date: NaiveDate,
        rate: Decimal,
    ) -> Self {
        Self {
            base_currency,
            target_currency,
            date,
            rate,
            published_date: None,
        }
    }

    /// Sets the provider's publication date.
    #[must_use]
    pub fn with_published_date(mut self, published_date: NaiveDate) -> Self {
        self.published_date = Some(published_date);
        self
    }
}
