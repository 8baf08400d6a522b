//! Transaction types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::{CurrencyCode, Money};

use crate::currency::Conversion;

/// A transaction as imported from a bank statement.
///
/// The amount is signed; its meaning (debit or credit) belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Caller-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Signed amount in `currency_iso_code`.
    pub amount: Decimal,
    /// Booking date.
    pub date: NaiveDate,
    /// Currency the amount is denominated in.
    pub currency_iso_code: CurrencyCode,
    /// Free-text description from the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Creates a transaction without id or description.
    #[must_use]
    pub const fn new(amount: Decimal, date: NaiveDate, currency_iso_code: CurrencyCode) -> Self {
        Self {
            id: None,
            amount,
            date,
            currency_iso_code,
            description: None,
        }
    }

    /// Amount and currency as [`Money`].
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency_iso_code.clone())
    }
}

/// A transaction paired with its conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedTransaction {
    /// The original transaction.
    pub transaction: Transaction,
    /// Conversion into the display currency.
    pub conversion: Conversion,
}

/// Result of converting a list of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSummary {
    /// Currency the total is expressed in.
    pub display_currency: CurrencyCode,
    /// Converted rows, in input order.
    pub rows: Vec<ConvertedTransaction>,
    /// Sum of converted amounts. Includes degraded rows at their original
    /// amount; check `degraded_count` before presenting it as exact.
    pub total: Decimal,
    /// Rows returned unconverted because a rate was missing.
    pub degraded_count: usize,
    /// Rows that used at least one rate from another date.
    pub fallback_count: usize,
}

impl ConversionSummary {
    /// Returns true if every row converted with exact-date rates.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.degraded_count == 0 && self.fallback_count == 0
    }
}
