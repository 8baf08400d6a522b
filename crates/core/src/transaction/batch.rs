//! Batch conversion of transactions into a display currency.

use rayon::prelude::*;
use rust_decimal::Decimal;
use tally_shared::CurrencyCode;
use tracing::debug;

use super::types::{ConversionSummary, ConvertedTransaction, Transaction};
use crate::currency::{ConversionError, CurrencyConverter, RateIndex};

/// Converts every transaction into `display_currency` and totals the result.
///
/// Rows are converted in parallel against the shared, read-only index and
/// returned in input order.
///
/// # Errors
///
/// Returns the first structural error (see [`ConversionError`]). Missing
/// rates do not fail the batch; they are counted in `degraded_count`.
pub fn convert_transactions(
    converter: &CurrencyConverter,
    transactions: &[Transaction],
    display_currency: &CurrencyCode,
    index: &RateIndex,
) -> Result<ConversionSummary, ConversionError> {
    let rows = transactions
        .par_iter()
        .map(|transaction| {
            converter
                .convert_detailed(
                    transaction.amount,
                    transaction.date,
                    &transaction.currency_iso_code,
                    display_currency,
                    index,
                )
                .map(|conversion| ConvertedTransaction {
                    transaction: transaction.clone(),
                    conversion,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut total = Decimal::ZERO;
    let mut degraded_count = 0;
    let mut fallback_count = 0;

    for row in &rows {
        total = total
            .checked_add(row.conversion.amount)
            .ok_or_else(|| ConversionError::Overflow {
                amount: row.conversion.amount,
                source_currency: row.transaction.currency_iso_code.clone(),
                target_currency: display_currency.clone(),
            })?;
        if row.conversion.degraded {
            degraded_count += 1;
        }
        if row.conversion.used_fallback_rate() {
            fallback_count += 1;
        }
    }

    debug!(
        rows = rows.len(),
        degraded = degraded_count,
        fallback = fallback_count,
        %display_currency,
        "Converted transaction batch"
    );

    Ok(ConversionSummary {
        display_currency: display_currency.clone(),
        rows,
        total,
        degraded_count,
        fallback_count,
    })
}
