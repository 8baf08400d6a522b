//! Plain-text rendering of conversion results.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use tally_core::currency::{RateIndex, RateResolution, round_for_display};
use tally_core::transaction::ConvertedTransaction;
use tally_core::ConversionSummary;

/// Rounds for display and pads to exactly `decimal_places`.
pub fn display_amount(amount: Decimal, decimal_places: u32) -> String {
    let mut rounded = round_for_display(amount, decimal_places);
    rounded.rescale(decimal_places);
    rounded.to_string()
}

fn resolution_label(resolution: RateResolution) -> &'static str {
    match resolution {
        RateResolution::Exact => "exact",
        RateResolution::ClampedToEarliest => "earliest",
        RateResolution::ClampedToLatest => "latest",
        RateResolution::GapFallback => "gap",
    }
}

/// Provenance marker, e.g. `[exact]`, `[latest 2025-10-14]`, `[unconverted]`.
fn provenance(row: &ConvertedTransaction) -> String {
    let conversion = &row.conversion;
    if conversion.degraded {
        return "[unconverted]".to_string();
    }
    let legs: Vec<String> = conversion
        .legs()
        .map(|leg| {
            if leg.is_fallback() {
                format!(
                    "{} {} {}",
                    leg.currency,
                    resolution_label(leg.resolution),
                    leg.rate_date
                )
            } else {
                format!("{} {}", leg.currency, resolution_label(leg.resolution))
            }
        })
        .collect();
    if legs.is_empty() {
        "[same currency]".to_string()
    } else {
        format!("[{}]", legs.join(", "))
    }
}

/// Renders one line per transaction followed by the total.
pub fn render_summary(summary: &ConversionSummary, decimal_places: u32) -> String {
    let mut out = String::new();
    for row in &summary.rows {
        let tx = &row.transaction;
        let conversion = &row.conversion;
        let _ = writeln!(
            out,
            "{}  {:>14} {}  ->  {:>14} {}  {}{}",
            tx.date,
            display_amount(tx.amount, decimal_places),
            tx.currency_iso_code,
            display_amount(conversion.amount, decimal_places),
            conversion.amount_currency(),
            provenance(row),
            tx.description
                .as_deref()
                .map(|d| format!("  {d}"))
                .unwrap_or_default(),
        );
    }

    let _ = writeln!(
        out,
        "Total ({}): {}",
        summary.display_currency,
        display_amount(summary.total, decimal_places)
    );
    if summary.fallback_count > 0 {
        let _ = writeln!(
            out,
            "Note: {} transaction(s) used a rate from another date",
            summary.fallback_count
        );
    }
    if summary.degraded_count > 0 {
        let _ = writeln!(
            out,
            "Warning: {} transaction(s) could not be converted and are included at their original amount",
            summary.degraded_count
        );
    }
    out
}

/// Renders index statistics.
pub fn render_index(index: &RateIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rates: {}", index.len());
    let _ = writeln!(out, "Dates: {}", index.date_count());
    match (index.base_currency(), index.bounds()) {
        (Some(base), Some(bounds)) => {
            let _ = writeln!(out, "Base currency: {base}");
            let _ = writeln!(out, "Earliest: {}", bounds.earliest);
            let _ = writeln!(out, "Latest: {}", bounds.latest);
            let currencies: Vec<String> = index
                .currencies()
                .into_iter()
                .map(String::from)
                .collect();
            let _ = writeln!(out, "Currencies: {}", currencies.join(", "));
        }
        _ => {
            let _ = writeln!(out, "Index is empty");
        }
    }
    out
}
