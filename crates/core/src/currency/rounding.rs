//! Display rounding for converted amounts.
//!
//! Conversion itself never rounds. Rounding happens once, at presentation,
//! with banker's rounding (round half to even) to minimize cumulative bias
//! when rounded rows are summed.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds `value` to `decimal_places` using banker's rounding.
///
/// - 2.5 → 2
/// - 3.5 → 4
/// - -1753.385 → -1753.38 (at 2 places)
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::currency::round_for_display;
///
/// assert_eq!(round_for_display(dec!(1752.3432), 2), dec!(1752.34));
/// ```
#[must_use]
pub fn round_for_display(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}
