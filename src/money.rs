//! Helpers for working with monetary amounts.
//!
//! Amounts are plain `f64` values carrying at most two meaningful decimal
//! places. Every derived figure is passed through [round_to_cents] so that
//! totals compare equal to the cent.

/// Round an amount to two decimal places, half away from zero.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// An amount expressed as a whole number of cents.
///
/// Useful for exact equality checks on sums of rounded amounts.
pub fn as_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
