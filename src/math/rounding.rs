//! Decimal rounding with round-half-to-even semantics.

/// Round `value` to `decimals` places, ties to even.
///
/// `round_to(2.5, 0) == 2.0`, `round_to(3.5, 0) == 4.0`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if decimals == 0 {
        return value.round_ties_even();
    }
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}
