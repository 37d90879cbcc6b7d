//! Base-unit price conversion
//!
//! Marketplace APIs report prices as integer strings in a fixed-point
//! base-unit representation with an explicit `decimals` field. Converting
//! through `f64::parse` first would lose integer precision for 18-decimal
//! values, so the integer and fractional parts are split in `u128` before
//! any float math.

/// Converts an integer base-unit string to a decimal price
///
/// Returns `None` when the string is not a plain non-negative integer;
/// callers treat that as a malformed response and keep their defaults.
pub fn base_units_to_decimal(value: &str, decimals: u32) -> Option<f64> {
    let raw: u128 = value.trim().parse().ok()?;
    let divisor = 10u128.checked_pow(decimals)?;
    let whole = raw / divisor;
    let frac = raw % divisor;
    Some(whole as f64 + frac as f64 / divisor as f64)
}
