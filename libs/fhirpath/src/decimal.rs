//! FHIRPath decimal mode: 15 significant digits, half-away-from-zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Significant digits retained by decimal-mode operations.
pub const SIGNIFICANT_DIGITS: u32 = 15;

/// Clamp a decimal to the 15-significant-digit mode. Values that already
/// fit pass through unchanged.
pub fn normalize(value: Decimal) -> Decimal {
    if value.is_zero() {
        return Decimal::ZERO;
    }
    let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
    if digits <= SIGNIFICANT_DIGITS {
        return value;
    }
    let scale = value.scale();
    let integral_digits = digits.saturating_sub(scale);
    let keep = SIGNIFICANT_DIGITS.saturating_sub(integral_digits);
    if keep >= scale {
        return value;
    }
    value.round_dp_with_strategy(keep, RoundingStrategy::MidpointAwayFromZero)
}

/// Division in decimal mode; `None` for a zero divisor or overflow.
pub fn checked_div(lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    if rhs.is_zero() {
        return None;
    }
    lhs.checked_div(rhs).map(normalize)
}
