/// Largest integer magnitude exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_INT: f64 = 9_007_199_254_740_991.0;

/// Formats a number the way the language prints it.
///
/// Integral values within the exactly-representable range render without a
/// decimal point, so `2.0` prints as `2`. Everything else falls back to the
/// standard float formatting.
///
/// # Example
/// ```
/// use expreva::util::num::format_number;
///
/// assert_eq!(format_number(2.0), "2");
/// assert_eq!(format_number(-7.0), "-7");
/// assert_eq!(format_number(1.5), "1.5");
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INT {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Converts a number to a collection index if it is a non-negative integer.
///
/// Fractional, negative, non-finite, or out-of-range values yield `None`;
/// member reads treat those as missing keys rather than errors.
///
/// # Example
/// ```
/// use expreva::util::num::f64_to_index;
///
/// assert_eq!(f64_to_index(2.0), Some(2));
/// assert_eq!(f64_to_index(-1.0), None);
/// assert_eq!(f64_to_index(0.5), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f64_to_index(value: f64) -> Option<usize> {
    if value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value <= MAX_SAFE_INT {
        return Some(value as usize);
    }
    None
}
