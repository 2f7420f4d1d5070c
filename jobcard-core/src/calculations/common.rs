//! Shared helpers for the derived-field calculators.
//!
//! Form inputs arrive as text. These helpers turn that text into numbers the
//! calculators can use, and turn results back into the fixed two-decimal form
//! the operator sees.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use jobcard_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(3.874)), dec!(3.87));
/// assert_eq!(round_half_up(dec!(3.875)), dec!(3.88));
/// assert_eq!(round_half_up(dec!(-3.875)), dec!(-3.88)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a value with exactly two decimals after half-up rounding.
///
/// ```
/// use rust_decimal_macros::dec;
/// use jobcard_core::calculations::common::format_fixed2;
///
/// assert_eq!(format_fixed2(dec!(6)), "6.00");
/// assert_eq!(format_fixed2(dec!(3.875)), "3.88");
/// ```
pub fn format_fixed2(value: Decimal) -> String {
    let mut rounded = round_half_up(value);
    rounded.rescale(2);
    rounded.to_string()
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses form text into a [`Decimal`], returning `None` for blank or invalid input.
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse().map_or_else(
        |e| {
            tracing::debug!(input = %s, "invalid decimal: {}", e);
            None
        },
        Some,
    )
}

/// Parses the leading base-10 integer of `s`, ignoring anything after it.
///
/// `"3"` and `"3 colours"` both yield `3`; text without leading digits yields
/// `None`. This matches how colour counts are typed into the form.
///
/// ```
/// use jobcard_core::calculations::common::parse_leading_int;
///
/// assert_eq!(parse_leading_int("3 colours"), Some(3));
/// assert_eq!(parse_leading_int("-2"), Some(-2));
/// assert_eq!(parse_leading_int("four"), None);
/// ```
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    rest[..digits_len].parse::<i64>().ok().map(|n| sign * n)
}
