//! Length conversion between millimetres and inches.
//!
//! Label dimensions are entered in either unit; the converter keeps the
//! other representation in step.

use rust_decimal::Decimal;

use crate::calculations::common::round_half_up;
use crate::models::LengthUnit;

/// Millimetres per inch.
pub const MM_PER_INCH: Decimal = Decimal::from_parts(254, 0, 0, false, 1);

/// Converts `value` from one unit to another, rounded half-up to two decimals.
///
/// Converting to the same unit returns the value unchanged.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use jobcard_core::calculations::convert_length;
/// use jobcard_core::LengthUnit;
///
/// assert_eq!(convert_length(dec!(25.4), LengthUnit::Mm, LengthUnit::In), dec!(1.00));
/// assert_eq!(convert_length(dec!(4), LengthUnit::In, LengthUnit::Mm), dec!(101.60));
/// ```
pub fn convert_length(
    value: Decimal,
    from: LengthUnit,
    to: LengthUnit,
) -> Decimal {
    match (from, to) {
        (LengthUnit::Mm, LengthUnit::In) => round_half_up(value / MM_PER_INCH),
        (LengthUnit::In, LengthUnit::Mm) => round_half_up(value * MM_PER_INCH),
        _ => value,
    }
}
