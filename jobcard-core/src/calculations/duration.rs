//! Human-readable rendering of day counts.

/// Days in a year for duration display.
const DAYS_PER_YEAR: u32 = 365;
/// Days in a month for duration display.
const DAYS_PER_MONTH: u32 = 30;

/// Converts a day count into a sentence such as `"1 year 2 months 3 days"`.
///
/// Years take 365 days and months 30 days of the remainder. Zero parts are
/// omitted, so `0` renders as an empty string.
///
/// # Examples
///
/// ```
/// use jobcard_core::calculations::days_to_duration;
///
/// assert_eq!(days_to_duration(0), "");
/// assert_eq!(days_to_duration(365), "1 year");
/// assert_eq!(days_to_duration(400), "1 year 1 month 5 days");
/// ```
pub fn days_to_duration(days: u32) -> String {
    let years = days / DAYS_PER_YEAR;
    let remainder = days % DAYS_PER_YEAR;
    let months = remainder / DAYS_PER_MONTH;
    let days = remainder % DAYS_PER_MONTH;

    [(years, "year"), (months, "month"), (days, "day")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, unit)| {
            if count == 1 {
                format!("{count} {unit}")
            } else {
                format!("{count} {unit}s")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
