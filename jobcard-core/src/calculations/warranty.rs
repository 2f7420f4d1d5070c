//! Warranty term and expiry-date derivation.
//!
//! A [`WarrantyTerm`] keeps `expiry_date` consistent with its inputs at all
//! times: every mutation goes through a named transition that recomputes the
//! expiry from scratch, so the derived value is never stored independently of
//! `start_date` and `days`.
//!
//! # Status rules
//!
//! | Status              | Day count        | Editable |
//! |---------------------|------------------|----------|
//! | `StandardWarranty`  | forced to 365    | no       |
//! | `AMC`               | forced to 365    | no       |
//! | `ExtendedWarranty`  | reset to 0       | yes      |
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use jobcard_core::calculations::WarrantyTerm;
//! use jobcard_core::WarrantyStatus;
//!
//! let mut term = WarrantyTerm::default();
//! term.set_start_date(NaiveDate::from_ymd_opt(2024, 1, 1));
//! term.set_status(WarrantyStatus::Amc);
//!
//! assert_eq!(term.days(), Some(365));
//! assert_eq!(term.expiry_date(), NaiveDate::from_ymd_opt(2024, 12, 31));
//! ```

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{WarrantySnapshot, WarrantyStatus};

/// Errors raised by warranty term transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WarrantyError {
    /// The current status pins the day count; it cannot be typed in.
    #[error("warranty days are fixed for status '{}'", .0.as_str())]
    DaysReadOnly(WarrantyStatus),
}

/// Adds `days` calendar days to `start`.
///
/// Returns `None` when either input is missing, when `days` is zero, or when
/// the result falls outside the representable date range. A blank expiry is
/// preferred over a bogus one.
pub fn expiry_date(
    start: Option<NaiveDate>,
    days: Option<u32>,
) -> Option<NaiveDate> {
    let start = start?;
    let days = days.filter(|d| *d > 0)?;
    start.checked_add_days(Days::new(u64::from(days)))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyTerm {
    start_date: Option<NaiveDate>,
    days: Option<u32>,
    status: Option<WarrantyStatus>,
    expiry_date: Option<NaiveDate>,
}

impl WarrantyTerm {
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn days(&self) -> Option<u32> {
        self.days
    }

    pub fn status(&self) -> Option<WarrantyStatus> {
        self.status
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    /// Whether the day count can currently be typed in.
    ///
    /// With no status selected yet the field is open.
    pub fn days_editable(&self) -> bool {
        self.status.is_none_or(|s| s.days_editable())
    }

    pub fn set_start_date(
        &mut self,
        start_date: Option<NaiveDate>,
    ) {
        self.start_date = start_date;
        self.recompute();
    }

    /// Sets the day count typed by the operator.
    ///
    /// # Errors
    ///
    /// Returns [`WarrantyError::DaysReadOnly`] when the selected status pins
    /// the day count. The term is left unchanged.
    pub fn set_days(
        &mut self,
        days: Option<u32>,
    ) -> Result<(), WarrantyError> {
        if let Some(status) = self.status.filter(|s| !s.days_editable()) {
            return Err(WarrantyError::DaysReadOnly(status));
        }
        self.days = days;
        self.recompute();
        Ok(())
    }

    /// Sets the day count from raw form text.
    ///
    /// Anything that is not a non-negative whole number clears the count, which
    /// in turn blanks the expiry date.
    pub fn set_days_input(
        &mut self,
        input: &str,
    ) -> Result<(), WarrantyError> {
        let trimmed = input.trim();
        let days = trimmed.parse::<u32>().ok();
        if days.is_none() && !trimmed.is_empty() {
            debug!(input = %input, "warranty days is not a whole number");
        }
        self.set_days(days)
    }

    /// Selects a warranty status and applies its day-count rule.
    pub fn set_status(
        &mut self,
        status: WarrantyStatus,
    ) {
        self.status = Some(status);
        self.days = Some(status.default_days());
        self.recompute();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> WarrantySnapshot {
        WarrantySnapshot {
            status: self.status,
            start_date: self.start_date,
            days: self.days,
            expiry_date: self.expiry_date,
        }
    }

    fn recompute(&mut self) {
        self.expiry_date = expiry_date(self.start_date, self.days);
        debug!(
            start = ?self.start_date,
            days = ?self.days,
            expiry = ?self.expiry_date,
            "warranty expiry recomputed"
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // =========================================================================
    // expiry_date tests
    // =========================================================================

    #[test]
    fn expiry_adds_calendar_days() {
        assert_eq!(expiry_date(Some(date(2024, 1, 1)), Some(30)), Some(date(2024, 1, 31)));
    }

    #[test]
    fn expiry_crosses_leap_day() {
        assert_eq!(expiry_date(Some(date(2024, 2, 28)), Some(2)), Some(date(2024, 3, 1)));
    }

    #[test]
    fn expiry_blank_without_start() {
        assert_eq!(expiry_date(None, Some(10)), None);
    }

    #[test]
    fn expiry_blank_for_zero_or_missing_days() {
        assert_eq!(expiry_date(Some(date(2024, 1, 1)), Some(0)), None);
        assert_eq!(expiry_date(Some(date(2024, 1, 1)), None), None);
    }

    #[test]
    fn expiry_blank_on_overflow() {
        assert_eq!(expiry_date(Some(NaiveDate::MAX), Some(1)), None);
    }

    // =========================================================================
    // WarrantyTerm transition tests
    // =========================================================================

    #[test]
    fn new_term_has_open_days_and_no_expiry() {
        let term = WarrantyTerm::default();

        assert!(term.days_editable());
        assert_eq!(term.expiry_date(), None);
    }

    #[test]
    fn standard_warranty_forces_365_days() {
        let mut term = WarrantyTerm::default();
        term.set_days(Some(90)).unwrap();

        term.set_status(WarrantyStatus::StandardWarranty);

        assert_eq!(term.days(), Some(365));
        assert!(!term.days_editable());
    }

    #[test]
    fn extended_warranty_resets_days_to_zero() {
        let mut term = WarrantyTerm::default();
        term.set_status(WarrantyStatus::Amc);

        term.set_status(WarrantyStatus::ExtendedWarranty);

        assert_eq!(term.days(), Some(0));
        assert!(term.days_editable());
        assert_eq!(term.expiry_date(), None);
    }

    #[test]
    fn fixed_status_rejects_typed_days() {
        let mut term = WarrantyTerm::default();
        term.set_start_date(Some(date(2024, 6, 1)));
        term.set_status(WarrantyStatus::StandardWarranty);
        let before = term.clone();

        let result = term.set_days(Some(10));

        assert_eq!(
            result,
            Err(WarrantyError::DaysReadOnly(WarrantyStatus::StandardWarranty))
        );
        assert_eq!(term, before);
    }

    #[test]
    fn expiry_follows_every_mutation() {
        let mut term = WarrantyTerm::default();
        term.set_status(WarrantyStatus::ExtendedWarranty);

        term.set_start_date(Some(date(2023, 3, 10)));
        term.set_days(Some(100)).unwrap();
        assert_eq!(term.expiry_date(), Some(date(2023, 6, 18)));

        term.set_start_date(Some(date(2023, 1, 1)));
        assert_eq!(term.expiry_date(), Some(date(2023, 4, 11)));

        term.set_days(Some(1)).unwrap();
        assert_eq!(term.expiry_date(), Some(date(2023, 1, 2)));

        term.set_start_date(None);
        assert_eq!(term.expiry_date(), None);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let mut term = WarrantyTerm::default();
        term.set_start_date(Some(date(2025, 5, 5)));
        term.set_days(Some(45)).unwrap();
        let first = term.expiry_date();

        term.set_days(Some(45)).unwrap();
        term.set_start_date(Some(date(2025, 5, 5)));

        assert_eq!(term.expiry_date(), first);
    }

    #[test]
    fn non_numeric_days_input_blanks_expiry() {
        let mut term = WarrantyTerm::default();
        term.set_start_date(Some(date(2025, 1, 1)));
        term.set_days_input("30").unwrap();
        assert!(term.expiry_date().is_some());

        term.set_days_input("thirty").unwrap();

        assert_eq!(term.days(), None);
        assert_eq!(term.expiry_date(), None);
    }

    #[test]
    fn negative_days_input_is_rejected_as_absent() {
        let mut term = WarrantyTerm::default();
        term.set_start_date(Some(date(2025, 1, 1)));

        term.set_days_input("-5").unwrap();

        assert_eq!(term.days(), None);
        assert_eq!(term.expiry_date(), None);
    }

    #[test]
    fn clear_returns_to_default() {
        let mut term = WarrantyTerm::default();
        term.set_status(WarrantyStatus::Amc);
        term.set_start_date(Some(date(2025, 1, 1)));

        term.clear();

        assert_eq!(term, WarrantyTerm::default());
    }
}
