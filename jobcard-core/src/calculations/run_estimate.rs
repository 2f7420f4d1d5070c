//! Meters-of-run estimation for a label print job.
//!
//! The estimate pre-fills a field the press operator can override. It is
//! advisory only, so bad inputs never produce an error for the operator:
//! unusable inputs yield a [`ComputationGuard`] and the field stays blank.
//!
//! # Formula
//!
//! ```text
//! meters = quantity × cylinder_teeth × 3.175 / ups_across / ups_along / 1000
//!        + waste_margin(color_count)
//! ```
//!
//! # Waste margin
//!
//! | Colours | 0   | 1   | 2   | 3   | 4   | 5   | 6   | 7   | 8   | 9   |
//! |---------|-----|-----|-----|-----|-----|-----|-----|-----|-----|-----|
//! | Margin  | 0.2 | 0.3 | 0.5 | 0.7 | 0.8 | 0.9 | 1.0 | 1.1 | 1.2 | 1.3 |
//!
//! Colour counts outside the table get no margin.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use jobcard_core::calculations::RunEstimateInput;
//!
//! let input = RunEstimateInput::from_text("1000", "80", "4", "20", "3");
//! let estimate = input.calculate().unwrap();
//!
//! assert_eq!(estimate.meters, dec!(3.875));
//! assert_eq!(estimate.meters_display(), "3.88");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{format_fixed2, parse_decimal, parse_leading_int};

const fn tenths(n: u32) -> Decimal {
    Decimal::from_parts(n, 0, 0, false, 1)
}

/// Millimetres of circumference per cylinder tooth (1/8 inch).
pub const CYLINDER_CIRCUMFERENCE_CONSTANT: Decimal = Decimal::from_parts(3175, 0, 0, false, 3);

/// Waste margin per colour count, indexed by the number of colour units.
pub const WASTE_MARGINS: [Decimal; 10] = [
    tenths(2),
    tenths(3),
    tenths(5),
    tenths(7),
    tenths(8),
    tenths(9),
    tenths(10),
    tenths(11),
    tenths(12),
    tenths(13),
];

const MM_PER_METER: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Reasons a run estimate cannot be computed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComputationGuard {
    #[error("cylinder teeth is missing or not a number")]
    MissingCylinderTeeth,

    #[error("ups across must be a positive number")]
    InvalidUpsAcross,

    #[error("ups along must be a positive number")]
    InvalidUpsAlong,
}

/// Waste margin for a colour count, or zero outside the table.
pub fn waste_margin(color_count: Option<i64>) -> Decimal {
    color_count
        .and_then(|c| usize::try_from(c).ok())
        .and_then(|idx| WASTE_MARGINS.get(idx).copied())
        .unwrap_or_else(|| {
            warn!(?color_count, "colour count outside waste table; no margin applied");
            Decimal::ZERO
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEstimateInput {
    pub quantity: Decimal,
    pub cylinder_teeth: Option<Decimal>,
    pub ups_across: Option<Decimal>,
    pub ups_along: Option<Decimal>,
    pub color_count: Option<i64>,
}

impl RunEstimateInput {
    /// Builds the input from raw form text.
    ///
    /// An unreadable quantity counts as zero; the colour count is read as a
    /// leading base-10 integer.
    pub fn from_text(
        quantity: &str,
        cylinder_teeth: &str,
        ups_across: &str,
        ups_along: &str,
        color_count: &str,
    ) -> Self {
        Self {
            quantity: parse_decimal(quantity).unwrap_or(Decimal::ZERO),
            cylinder_teeth: parse_decimal(cylinder_teeth),
            ups_across: parse_decimal(ups_across),
            ups_along: parse_decimal(ups_along),
            color_count: parse_leading_int(color_count),
        }
    }

    /// Applies the run formula.
    ///
    /// # Errors
    ///
    /// Returns a [`ComputationGuard`] when the cylinder teeth are missing or
    /// either ups value is missing, zero or negative.
    pub fn calculate(&self) -> Result<RunEstimate, ComputationGuard> {
        let teeth = self
            .cylinder_teeth
            .ok_or(ComputationGuard::MissingCylinderTeeth)?;
        let across = self
            .ups_across
            .filter(|v| *v > Decimal::ZERO)
            .ok_or(ComputationGuard::InvalidUpsAcross)?;
        let along = self
            .ups_along
            .filter(|v| *v > Decimal::ZERO)
            .ok_or(ComputationGuard::InvalidUpsAlong)?;

        let run_length =
            self.quantity * teeth * CYLINDER_CIRCUMFERENCE_CONSTANT / across / along / MM_PER_METER;
        let margin = waste_margin(self.color_count);
        let meters = run_length + margin;

        debug!(%run_length, %margin, %meters, "run estimate computed");

        Ok(RunEstimate {
            run_length,
            waste_margin: margin,
            meters,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEstimate {
    /// Material consumed by the printed repeats alone.
    pub run_length: Decimal,
    pub waste_margin: Decimal,
    pub meters: Decimal,
}

impl RunEstimate {
    /// Meters fixed to two decimals, as shown on the form.
    pub fn meters_display(&self) -> String {
        format_fixed2(self.meters)
    }
}
