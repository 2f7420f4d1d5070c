//! Job number and serial number synthesis.
//!
//! Both identifiers are pure functions of the current form values. The serial
//! number doubles as a human-readable part number, so segment order is fixed
//! and position-significant:
//!
//! | Position | Segment                | Present when                     |
//! |----------|------------------------|----------------------------------|
//! | 1        | category prefix        | category set (see below)         |
//! | 2        | running sequence       | sequence set                     |
//! | 3        | `{w}.x{h}.0{unit}`     | width and height both set        |
//! | 4        | material code          | non-empty                        |
//! | 5        | ups code               | non-empty                        |
//! | 6        | core code              | non-empty                        |
//! | 7        | cut flag `Y`/`N`       | cut answered                     |
//! | 8        | perforation `Y`/`N`    | perforation answered             |
//!
//! The category prefix is the colour count followed by the code for `PP`, a
//! literal `0` followed by the code for `PL`, and the bare code otherwise.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use jobcard_core::calculations::IdentifierComponents;
//! use jobcard_core::LengthUnit;
//!
//! let ids = IdentifierComponents {
//!     category_code: "PP".into(),
//!     sequence_number: "001".into(),
//!     color_count: Some(3),
//!     width: Some(dec!(100)),
//!     height: Some(dec!(60)),
//!     unit: LengthUnit::Mm,
//!     material_code: "M1".into(),
//!     ups_code: "04".into(),
//!     core_code: "C1".into(),
//!     cut: Some(true),
//!     perforation: Some(false),
//! };
//!
//! assert_eq!(ids.job_number(), "PP001");
//! assert_eq!(ids.serial_number(), "3PP001100.x60.0MMM104C1YN");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::LengthUnit;

/// Category printed with its colour count in front.
pub const COLOR_PREFIXED_CATEGORY: &str = "PP";
/// Category printed with a literal zero in front.
pub const ZERO_PREFIXED_CATEGORY: &str = "PL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierComponents {
    pub category_code: String,
    /// Running number issued by the backend for the current category.
    pub sequence_number: String,
    /// Only used by the `PP` prefix.
    pub color_count: Option<u32>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub unit: LengthUnit,
    pub material_code: String,
    pub ups_code: String,
    pub core_code: String,
    pub cut: Option<bool>,
    pub perforation: Option<bool>,
}

impl IdentifierComponents {
    /// Category code followed by the running sequence number.
    pub fn job_number(&self) -> String {
        format!("{}{}", self.category_code.trim(), self.sequence_number.trim())
    }

    /// Full serial number built from every non-empty segment.
    pub fn serial_number(&self) -> String {
        let mut serial = self.category_prefix();
        serial.push_str(self.sequence_number.trim());

        if let Some(block) = self.dimension_block() {
            serial.push_str(&block);
        }

        for code in [&self.material_code, &self.ups_code, &self.core_code] {
            serial.push_str(code.trim());
        }

        for flag in [self.cut, self.perforation].into_iter().flatten() {
            serial.push(if flag { 'Y' } else { 'N' });
        }

        serial
    }

    fn category_prefix(&self) -> String {
        let category = self.category_code.trim();
        match category {
            COLOR_PREFIXED_CATEGORY => match self.color_count {
                Some(colors) => format!("{colors}{category}"),
                None => category.to_string(),
            },
            ZERO_PREFIXED_CATEGORY => format!("0{category}"),
            _ => category.to_string(),
        }
    }

    fn dimension_block(&self) -> Option<String> {
        let width = self.width?.normalize();
        let height = self.height?.normalize();
        Some(format!("{width}.x{height}.0{}", self.unit.suffix()))
    }
}
