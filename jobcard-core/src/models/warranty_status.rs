use serde::{Deserialize, Serialize};

/// Warranty category selected on the hardware/software tracking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarrantyStatus {
    StandardWarranty,
    ExtendedWarranty,
    Amc,
}

impl WarrantyStatus {
    /// Day count every fixed-term category is pinned to.
    pub const FIXED_TERM_DAYS: u32 = 365;

    pub fn all() -> &'static [WarrantyStatus] {
        &[
            WarrantyStatus::StandardWarranty,
            WarrantyStatus::ExtendedWarranty,
            WarrantyStatus::Amc,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StandardWarranty => "Standard Warranty",
            Self::ExtendedWarranty => "Extended Warranty",
            Self::Amc => "AMC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Standard Warranty" => Some(Self::StandardWarranty),
            "Extended Warranty" => Some(Self::ExtendedWarranty),
            "AMC" => Some(Self::Amc),
            _ => None,
        }
    }

    /// Day count forced onto the term when this status is selected.
    pub fn default_days(&self) -> u32 {
        match self {
            Self::StandardWarranty | Self::Amc => Self::FIXED_TERM_DAYS,
            Self::ExtendedWarranty => 0,
        }
    }

    /// Whether the operator may type the day count by hand.
    pub fn days_editable(&self) -> bool {
        matches!(self, Self::ExtendedWarranty)
    }
}
