use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Mm,
    In,
}

impl LengthUnit {
    /// Suffix used inside serial numbers and on printed labels.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Mm => "MM",
            Self::In => "IN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MM" => Some(Self::Mm),
            "IN" | "INCH" | "INCHES" => Some(Self::In),
            _ => None,
        }
    }
}
