use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::WarrantyStatus;

/// Warranty values captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantySnapshot {
    pub status: Option<WarrantyStatus>,
    pub start_date: Option<NaiveDate>,
    pub days: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
}

/// The payload handed to the persistence collaborator on submit.
///
/// Derived values are stored alongside the raw form fields they came from so
/// the receiving side never has to recompute them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCardRecord {
    pub job_number: String,
    pub serial_number: String,
    pub customer: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    /// Meters of run, fixed to two decimals. `None` when it could not be computed.
    pub meters: Option<String>,
    pub warranty: WarrantySnapshot,
    pub serials: Vec<String>,
    pub fields: BTreeMap<String, String>,
}

/// Status flag returned by the save endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStatus {
    #[serde(rename = "T")]
    Success,
    #[serde(rename = "F")]
    Failure,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "T",
            Self::Failure => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "T" => Some(Self::Success),
            "F" => Some(Self::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub status: SaveStatus,
    pub message: String,
}

impl SaveOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: SaveStatus::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: SaveStatus::Failure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SaveStatus::Success
    }
}
