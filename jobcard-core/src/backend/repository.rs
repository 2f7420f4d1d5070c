use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cascade::CascadeLevel;
use crate::models::{JobCardRecord, OptionItem, SaveOutcome};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Record not found")]
    NotFound,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Answer from a business-uniqueness check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessCheck {
    pub conflict: bool,
    pub message: Option<String>,
    /// Job card already holding the value, when the backend knows it.
    #[serde(default)]
    pub job_number: Option<String>,
}

impl UniquenessCheck {
    pub fn unique() -> Self {
        Self::default()
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            conflict: true,
            message: Some(message.into()),
            job_number: None,
        }
    }

    /// Conflict with the saved card `job_number`.
    pub fn conflict_with(
        job_number: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_number: Some(job_number.into()),
            ..Self::conflict(message)
        }
    }
}

/// Remote collaborator behind the job card forms.
///
/// Every call is recoverable from the form's point of view: a failure is
/// reported to the operator and the form stays usable.
#[async_trait]
pub trait JobCardBackend: Send + Sync {
    // Dropdown options
    /// Option list for `level`, narrowed to `parent` (`None` for the root level).
    async fn fetch_options(
        &self,
        level: CascadeLevel,
        parent: Option<&str>,
    ) -> Result<Vec<OptionItem>, BackendError>;

    // Identifiers
    async fn next_sequence(&self, category_code: &str) -> Result<String, BackendError>;

    // Business uniqueness
    async fn check_unique(
        &self,
        field: &str,
        value: &str,
    ) -> Result<UniquenessCheck, BackendError>;

    // Persistence
    async fn save(&self, record: &JobCardRecord) -> Result<SaveOutcome, BackendError>;
}
