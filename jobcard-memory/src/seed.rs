use std::io::Read;

use jobcard_core::{BackendError, CascadeLevel, OptionItem};
use serde::Deserialize;
use thiserror::Error;

use crate::MemoryBackend;

/// Errors that can occur when loading option seed rows.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("unknown option level '{0}'")]
    UnknownLevel(String),

    #[error("{level} option '{value}' needs a parent")]
    MissingParent { level: CascadeLevel, value: String },

    #[error("customer option '{0}' cannot have a parent")]
    UnexpectedParent(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl From<csv::Error> for SeedError {
    fn from(err: csv::Error) -> Self {
        SeedError::CsvParse(err.to_string())
    }
}

/// One row of an option seed file: `level,parent,value,label`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OptionSeedRecord {
    pub level: String,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub parent: Option<String>,
    pub value: String,
    #[serde(default)]
    pub label: String,
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// Loads dropdown options for the customer cascade from CSV.
///
/// The `parent` column holds the selection of the level above; it is empty
/// for customer rows. A blank `label` falls back to the value.
///
/// ```text
/// level,parent,value,label
/// customer,,ACME,Acme Ltd
/// address,ACME,HQ,Head office
/// contact_person,HQ,Asha,Asha Rao
/// ```
pub struct OptionSeedLoader;

impl OptionSeedLoader {
    /// Parse seed rows from any reader (a file, a byte slice).
    pub fn parse<R: Read>(reader: R) -> Result<Vec<OptionSeedRecord>, SeedError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: OptionSeedRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Add every row to `backend`. Returns the number of rows applied.
    ///
    /// Rows are checked before anything is added, so a bad file leaves the
    /// backend untouched.
    pub fn load(
        backend: &MemoryBackend,
        records: &[OptionSeedRecord],
    ) -> Result<usize, SeedError> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let level = CascadeLevel::parse(record.level.trim())
                .ok_or_else(|| SeedError::UnknownLevel(record.level.clone()))?;
            match (level, record.parent.as_deref()) {
                (CascadeLevel::Customer, Some(_)) => {
                    return Err(SeedError::UnexpectedParent(record.value.clone()));
                }
                (CascadeLevel::Customer, None) | (_, Some(_)) => {}
                (_, None) => {
                    return Err(SeedError::MissingParent {
                        level,
                        value: record.value.clone(),
                    });
                }
            }

            let value = record.value.trim();
            let label = match record.label.trim() {
                "" => value,
                label => label,
            };
            rows.push((level, record.parent.as_deref(), OptionItem::new(value, label)));
        }

        let count = rows.len();
        for (level, parent, item) in rows {
            backend.add_option(level, parent, item)?;
        }
        Ok(count)
    }
}
