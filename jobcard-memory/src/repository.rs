use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jobcard_core::backend::UniquenessCheck;
use jobcard_core::fields;
use jobcard_core::{
    BackendError, CascadeLevel, JobCardBackend, JobCardRecord, OptionItem, SaveOutcome,
};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Store {
    /// Option lists keyed by level and the selection of the level above.
    options: HashMap<(CascadeLevel, Option<String>), Vec<OptionItem>>,
    /// Highest sequence number issued or saved per category.
    sequences: HashMap<String, u32>,
    /// Saved job cards keyed by job number.
    records: BTreeMap<String, JobCardRecord>,
}

/// Process-local backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one option under `parent` at `level`. Root (customer) rows have no
    /// parent. An option already listed under the same parent is skipped.
    pub fn add_option(
        &self,
        level: CascadeLevel,
        parent: Option<&str>,
        item: OptionItem,
    ) -> Result<(), BackendError> {
        let mut store = self.lock()?;
        let list = store
            .options
            .entry((level, parent.map(str::to_string)))
            .or_default();
        if !list.iter().any(|existing| existing.value == item.value) {
            list.push(item);
        }
        Ok(())
    }

    /// Every saved record, ordered by job number.
    pub fn records(&self) -> Result<Vec<JobCardRecord>, BackendError> {
        Ok(self.lock()?.records.values().cloned().collect())
    }

    pub fn record(
        &self,
        job_number: &str,
    ) -> Result<JobCardRecord, BackendError> {
        self.lock()?
            .records
            .get(job_number)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, BackendError> {
        self.store
            .lock()
            .map_err(|e| BackendError::Transport(format!("memory store poisoned: {e}")))
    }
}

#[async_trait]
impl JobCardBackend for MemoryBackend {
    async fn fetch_options(
        &self,
        level: CascadeLevel,
        parent: Option<&str>,
    ) -> Result<Vec<OptionItem>, BackendError> {
        let store = self.lock()?;
        let options = store
            .options
            .get(&(level, parent.map(str::to_string)))
            .cloned()
            .unwrap_or_default();
        debug!(%level, ?parent, count = options.len(), "options fetched");
        Ok(options)
    }

    async fn next_sequence(
        &self,
        category_code: &str,
    ) -> Result<String, BackendError> {
        let category = category_code.trim();
        if category.is_empty() {
            return Err(BackendError::Rejected("category code is blank".to_string()));
        }
        let mut store = self.lock()?;
        let highest = store.sequences.entry(category.to_string()).or_insert(0);
        // Issued numbers are reserved so two open forms never share one.
        let next = highest.checked_add(1).ok_or_else(|| {
            BackendError::Rejected(format!("category {category} has no sequence numbers left"))
        })?;
        *highest = next;
        debug!(category, next, "sequence number reserved");
        Ok(format!("{next:03}"))
    }

    async fn check_unique(
        &self,
        field: &str,
        value: &str,
    ) -> Result<UniquenessCheck, BackendError> {
        let wanted = value.trim();
        let store = self.lock()?;
        let clash = store.records.values().find(|record| {
            record
                .fields
                .get(field)
                .is_some_and(|saved| saved.trim().eq_ignore_ascii_case(wanted))
        });

        Ok(match clash {
            Some(record) => UniquenessCheck::conflict_with(
                record.job_number.clone(),
                format!("'{wanted}' is already used by job {}", record.job_number),
            ),
            None => UniquenessCheck::unique(),
        })
    }

    async fn save(
        &self,
        record: &JobCardRecord,
    ) -> Result<SaveOutcome, BackendError> {
        let job_number = record.job_number.trim();
        if job_number.is_empty() {
            return Ok(SaveOutcome::failure("Job number is blank"));
        }

        let mut store = self.lock()?;

        let category = fields::value(&record.fields, fields::CATEGORY).to_string();
        if let Ok(sequence) = fields::value(&record.fields, fields::SEQUENCE).parse::<u32>() {
            let highest = store.sequences.entry(category).or_insert(0);
            *highest = (*highest).max(sequence);
        }

        let replaced = store
            .records
            .insert(job_number.to_string(), record.clone())
            .is_some();

        if replaced {
            info!(job_number, "job card updated");
            Ok(SaveOutcome::success(format!("Job card {job_number} updated")))
        } else {
            info!(job_number, "job card saved");
            Ok(SaveOutcome::success(format!("Job card {job_number} saved")))
        }
    }
}
