//! One open job card form.
//!
//! A [`JobCardSession`] owns every piece of per-form state: the raw field
//! values, the wizard, the warranty term, the identifier components, the
//! option cascade and the serial list. Field changes come in through
//! [`JobCardSession::set_field`], which recomputes exactly the derived values
//! that change invalidates before returning.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo(backend: std::sync::Arc<dyn jobcard_core::JobCardBackend>) {
//! use jobcard_core::fields;
//! use jobcard_core::session::JobCardSession;
//!
//! let mut session = JobCardSession::job_card(backend);
//! session.open().await;
//! session.set_field(fields::CATEGORY, "PP").await;
//! session.set_field(fields::COLOR_COUNT, "3").await;
//!
//! println!("serial: {}", session.derived().serial_number);
//! # }
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, FieldSchema, JobCardBackend, SchemaValidator};
use crate::calculations::common::{parse_decimal, parse_leading_int};
use crate::calculations::{IdentifierComponents, RunEstimateInput, WarrantyTerm, days_to_duration};
use crate::cascade::{CascadeLevel, DependentOptionSet, OptionCascade};
use crate::fields::{self, FieldValues};
use crate::models::{JobCardRecord, LengthUnit, Notice, SaveOutcome, WarrantyStatus};
use crate::serials::{SerialListError, SerialNumberList};
use crate::wizard::{StepController, StepError, StepPlan, StepTransition, WizardState};

/// Date format used by the warranty start field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error("step {active} of {total} is still open")]
    Incomplete { active: u32, total: u32 },

    #[error("save rejected: {0}")]
    SaveRejected(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Serials(#[from] SerialListError),
}

/// Values the form shows but the operator does not type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedFields {
    pub expiry_date: Option<NaiveDate>,
    /// Warranty length in words, e.g. `"1 year"`.
    pub warranty_duration: String,
    pub job_number: String,
    pub serial_number: String,
    pub meters: Option<String>,
}

pub struct JobCardSession {
    backend: Arc<dyn JobCardBackend>,
    validator: Box<dyn SchemaValidator>,
    controller: StepController,
    cascade: OptionCascade,
    values: FieldValues,
    warranty: WarrantyTerm,
    identifiers: IdentifierComponents,
    meters: Option<String>,
    serials: SerialNumberList,
}

impl JobCardSession {
    pub fn new(
        backend: Arc<dyn JobCardBackend>,
        plan: StepPlan,
        validator: Box<dyn SchemaValidator>,
    ) -> Self {
        Self {
            cascade: OptionCascade::new(backend.clone()),
            backend,
            validator,
            controller: StepController::new(plan),
            values: FieldValues::new(),
            warranty: WarrantyTerm::default(),
            identifiers: IdentifierComponents::default(),
            meters: None,
            serials: SerialNumberList::new(),
        }
    }

    /// Session with the standard job card steps and schema.
    pub fn job_card(backend: Arc<dyn JobCardBackend>) -> Self {
        Self::new(backend, StepPlan::job_card(), Box::new(FieldSchema::job_card()))
    }

    /// Loads the root customer list. Call once when the form is shown.
    pub async fn open(&mut self) -> Vec<Notice> {
        self.cascade.load_root().await
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn wizard(&self) -> &WizardState {
        self.controller.state()
    }

    pub fn focus_intent(&self) -> Option<&str> {
        self.controller.focus_intent()
    }

    pub fn options(&self) -> &DependentOptionSet {
        self.cascade.state()
    }

    pub fn warranty(&self) -> &WarrantyTerm {
        &self.warranty
    }

    pub fn serials(&self) -> &SerialNumberList {
        &self.serials
    }

    pub fn derived(&self) -> DerivedFields {
        DerivedFields {
            expiry_date: self.warranty.expiry_date(),
            warranty_duration: self.warranty.days().map(days_to_duration).unwrap_or_default(),
            job_number: self.identifiers.job_number(),
            serial_number: self.identifiers.serial_number(),
            meters: self.meters.clone(),
        }
    }

    /// Records a field change and updates whatever depends on it.
    ///
    /// Problems that the operator should hear about (a failed lookup, a value
    /// the form cannot accept) come back as notices; the form stays usable.
    pub async fn set_field(
        &mut self,
        name: &str,
        value: &str,
    ) -> Vec<Notice> {
        self.values.insert(name.to_string(), value.to_string());
        let value = value.trim();
        let mut notices = Vec::new();

        match name {
            fields::CATEGORY => notices.extend(self.category_changed(value).await),
            fields::SEQUENCE => self.identifiers.sequence_number = value.to_string(),
            fields::COLOR_COUNT => {
                self.identifiers.color_count =
                    parse_leading_int(value).and_then(|n| u32::try_from(n).ok());
                self.recompute_meters();
            }
            fields::WIDTH => self.identifiers.width = parse_decimal(value),
            fields::HEIGHT => self.identifiers.height = parse_decimal(value),
            fields::UNIT => match LengthUnit::parse(value) {
                Some(unit) => self.identifiers.unit = unit,
                None if value.is_empty() => self.identifiers.unit = LengthUnit::default(),
                None => notices.push(Notice::warning(format!(
                    "Unknown unit '{value}'; keeping {}",
                    self.identifiers.unit.suffix()
                ))),
            },
            fields::MATERIAL => self.identifiers.material_code = value.to_string(),
            fields::UPS => self.identifiers.ups_code = value.to_string(),
            fields::CORE => self.identifiers.core_code = value.to_string(),
            fields::CUT => self.identifiers.cut = fields::parse_flag(value),
            fields::PERFORATION => self.identifiers.perforation = fields::parse_flag(value),
            fields::QUANTITY => {
                self.recompute_meters();
                notices.extend(self.quantity_changed(value));
            }
            fields::CYLINDER_TEETH | fields::UPS_ACROSS | fields::UPS_ALONG => {
                self.recompute_meters()
            }
            // Operator override of the estimate.
            fields::METERS => self.meters = (!value.is_empty()).then(|| value.to_string()),
            fields::WARRANTY_STATUS => notices.extend(self.warranty_status_changed(value)),
            fields::WARRANTY_START => notices.extend(self.warranty_start_changed(value)),
            fields::WARRANTY_DAYS => {
                if let Err(error) = self.warranty.set_days_input(value) {
                    notices.push(Notice::warning(error.to_string()));
                    self.sync_warranty_days();
                }
            }
            _ => {
                if let Some(level) = CascadeLevel::parse(name) {
                    notices.extend(self.cascade_changed(level, value).await);
                }
            }
        }

        notices
    }

    /// Leaves the active step if its fields pass validation.
    pub async fn advance(&mut self) -> Result<StepTransition, StepError> {
        self.controller
            .advance_active(&self.values, self.validator.as_ref(), self.backend.as_ref())
            .await
    }

    pub fn retreat(&mut self) -> bool {
        let active = self.controller.state().active_step();
        self.controller.retreat(active)
    }

    pub fn jump_to(
        &mut self,
        step: u32,
    ) -> bool {
        self.controller.jump_to(step)
    }

    pub fn add_serial(
        &mut self,
        serial: &str,
    ) -> Result<(), SerialListError> {
        self.serials.append(serial)
    }

    pub fn remove_serial(
        &mut self,
        serial: &str,
    ) -> Result<(), SerialListError> {
        self.serials.remove(serial)
    }

    /// Builds the record that would be saved right now.
    pub fn assemble(&self) -> JobCardRecord {
        let options = self.cascade.state();
        let selection = |level| options.selection(level).map(str::to_string);

        JobCardRecord {
            job_number: self.identifiers.job_number(),
            serial_number: self.identifiers.serial_number(),
            customer: selection(CascadeLevel::Customer),
            address: selection(CascadeLevel::Address),
            contact_person: selection(CascadeLevel::ContactPerson),
            contact_number: selection(CascadeLevel::ContactNumber),
            email: selection(CascadeLevel::Email),
            meters: self.meters.clone(),
            warranty: self.warranty.snapshot(),
            serials: self.serials.as_slice().to_vec(),
            fields: self.values.clone(),
        }
    }

    /// Re-checks every step and hands the assembled record to the backend.
    ///
    /// After a successful save the session treats the card as opened for
    /// editing, so submitting again updates it.
    ///
    /// # Errors
    ///
    /// * [`SessionError::Incomplete`] – the wizard is not on its final step.
    /// * [`SessionError::Step`] – some step no longer passes; the wizard moves
    ///   back to it.
    /// * [`SessionError::SaveRejected`] – the backend answered with status `F`.
    /// * [`SessionError::Backend`] – the save call itself failed.
    pub async fn submit(&mut self) -> Result<SaveOutcome, SessionError> {
        let total = self.controller.plan().step_count();
        let active = self.controller.state().active_step();
        if active != total {
            return Err(SessionError::Incomplete { active, total });
        }

        self.controller
            .verify_all(&self.values, self.validator.as_ref(), self.backend.as_ref())
            .await?;

        let record = self.assemble();
        let outcome = self.backend.save(&record).await?;
        if outcome.is_success() {
            info!(job_number = %record.job_number, "job card saved");
            self.controller.set_editing(Some(record.job_number));
            Ok(outcome)
        } else {
            warn!(job_number = %record.job_number, message = %outcome.message, "save rejected");
            Err(SessionError::SaveRejected(outcome.message))
        }
    }

    /// Opens a saved record for editing.
    ///
    /// Fields are replayed in dependency order: the warranty status before the
    /// day count it would otherwise reset, the run inputs before a meters
    /// override, and the customer chain from the root down. The saved sequence
    /// number is kept rather than fetching a new one.
    pub async fn load_record(
        &mut self,
        record: &JobCardRecord,
    ) -> Vec<Notice> {
        const DEFERRED: [&str; 2] = [fields::WARRANTY_DAYS, fields::METERS];

        self.reset();
        let mut notices = self.open().await;

        let saved = |name: &str| record.fields.get(name).map(String::as_str);

        self.identifiers.category_code = saved(fields::CATEGORY).unwrap_or_default().trim().to_string();
        if let Some(category) = saved(fields::CATEGORY) {
            self.values.insert(fields::CATEGORY.to_string(), category.to_string());
        }
        if let Some(status) = saved(fields::WARRANTY_STATUS) {
            notices.extend(self.set_field(fields::WARRANTY_STATUS, status).await);
        }

        for (name, value) in &record.fields {
            let name = name.as_str();
            let skip = name == fields::CATEGORY
                || name == fields::WARRANTY_STATUS
                || DEFERRED.contains(&name)
                || CascadeLevel::parse(name).is_some();
            if !skip {
                notices.extend(self.set_field(name, value).await);
            }
        }

        if let Some(days) = saved(fields::WARRANTY_DAYS) {
            if self.warranty.days_editable() {
                notices.extend(self.set_field(fields::WARRANTY_DAYS, days).await);
            }
        }
        if let Some(meters) = saved(fields::METERS) {
            notices.extend(self.set_field(fields::METERS, meters).await);
        }

        let selections: Vec<(CascadeLevel, String)> = CascadeLevel::ALL
            .into_iter()
            .filter_map(|level| saved(level.as_str()).map(|v| (level, v.to_string())))
            .collect();
        notices.extend(self.cascade.restore(&selections).await);
        for (level, value) in selections {
            self.values.insert(level.as_str().to_string(), value);
        }

        for serial in &record.serials {
            if let Err(error) = self.serials.append(serial) {
                notices.push(Notice::warning(error.to_string()));
            }
        }

        self.controller.set_editing(Some(record.job_number.clone()));
        debug!(job_number = %record.job_number, "record loaded for editing");
        notices
    }

    /// Discards everything entered so far.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.cascade.clear();
        self.values.clear();
        self.warranty.clear();
        self.identifiers = IdentifierComponents::default();
        self.meters = None;
        self.serials = SerialNumberList::new();
    }

    async fn category_changed(
        &mut self,
        category: &str,
    ) -> Option<Notice> {
        self.identifiers.category_code = category.to_string();
        self.identifiers.sequence_number.clear();
        self.values.remove(fields::SEQUENCE);

        if category.is_empty() {
            return None;
        }

        match self.backend.next_sequence(category).await {
            Ok(sequence) => {
                debug!(category, %sequence, "sequence number issued");
                self.identifiers.sequence_number = sequence.clone();
                self.values.insert(fields::SEQUENCE.to_string(), sequence);
                None
            }
            Err(error) => {
                warn!(category, %error, "could not fetch next sequence number");
                Some(Notice::error(format!(
                    "Could not fetch the next number for category {category}: {error}"
                )))
            }
        }
    }

    fn quantity_changed(
        &mut self,
        quantity: &str,
    ) -> Option<Notice> {
        let capacity = parse_decimal(quantity)
            .filter(|q| !q.is_sign_negative())
            .and_then(|q| q.trunc().to_usize());
        self.serials
            .set_capacity(capacity)
            .err()
            .map(|error| Notice::warning(error.to_string()))
    }

    fn recompute_meters(&mut self) {
        let input = RunEstimateInput::from_text(
            fields::value(&self.values, fields::QUANTITY),
            fields::value(&self.values, fields::CYLINDER_TEETH),
            fields::value(&self.values, fields::UPS_ACROSS),
            fields::value(&self.values, fields::UPS_ALONG),
            fields::value(&self.values, fields::COLOR_COUNT),
        );
        self.meters = match input.calculate() {
            Ok(estimate) => Some(estimate.meters_display()),
            Err(guard) => {
                debug!(%guard, "run estimate left blank");
                None
            }
        };
    }

    fn warranty_status_changed(
        &mut self,
        value: &str,
    ) -> Option<Notice> {
        if value.is_empty() {
            return None;
        }
        let Some(status) = WarrantyStatus::parse(value) else {
            return Some(Notice::warning(format!("Unknown warranty status '{value}'")));
        };
        self.warranty.set_status(status);
        self.sync_warranty_days();
        None
    }

    fn warranty_start_changed(
        &mut self,
        value: &str,
    ) -> Option<Notice> {
        if value.is_empty() {
            self.warranty.set_start_date(None);
            return None;
        }
        match NaiveDate::parse_from_str(value, DATE_FORMAT) {
            Ok(date) => {
                self.warranty.set_start_date(Some(date));
                None
            }
            Err(error) => {
                debug!(value, %error, "unreadable warranty start date");
                self.warranty.set_start_date(None);
                Some(Notice::warning(format!("'{value}' is not a date (YYYY-MM-DD)")))
            }
        }
    }

    async fn cascade_changed(
        &mut self,
        level: CascadeLevel,
        value: &str,
    ) -> Vec<Notice> {
        if level.is_leaf() {
            self.cascade.change_leaf(level, value);
            return Vec::new();
        }

        let previous = self.cascade.state().selection(level).map(str::to_string);
        let notices = self.cascade.change(level, value).await;
        if previous.as_deref() != self.cascade.state().selection(level) {
            for descendant in level.descendants() {
                self.values.remove(descendant.as_str());
            }
        }
        notices
    }

    /// Mirrors the term's day count back into the raw field values.
    fn sync_warranty_days(&mut self) {
        match self.warranty.days() {
            Some(days) => {
                self.values
                    .insert(fields::WARRANTY_DAYS.to_string(), days.to_string());
            }
            None => {
                self.values.remove(fields::WARRANTY_DAYS);
            }
        }
    }
}
