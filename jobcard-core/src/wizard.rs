//! Multi-step form navigation.
//!
//! The [`StepController`] owns the [`WizardState`] and is the only thing that
//! changes it. Moving forward is gated twice:
//!
//! 1. the step's required fields must pass the [`SchemaValidator`];
//! 2. if the step has a unique field (e.g. the job description), the backend
//!    must report no conflict for its current value.
//!
//! Either failure leaves the state exactly as it was; the operator corrects
//! the input and tries again. Moving backwards is never gated, so before a
//! card is saved [`StepController::verify_all`] runs every step's gates again.
//!
//! While a saved card is being edited, a uniqueness conflict with that same
//! card is not a conflict.
//!
//! # Example
//!
//! ```
//! use jobcard_core::wizard::{StepPlan, StepRule, WizardState};
//!
//! let plan = StepPlan::new(vec![
//!     StepRule::new("Job", &["category", "job_description"]).unique("job_description"),
//!     StepRule::new("Label", &["width", "height"]),
//!     StepRule::new("Review", &[]),
//! ]);
//!
//! assert_eq!(plan.step_count(), 3);
//! assert_eq!(WizardState::default().active_step(), 1);
//! ```

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, JobCardBackend, SchemaValidator};
use crate::fields::{self, FieldValues};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    /// One or more required fields failed validation.
    #[error("step {step} has {} invalid field(s)", .errors.len())]
    Validation {
        step: u32,
        errors: BTreeMap<String, String>,
    },

    /// A business-uniqueness check found an existing record.
    #[error("{message}")]
    Duplicate {
        step: u32,
        field: String,
        message: String,
    },

    /// The uniqueness check itself could not be completed.
    #[error("could not verify step {step}: {source}")]
    Collaborator {
        step: u32,
        #[source]
        source: BackendError,
    },

    #[error("step {step} is outside the wizard (1..={step_count})")]
    OutOfRange { step: u32, step_count: u32 },
}

/// Where the wizard is and which steps have been passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    active_step: u32,
    completed_steps: BTreeSet<u32>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            active_step: 1,
            completed_steps: BTreeSet::new(),
        }
    }
}

impl WizardState {
    pub fn active_step(&self) -> u32 {
        self.active_step
    }

    pub fn completed_steps(&self) -> &BTreeSet<u32> {
        &self.completed_steps
    }

    pub fn is_completed(
        &self,
        step: u32,
    ) -> bool {
        self.completed_steps.contains(&step)
    }
}

/// Requirements for leaving one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRule {
    pub title: String,
    pub required_fields: Vec<String>,
    /// Field whose value must be unique across saved records.
    pub unique_field: Option<String>,
}

impl StepRule {
    pub fn new(
        title: &str,
        required_fields: &[&str],
    ) -> Self {
        Self {
            title: title.to_string(),
            required_fields: required_fields.iter().map(|f| f.to_string()).collect(),
            unique_field: None,
        }
    }

    pub fn unique(
        mut self,
        field: &str,
    ) -> Self {
        self.unique_field = Some(field.to_string());
        self
    }
}

/// Ordered step rules; step numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    steps: Vec<StepRule>,
}

impl StepPlan {
    pub fn new(steps: Vec<StepRule>) -> Self {
        Self { steps }
    }

    /// The four cards of the label job card form.
    pub fn job_card() -> Self {
        Self::new(vec![
            StepRule::new(
                "Job details",
                &[fields::CATEGORY, fields::JOB_DESCRIPTION, fields::CUSTOMER],
            )
            .unique(fields::JOB_DESCRIPTION),
            StepRule::new(
                "Label specification",
                &[fields::WIDTH, fields::HEIGHT, fields::COLOR_COUNT],
            ),
            StepRule::new(
                "Run parameters",
                &[
                    fields::QUANTITY,
                    fields::CYLINDER_TEETH,
                    fields::UPS_ACROSS,
                    fields::UPS_ALONG,
                ],
            ),
            StepRule::new(
                "Warranty",
                &[fields::WARRANTY_STATUS, fields::WARRANTY_START],
            ),
        ])
    }

    pub fn step_count(&self) -> u32 {
        u32::try_from(self.steps.len()).unwrap_or(u32::MAX)
    }

    pub fn rule(
        &self,
        step: u32,
    ) -> Option<&StepRule> {
        let index = usize::try_from(step.checked_sub(1)?).ok()?;
        self.steps.get(index)
    }
}

/// Result of a successful forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    Advanced { from: u32, to: u32 },
    /// The final step passed; there is nowhere further to go.
    Finished { step: u32 },
}

pub struct StepController {
    plan: StepPlan,
    state: WizardState,
    focus: Option<String>,
    /// Job number of the saved card being edited.
    editing: Option<String>,
}

impl StepController {
    pub fn new(plan: StepPlan) -> Self {
        Self {
            plan,
            state: WizardState::default(),
            focus: None,
            editing: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    /// Field the UI should focus after a duplicate conflict.
    pub fn focus_intent(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Marks the form as editing the saved card `job_number`; `None` for a new card.
    pub fn set_editing(
        &mut self,
        job_number: Option<String>,
    ) {
        self.editing = job_number;
    }

    /// Tries to leave `current_step`.
    ///
    /// Validates `required_fields`, runs the step's uniqueness check if it has
    /// one, then moves to the next step and marks `current_step` completed.
    /// Leaving the final step marks it completed without moving.
    ///
    /// # Errors
    ///
    /// * [`StepError::Validation`] – a required field is missing or invalid.
    /// * [`StepError::Duplicate`] – the unique field's value already exists.
    /// * [`StepError::Collaborator`] – the uniqueness check failed to run.
    /// * [`StepError::OutOfRange`] – `current_step` is not a step of the plan.
    ///
    /// The wizard state is unchanged on every error.
    pub async fn advance(
        &mut self,
        current_step: u32,
        required_fields: &[&str],
        values: &FieldValues,
        validator: &dyn SchemaValidator,
        backend: &dyn JobCardBackend,
    ) -> Result<StepTransition, StepError> {
        let step_count = self.plan.step_count();
        let Some(unique_field) = self.plan.rule(current_step).map(|rule| rule.unique_field.clone())
        else {
            return Err(StepError::OutOfRange {
                step: current_step,
                step_count,
            });
        };

        self.check_step(current_step, unique_field, required_fields, values, validator, backend)
            .await?;

        self.focus = None;
        self.state.completed_steps.insert(current_step);

        if current_step < step_count {
            self.state.active_step = current_step + 1;
            info!(from = current_step, to = current_step + 1, "wizard advanced");
            Ok(StepTransition::Advanced {
                from: current_step,
                to: current_step + 1,
            })
        } else {
            self.state.active_step = current_step;
            info!(step = current_step, "wizard finished");
            Ok(StepTransition::Finished { step: current_step })
        }
    }

    /// Re-runs every step's gates against `values` without moving.
    ///
    /// Used right before saving: a step passed earlier may have been edited
    /// after the operator jumped back to it. On success every step is marked
    /// completed. On failure the failing step becomes active and it and every
    /// later step lose their completed mark, so the operator has to pass them
    /// again.
    pub async fn verify_all(
        &mut self,
        values: &FieldValues,
        validator: &dyn SchemaValidator,
        backend: &dyn JobCardBackend,
    ) -> Result<(), StepError> {
        for step in 1..=self.plan.step_count() {
            let Some(rule) = self.plan.rule(step).cloned() else {
                continue;
            };
            let required: Vec<&str> = rule.required_fields.iter().map(String::as_str).collect();

            if let Err(error) = self
                .check_step(step, rule.unique_field, &required, values, validator, backend)
                .await
            {
                self.state.completed_steps.retain(|&done| done < step);
                self.state.active_step = step;
                debug!(step, %error, "step no longer passes");
                return Err(error);
            }
        }

        self.focus = None;
        self.state.completed_steps = (1..=self.plan.step_count()).collect();
        Ok(())
    }

    /// Validation plus the uniqueness check for one step. Only `focus` changes.
    async fn check_step(
        &mut self,
        step: u32,
        unique_field: Option<String>,
        required_fields: &[&str],
        values: &FieldValues,
        validator: &dyn SchemaValidator,
        backend: &dyn JobCardBackend,
    ) -> Result<(), StepError> {
        let report = validator.validate(required_fields, values);
        if !report.is_valid() {
            debug!(step, errors = ?report.errors, "step validation failed");
            return Err(StepError::Validation {
                step,
                errors: report.errors,
            });
        }

        let Some(field) = unique_field else {
            return Ok(());
        };
        let value = fields::value(values, &field);
        if value.is_empty() {
            return Ok(());
        }

        let check = backend.check_unique(&field, value).await.map_err(|source| {
            warn!(step, %field, %source, "uniqueness check failed");
            StepError::Collaborator { step, source }
        })?;
        let own_card = self.editing.is_some() && check.job_number == self.editing;
        if check.conflict && !own_card {
            let message = check
                .message
                .unwrap_or_else(|| format!("{value} already exists"));
            debug!(step, %field, %message, "duplicate value");
            self.focus = Some(field.clone());
            return Err(StepError::Duplicate {
                step,
                field,
                message,
            });
        }
        Ok(())
    }

    /// Advances from the active step using the plan's required fields.
    pub async fn advance_active(
        &mut self,
        values: &FieldValues,
        validator: &dyn SchemaValidator,
        backend: &dyn JobCardBackend,
    ) -> Result<StepTransition, StepError> {
        let current = self.state.active_step;
        let required: Vec<String> = self
            .plan
            .rule(current)
            .map(|rule| rule.required_fields.clone())
            .unwrap_or_default();
        let required: Vec<&str> = required.iter().map(String::as_str).collect();

        self.advance(current, &required, values, validator, backend)
            .await
    }

    /// Moves back one step from `current_step`. Returns whether it moved;
    /// the first step and steps outside the plan stay put.
    pub fn retreat(
        &mut self,
        current_step: u32,
    ) -> bool {
        if current_step <= 1 || current_step > self.plan.step_count() {
            return false;
        }
        self.state.active_step = current_step - 1;
        debug!(to = self.state.active_step, "wizard retreated");
        true
    }

    /// Opens `step` directly if it was completed or lies behind the active step.
    pub fn jump_to(
        &mut self,
        step: u32,
    ) -> bool {
        let allowed =
            step >= 1 && (self.state.is_completed(step) || step < self.state.active_step);
        if allowed {
            self.state.active_step = step;
            debug!(to = step, "wizard jumped");
        }
        allowed
    }

    pub fn reset(&mut self) {
        self.state = WizardState::default();
        self.focus = None;
        self.editing = None;
    }
}
