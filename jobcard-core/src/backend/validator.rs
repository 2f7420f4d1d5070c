//! Field-level schema validation.
//!
//! The wizard asks a [`SchemaValidator`] whether the fields a step requires
//! are acceptable before it lets the operator leave that step. [`FieldSchema`]
//! is the rule-based implementation used by the session; callers with their
//! own validation layer can plug in any other implementation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::calculations::common::{parse_decimal, parse_leading_int};
use crate::fields::{self, FieldValues};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Outcome of validating a set of fields. Errors are keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub trait SchemaValidator: Send + Sync {
    /// Validates each of `field_names` against `values`.
    fn validate(
        &self,
        field_names: &[&str],
        values: &FieldValues,
    ) -> ValidationReport;
}

/// A single constraint on a form field.
#[derive(Debug, Clone)]
pub enum FieldRule {
    Required,
    Decimal,
    /// Whole number, optionally bounded (inclusive).
    Integer { min: Option<i64>, max: Option<i64> },
    Email,
    Pattern { regex: Regex, message: String },
}

impl FieldRule {
    /// Checks a non-blank value, returning the message on failure.
    fn check(
        &self,
        label: &str,
        value: &str,
    ) -> Option<String> {
        match self {
            FieldRule::Required => None,
            FieldRule::Decimal => parse_decimal(value)
                .is_none()
                .then(|| format!("{label} must be a valid number")),
            FieldRule::Integer { min, max } => {
                let whole = parse_leading_int(value).filter(|n| n.to_string() == value);
                match whole {
                    None => Some(format!("{label} must be a whole number")),
                    Some(n) if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) => {
                        Some(format!("{label} is out of range"))
                    }
                    Some(_) => None,
                }
            }
            FieldRule::Email => (!EMAIL_PATTERN.is_match(value))
                .then(|| format!("{label} must be a valid email address")),
            FieldRule::Pattern { regex, message } => {
                (!regex.is_match(value)).then(|| message.clone())
            }
        }
    }
}

/// Rule table keyed by field name.
///
/// A field that is validated without any registered rules is treated as
/// simply required.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    rules: BTreeMap<String, Vec<FieldRule>>,
    labels: BTreeMap<String, String>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `rule` to the rules for `field`.
    pub fn rule(
        mut self,
        field: &str,
        rule: FieldRule,
    ) -> Self {
        self.rules.entry(field.to_string()).or_default().push(rule);
        self
    }

    /// Sets the human-readable name used in messages for `field`.
    pub fn label(
        mut self,
        field: &str,
        label: &str,
    ) -> Self {
        self.labels.insert(field.to_string(), label.to_string());
        self
    }

    /// Schema for the standard job card form.
    pub fn job_card() -> Self {
        Self::new()
            .rule(fields::CATEGORY, FieldRule::Required)
            .rule(fields::JOB_DESCRIPTION, FieldRule::Required)
            .label(fields::JOB_DESCRIPTION, "Job description")
            .rule(fields::CUSTOMER, FieldRule::Required)
            .rule(fields::QUANTITY, FieldRule::Required)
            .rule(fields::QUANTITY, FieldRule::Decimal)
            .rule(fields::WIDTH, FieldRule::Required)
            .rule(fields::WIDTH, FieldRule::Decimal)
            .rule(fields::HEIGHT, FieldRule::Required)
            .rule(fields::HEIGHT, FieldRule::Decimal)
            .rule(fields::CYLINDER_TEETH, FieldRule::Required)
            .rule(fields::CYLINDER_TEETH, FieldRule::Decimal)
            .label(fields::CYLINDER_TEETH, "Cylinder teeth")
            .rule(fields::UPS_ACROSS, FieldRule::Required)
            .rule(fields::UPS_ACROSS, FieldRule::Decimal)
            .label(fields::UPS_ACROSS, "Ups across")
            .rule(fields::UPS_ALONG, FieldRule::Required)
            .rule(fields::UPS_ALONG, FieldRule::Decimal)
            .label(fields::UPS_ALONG, "Ups along")
            .rule(
                fields::COLOR_COUNT,
                FieldRule::Integer {
                    min: Some(0),
                    max: Some(9),
                },
            )
            .label(fields::COLOR_COUNT, "Colour count")
            .rule(fields::WARRANTY_STATUS, FieldRule::Required)
            .label(fields::WARRANTY_STATUS, "Warranty status")
            .rule(fields::WARRANTY_START, FieldRule::Required)
            .rule(
                fields::WARRANTY_START,
                FieldRule::Pattern {
                    regex: Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"),
                    message: "Warranty start must be a date (YYYY-MM-DD)".to_string(),
                },
            )
            .label(fields::WARRANTY_START, "Warranty start")
            .rule(fields::EMAIL, FieldRule::Email)
    }

    fn label_for<'a>(
        &'a self,
        field: &'a str,
    ) -> std::borrow::Cow<'a, str> {
        match self.labels.get(field) {
            Some(label) => label.as_str().into(),
            None => {
                let mut chars = field.chars();
                match chars.next() {
                    Some(first) => {
                        format!("{}{}", first.to_uppercase(), chars.as_str().replace('_', " "))
                            .into()
                    }
                    None => field.into(),
                }
            }
        }
    }
}

impl SchemaValidator for FieldSchema {
    fn validate(
        &self,
        field_names: &[&str],
        values: &FieldValues,
    ) -> ValidationReport {
        const DEFAULT_RULES: &[FieldRule] = &[FieldRule::Required];

        let mut report = ValidationReport::default();

        for &name in field_names {
            let rules = self.rules.get(name).map_or(DEFAULT_RULES, Vec::as_slice);
            let value = fields::value(values, name);
            let label = self.label_for(name);

            let message = if value.is_empty() {
                rules
                    .iter()
                    .any(|r| matches!(r, FieldRule::Required))
                    .then(|| format!("{label} is required"))
            } else {
                rules.iter().find_map(|r| r.check(&label, value))
            };

            if let Some(message) = message {
                report.errors.insert(name.to_string(), message);
            }
        }

        report
    }
}
