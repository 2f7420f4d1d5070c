//! Form field names shared by the session, the validator and the backend.
//!
//! Raw values travel as text keyed by these names; the typed models are
//! derived from them.

use std::collections::BTreeMap;

/// Raw form values keyed by field name.
pub type FieldValues = BTreeMap<String, String>;

// Job identity
pub const CATEGORY: &str = "category";
pub const SEQUENCE: &str = "sequence";
pub const JOB_DESCRIPTION: &str = "job_description";

// Label specification
pub const COLOR_COUNT: &str = "color_count";
pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const UNIT: &str = "unit";
pub const MATERIAL: &str = "material";
pub const UPS: &str = "ups";
pub const CORE: &str = "core";
pub const CUT: &str = "cut";
pub const PERFORATION: &str = "perforation";

// Run parameters
pub const QUANTITY: &str = "quantity";
pub const CYLINDER_TEETH: &str = "cylinder_teeth";
pub const UPS_ACROSS: &str = "ups_across";
pub const UPS_ALONG: &str = "ups_along";
pub const METERS: &str = "meters";

// Warranty
pub const WARRANTY_STATUS: &str = "warranty_status";
pub const WARRANTY_START: &str = "warranty_start";
pub const WARRANTY_DAYS: &str = "warranty_days";

// Customer cascade
pub const CUSTOMER: &str = "customer";
pub const ADDRESS: &str = "address";
pub const CONTACT_PERSON: &str = "contact_person";
pub const CONTACT_NUMBER: &str = "contact_number";
pub const EMAIL: &str = "email";

/// Trimmed value of `name`, or `""` when the field was never set.
pub fn value<'a>(
    values: &'a FieldValues,
    name: &str,
) -> &'a str {
    values.get(name).map(|v| v.trim()).unwrap_or("")
}

/// Reads a yes/no answer. Blank or unrecognised text is unanswered.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
