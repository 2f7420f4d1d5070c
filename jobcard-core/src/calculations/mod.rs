//! Derived-field calculators for the job card and asset tracking forms.
//!
//! Every calculator here is a pure function of the current form values. None
//! of them performs I/O; values that come from the backend (such as the
//! running sequence number) are passed in by the caller.

pub mod common;
pub mod duration;
pub mod identifier;
pub mod run_estimate;
pub mod units;
pub mod warranty;

pub use duration::days_to_duration;
pub use identifier::IdentifierComponents;
pub use run_estimate::{ComputationGuard, RunEstimate, RunEstimateInput, waste_margin};
pub use units::convert_length;
pub use warranty::{WarrantyError, WarrantyTerm, expiry_date};
