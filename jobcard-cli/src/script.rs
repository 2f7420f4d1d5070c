//! Scripted wizard runs.
//!
//! A job script lists what an operator would type on each wizard step, in
//! order:
//!
//! ```toml
//! [[step]]
//! set = [
//!     ["category", "PP"],
//!     ["job_description", "Spice jar labels"],
//!     ["customer", "ACME"],
//! ]
//!
//! [[step]]
//! set = [["width", "100"], ["height", "60"], ["color_count", "3"]]
//! serials = ["SN-0001"]
//! ```
//!
//! Each step's values are applied, then the wizard advances. The last step
//! submits the card.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jobcard_core::session::{DerivedFields, JobCardSession};
use jobcard_core::{JobCardRecord, Notice, SaveOutcome};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScriptStep {
    /// `[field, value]` pairs, applied in order.
    #[serde(default)]
    pub set: Vec<(String, String)>,
    #[serde(default)]
    pub serials: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobScript {
    #[serde(rename = "step", default)]
    pub steps: Vec<ScriptStep>,
}

impl JobScript {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid job script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read job script '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("in '{}'", path.display()))
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub notices: Vec<Notice>,
    pub derived: DerivedFields,
    pub record: JobCardRecord,
    pub outcome: SaveOutcome,
}

/// Plays `script` through `session` and submits the card.
///
/// The script must have exactly as many steps as the session's wizard. Any
/// step that refuses to advance ends the run with that step's error.
pub async fn run_script(
    session: &mut JobCardSession,
    script: &JobScript,
) -> Result<RunReport> {
    let mut notices = session.open().await;
    let step_count = script.steps.len();
    if step_count == 0 {
        bail!("job script has no steps");
    }

    for (index, step) in script.steps.iter().enumerate() {
        let number = index + 1;
        for (name, value) in &step.set {
            notices.extend(session.set_field(name, value).await);
        }
        for serial in &step.serials {
            session
                .add_serial(serial)
                .with_context(|| format!("step {number}: cannot add serial '{serial}'"))?;
        }

        if number < step_count {
            session
                .advance()
                .await
                .with_context(|| format!("step {number} did not advance"))?;
        }
    }

    let outcome = session.submit().await.context("job card was not saved")?;
    let record = session.assemble();
    info!(job_number = %record.job_number, steps = step_count, "scripted run saved");

    Ok(RunReport {
        notices,
        derived: session.derived(),
        record,
        outcome,
    })
}
