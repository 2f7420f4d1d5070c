//! One function per subcommand. Each returns the text to print.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use jobcard_core::calculations::common::{format_fixed2, parse_decimal};
use jobcard_core::calculations::{
    IdentifierComponents, RunEstimateInput, WarrantyTerm, convert_length, days_to_duration,
};
use jobcard_core::session::JobCardSession;
use jobcard_core::{CascadeLevel, JobCardBackend, LengthUnit, WarrantyStatus};
use rust_decimal::Decimal;

use crate::script::{JobScript, run_script};

/// Clap value parser for `MM` / `IN`.
pub fn parse_unit(s: &str) -> Result<LengthUnit, String> {
    LengthUnit::parse(s).ok_or_else(|| format!("unknown unit '{s}' (expected MM or IN)"))
}

/// Clap value parser for the three warranty statuses.
pub fn parse_status(s: &str) -> Result<WarrantyStatus, String> {
    WarrantyStatus::parse(s).ok_or_else(|| {
        let known: Vec<_> = WarrantyStatus::all().iter().map(|w| w.as_str()).collect();
        format!("unknown warranty status '{s}' (expected one of: {})", known.join(", "))
    })
}

pub fn parse_level(s: &str) -> Result<CascadeLevel, String> {
    CascadeLevel::parse(s).ok_or_else(|| format!("unknown option level '{s}'"))
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Y",
        Some(false) => "N",
        None => "-",
    }
}

pub fn identifiers(components: &IdentifierComponents) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "job number:    {}", components.job_number());
    let _ = writeln!(out, "serial number: {}", components.serial_number());
    let _ = writeln!(
        out,
        "cut/perf:      {}/{}",
        flag(components.cut),
        flag(components.perforation)
    );
    out
}

pub fn meters(input: &RunEstimateInput) -> Result<String> {
    let estimate = input.calculate().context("cannot estimate meters")?;
    let mut out = String::new();
    let _ = writeln!(out, "run length:   {}", format_fixed2(estimate.run_length));
    let _ = writeln!(out, "waste margin: {}", format_fixed2(estimate.waste_margin));
    let _ = writeln!(out, "meters:       {}", estimate.meters_display());
    Ok(out)
}

pub fn warranty(
    status: Option<WarrantyStatus>,
    start: Option<NaiveDate>,
    days: Option<u32>,
) -> Result<String> {
    let mut term = WarrantyTerm::default();
    if let Some(status) = status {
        term.set_status(status);
    }
    term.set_start_date(start);
    if days.is_some() {
        term.set_days(days)?;
    }

    let mut out = String::new();
    if let Some(status) = term.status() {
        let _ = writeln!(out, "status:   {}", status.as_str());
    }
    let _ = writeln!(
        out,
        "days:     {}",
        term.days().map(|d| d.to_string()).unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "duration: {}",
        term.days().map(days_to_duration).unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "expiry:   {}",
        term.expiry_date().map(|d| d.to_string()).unwrap_or_default()
    );
    Ok(out)
}

pub fn duration(days: u32) -> String {
    format!("{}\n", days_to_duration(days))
}

pub fn convert(
    value: &str,
    from: LengthUnit,
    to: LengthUnit,
) -> Result<String> {
    let value: Decimal = parse_decimal(value).ok_or_else(|| anyhow!("'{value}' is not a number"))?;
    let converted = convert_length(value, from, to);
    Ok(format!("{} {}\n", converted.normalize(), to.suffix()))
}

pub async fn options(
    backend: &dyn JobCardBackend,
    level: CascadeLevel,
    parent: Option<&str>,
) -> Result<String> {
    let items = backend
        .fetch_options(level, parent)
        .await
        .with_context(|| format!("cannot load {level} options"))?;

    let mut out = String::new();
    for item in items {
        if item.label == item.value {
            let _ = writeln!(out, "{}", item.value);
        } else {
            let _ = writeln!(out, "{}\t{}", item.value, item.label);
        }
    }
    Ok(out)
}

pub async fn run(
    session: &mut JobCardSession,
    script_path: &Path,
) -> Result<String> {
    let script = JobScript::load(script_path)?;
    let report = run_script(session, &script).await?;

    let mut out = String::new();
    for notice in &report.notices {
        let _ = writeln!(out, "{notice}");
    }
    let _ = writeln!(out, "job number:    {}", report.derived.job_number);
    let _ = writeln!(out, "serial number: {}", report.derived.serial_number);
    let _ = writeln!(
        out,
        "meters:        {}",
        report.derived.meters.as_deref().unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "expiry:        {}",
        report
            .derived
            .expiry_date
            .map(|d| d.to_string())
            .unwrap_or_default()
    );
    if !report.record.serials.is_empty() {
        let _ = writeln!(out, "serials:       {}", report.record.serials.join(", "));
    }
    let _ = writeln!(out, "{} ({})", report.outcome.message, report.outcome.status.as_str());
    Ok(out)
}
