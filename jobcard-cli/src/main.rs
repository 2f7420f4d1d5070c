use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use jobcard_cli::config::{JobcardConfig, Overrides};
use jobcard_cli::{app, commands, logging};
use jobcard_core::calculations::common::parse_decimal;
use jobcard_core::calculations::{IdentifierComponents, RunEstimateInput};
use jobcard_core::fields::parse_flag;
use jobcard_core::session::JobCardSession;
use jobcard_core::{CascadeLevel, LengthUnit, WarrantyStatus};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Job card rules engine.
///
/// Computes the derived values of a print job card (identifiers, meters of
/// run, warranty expiry) and drives scripted wizard runs against a backend.
#[derive(Debug, Parser)]
#[command(name = "jobcard", version)]
struct Cli {
    /// Configuration file. Defaults to `jobcard.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend to use (overrides `[backend] name`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Backend connection string, e.g. an option seed CSV for `memory`.
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Log level or filter directive (overrides `[logging] level`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the job number and serial number for a label.
    Serial(SerialArgs),
    /// Estimate meters of run.
    Meters(MetersArgs),
    /// Compute a warranty expiry date.
    Warranty(WarrantyArgs),
    /// Spell out a day count as years, months and days.
    Duration { days: u32 },
    /// Convert a length between millimetres and inches.
    Convert {
        value: String,
        #[arg(value_parser = commands::parse_unit)]
        from: LengthUnit,
        #[arg(value_parser = commands::parse_unit)]
        to: LengthUnit,
    },
    /// List the backend's options for one cascade level.
    Options {
        #[arg(value_parser = commands::parse_level)]
        level: CascadeLevel,
        /// Selection of the level above; omit for customers.
        #[arg(long)]
        parent: Option<String>,
    },
    /// Play a TOML job script through the wizard and save the card.
    Run { script: PathBuf },
}

#[derive(Debug, Args)]
struct SerialArgs {
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    sequence: String,
    #[arg(long)]
    colors: Option<u32>,
    #[arg(long)]
    width: Option<String>,
    #[arg(long)]
    height: Option<String>,
    #[arg(long, default_value = "MM", value_parser = commands::parse_unit)]
    unit: LengthUnit,
    #[arg(long, default_value = "")]
    material: String,
    #[arg(long, default_value = "")]
    ups: String,
    #[arg(long, default_value = "")]
    core: String,
    /// Y or N.
    #[arg(long)]
    cut: Option<String>,
    /// Y or N.
    #[arg(long)]
    perforation: Option<String>,
}

#[derive(Debug, Args)]
struct MetersArgs {
    #[arg(long)]
    quantity: String,
    #[arg(long)]
    teeth: String,
    #[arg(long)]
    across: String,
    #[arg(long)]
    along: String,
    #[arg(long, default_value = "")]
    colors: String,
}

#[derive(Debug, Args)]
struct WarrantyArgs {
    #[arg(long, value_parser = commands::parse_status)]
    status: Option<WarrantyStatus>,
    /// Start date, YYYY-MM-DD.
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Day count; only accepted for Extended Warranty.
    #[arg(long)]
    days: Option<u32>,
}

impl SerialArgs {
    fn into_components(self) -> IdentifierComponents {
        let dimension = |v: Option<String>| v.as_deref().and_then(parse_decimal);
        let yes_no = |v: Option<String>| v.as_deref().and_then(parse_flag);
        IdentifierComponents {
            category_code: self.category,
            sequence_number: self.sequence,
            color_count: self.colors,
            width: dimension(self.width),
            height: dimension(self.height),
            unit: self.unit,
            material_code: self.material,
            ups_code: self.ups,
            core_code: self.core,
            cut: yes_no(self.cut),
            perforation: yes_no(self.perforation),
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = JobcardConfig::load(cli.config.as_deref())?;
    config.apply_overrides(Overrides {
        backend: cli.backend,
        connection: cli.connection,
        log_level: cli.log_level,
        log_file: cli.log_file,
    });
    logging::init_logging(&config.logging.level, config.logging.file.as_deref())?;
    debug!(?config, "configuration loaded");

    let output = match cli.command {
        Command::Serial(args) => commands::identifiers(&args.into_components()),
        Command::Meters(args) => commands::meters(&RunEstimateInput::from_text(
            &args.quantity,
            &args.teeth,
            &args.across,
            &args.along,
            &args.colors,
        ))?,
        Command::Warranty(args) => commands::warranty(args.status, args.start, args.days)?,
        Command::Duration { days } => commands::duration(days),
        Command::Convert { value, from, to } => commands::convert(&value, from, to)?,
        Command::Options { level, parent } => {
            let backend = app::open_backend(&config.backend).await?;
            commands::options(backend.as_ref(), level, parent.as_deref()).await?
        }
        Command::Run { script } => {
            let backend = app::open_backend(&config.backend).await?;
            let mut session = JobCardSession::job_card(backend);
            commands::run(&mut session, &script).await?
        }
    };

    print!("{output}");
    Ok(())
}
