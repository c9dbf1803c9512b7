//! GNSS Delta Viewer - desktop viewer and command line tools
//!
//! Without a subcommand the interactive viewer is opened.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use gnss_delta_viewer::charts::{build_chart_set, ChartKind, StaticChartRenderer, Units};
use gnss_delta_viewer::config::{AppConfig, GroupingMode};
use gnss_delta_viewer::data::{
    delta_rows, describe, dop_rows, filter_by_date, group_records, positions_json, save_delta_csv,
    save_dop_csv, Record,
};
use gnss_delta_viewer::gui;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "GNSS position delta and DOP chart viewer", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive viewer
    View,
    /// Render the charts of a delta or DOP CSV to PNG files
    Render(RenderArgs),
    /// Convert an NMEA log into a DOP/delta CSV or a positions JSON
    Export(ExportArgs),
    /// Print every record of an NMEA log with sentence descriptions
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Delta or DOP CSV file
    #[arg(value_hint = ValueHint::FilePath)]
    csv: PathBuf,

    /// Which chart set the CSV holds
    #[arg(long, value_enum, default_value_t = KindOpt::Delta)]
    kind: KindOpt,

    /// Plot metric deltas instead of degrees
    #[arg(long, action = ArgAction::SetTrue)]
    meters: bool,

    /// Directory receiving one PNG per chart
    #[arg(long, default_value = "charts", value_hint = ValueHint::DirPath)]
    out_dir: PathBuf,

    /// Image width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// NMEA-0183 log file
    #[arg(value_hint = ValueHint::FilePath)]
    nmea: PathBuf,

    /// Output table
    #[arg(long, value_enum)]
    format: FormatOpt,

    /// Output path
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: PathBuf,

    #[command(flatten)]
    records: RecordArgs,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// NMEA-0183 log file
    #[arg(value_hint = ValueHint::FilePath)]
    nmea: PathBuf,

    #[command(flatten)]
    records: RecordArgs,
}

#[derive(clap::Args, Debug)]
struct RecordArgs {
    /// How log lines are grouped into records (overrides the config file)
    #[arg(long, value_enum)]
    grouping: Option<GroupingOpt>,

    /// Keep records dated on or after this day (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Keep records dated on or before this day (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindOpt {
    Delta,
    Dop,
}

impl From<KindOpt> for ChartKind {
    fn from(value: KindOpt) -> Self {
        match value {
            KindOpt::Delta => ChartKind::Delta,
            KindOpt::Dop => ChartKind::Dop,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatOpt {
    Dop,
    Delta,
    Positions,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GroupingOpt {
    Delimited,
    Fixed,
}

impl From<GroupingOpt> for GroupingMode {
    fn from(value: GroupingOpt) -> Self {
        match value {
            GroupingOpt::Delimited => GroupingMode::Delimited,
            GroupingOpt::Fixed => GroupingMode::Fixed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::View) {
        Command::View => gui::run(config).map_err(|e| anyhow!("viewer failed: {e}")),
        Command::Render(args) => run_render(args, &config),
        Command::Export(args) => run_export(args, config),
        Command::Inspect(args) => run_inspect(args, config),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_render(args: RenderArgs, config: &AppConfig) -> Result<()> {
    let csv = fs::read_to_string(&args.csv)
        .with_context(|| format!("failed to read {}", args.csv.display()))?;
    let units = if args.meters {
        Units::Meters
    } else {
        Units::Degrees
    };

    let charts = build_chart_set(&csv, args.kind.into(), units)
        .with_context(|| format!("failed to parse {}", args.csv.display()))?;
    for chart in &charts {
        if !chart.series.rejected.is_empty() {
            warn!(
                chart = chart.spec.id,
                skipped = chart.series.rejected.len(),
                "Rows skipped while reading chart"
            );
        }
    }

    let width = args.width.unwrap_or(config.chart.width);
    let height = args.height.unwrap_or(config.chart.height);
    let written = StaticChartRenderer::write_chart_set(&charts, &args.out_dir, width, height)
        .with_context(|| format!("failed to render charts into {}", args.out_dir.display()))?;

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Read and group an NMEA log, applying grouping override and date window.
fn load_records(path: &Path, args: &RecordArgs, mut config: AppConfig) -> Result<Vec<Record>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some(grouping) = args.grouping {
        config.nmea.grouping = grouping.into();
    }

    let records = group_records(&text, config.nmea.record_grouping());
    if args.from.is_none() && args.to.is_none() {
        return Ok(records);
    }

    let from = args.from.unwrap_or(NaiveDate::MIN);
    let to = args.to.unwrap_or(NaiveDate::MAX);
    let kept = filter_by_date(&records, from, to);
    info!(total = records.len(), kept = kept.len(), %from, %to, "Filtered records by date");
    Ok(kept)
}

fn run_export(args: ExportArgs, config: AppConfig) -> Result<()> {
    let earth_radius_m = config.earth_radius_m;
    let records = load_records(&args.nmea, &args.records, config)?;
    let output = args.output.display().to_string();

    match args.format {
        FormatOpt::Positions => {
            let json = positions_json(&records).context("failed to build positions")?;
            fs::write(&args.output, json).with_context(|| format!("failed to write {output}"))?;
        }
        FormatOpt::Dop => {
            save_dop_csv(&dop_rows(&records), &args.output)
                .with_context(|| format!("failed to write {output}"))?;
        }
        FormatOpt::Delta => {
            save_delta_csv(&delta_rows(&records, earth_radius_m), &args.output)
                .with_context(|| format!("failed to write {output}"))?;
        }
    }

    info!(format = ?args.format, path = %output, "Export complete");
    Ok(())
}

fn run_inspect(args: InspectArgs, config: AppConfig) -> Result<()> {
    let records = load_records(&args.nmea, &args.records, config)?;

    for record in &records {
        match record.date() {
            Some(date) => println!("== {} ({}) ==", record, date),
            None => println!("== {} ==", record),
        }
        for sentence in &record.sentences {
            println!("{}", sentence);
            for line in describe(sentence).lines() {
                println!("    {}", line);
            }
        }
        println!();
    }
    Ok(())
}
