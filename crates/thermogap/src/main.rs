use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use thermogap_core::export::export_to_path;
use thermogap_core::timeline::parse_instant;
use thermogap_core::{ColumnBindings, Pipeline, PipelineConfig, PipelineWarning, RunReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Container temperature gap pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline over a sensor log and export the result
    Run(RunArgs),
    /// Validate a pipeline configuration without reading any data
    CheckConfig(ConfigArgs),
    /// Print the container/ambient preset configuration as TOML
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Pipeline configuration file (falls back to THERMOGAP_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Sensor log in CSV form
    #[arg(long)]
    input: PathBuf,
    /// Export targets; the format follows the extension (.csv, .parquet, .json, .xlsx)
    #[arg(long = "output", required = true)]
    outputs: Vec<PathBuf>,
    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    /// First sample instant, e.g. "2025-08-28 10:30:00"
    #[arg(long)]
    start: String,
    #[arg(long, default_value_t = 30)]
    interval_minutes: i64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::CheckConfig(args) => handle_check_config(args),
        Command::InitConfig(args) => handle_init_config(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let path = args
        .config
        .clone()
        .or_else(|| env::var_os("THERMOGAP_CONFIG").map(PathBuf::from))
        .context("--config (or THERMOGAP_CONFIG) must be set")?;

    PipelineConfig::from_path(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let pipeline = Pipeline::from_config(&config).context("invalid pipeline configuration")?;

    let output = pipeline
        .run_path(&args.input)
        .with_context(|| format!("pipeline failed for {}", args.input.display()))?;

    let timestamp_column = &pipeline.config().timestamp_column;
    let charts = pipeline.config().chart_layout();
    for target in &args.outputs {
        let format = export_to_path(&output.dataset, timestamp_column, &charts, target)
            .with_context(|| format!("failed to export {}", target.display()))?;
        println!("Wrote {} ({})", target.display(), format.as_str());
    }

    if let Some(path) = &args.report {
        let file = File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &output.report)?;
        info!(path = %path.display(), "wrote run report");
    }

    print_summary(&output.report);
    Ok(())
}

fn handle_check_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args)?;
    let validated = config.validate().context("invalid pipeline configuration")?;

    println!(
        "Configuration OK: {} columns, {} interpolated, {} gaps, grid starts {} every {}s",
        validated.columns.len(),
        validated.interpolate.len(),
        validated.gaps.len(),
        validated.grid.start(),
        validated.grid.interval().num_seconds()
    );
    Ok(())
}

fn handle_init_config(args: InitConfigArgs) -> Result<()> {
    let Some(start) = parse_instant(&args.start) else {
        bail!("could not parse start instant '{}'", args.start);
    };

    let config =
        PipelineConfig::container_ambient(&ColumnBindings::default(), start, args.interval_minutes);
    config.validate().context("preset does not validate")?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec![
        "Column",
        "Absent before",
        "Absent after",
        "Interpolated",
        "Derived",
    ]);
    for column in &report.columns {
        table.add_row(vec![
            column.name.clone(),
            column.absent_before.to_string(),
            column.absent_after.to_string(),
            yes_no(column.interpolated).to_string(),
            yes_no(column.derived).to_string(),
        ]);
    }

    println!("Processed {} rows", report.rows);
    println!("{table}");

    if let Some(audit) = &report.timestamp_audit {
        println!(
            "Source timestamps ({}): {} compared, {} mismatched, {} unparseable",
            audit.column, audit.compared, audit.mismatched, audit.unparseable
        );
    }

    for warning in &report.warnings {
        match warning {
            PipelineWarning::EmptySeries { column } => {
                println!("warning: '{column}' had no known values; left absent");
            }
            PipelineWarning::SkippedRecord {
                line_index,
                expected,
                found,
            } => {
                println!(
                    "warning: skipped line {line_index} ({found} fields, expected {expected})"
                );
            }
            PipelineWarning::TimestampMismatch {
                column,
                mismatched,
                unparseable,
            } => {
                println!(
                    "warning: '{column}' disagrees with the synthesized grid at {mismatched} rows ({unparseable} unparseable)"
                );
            }
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
