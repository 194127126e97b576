//! Helm Log Analysis CLI Application
//!
//! This is the command-line interface for helm telemetry log analysis.
//! It uses the helm-log-decoder library and adds:
//! - TOML configuration with command-line overrides
//! - Batch analysis of several logs in parallel
//! - Region/marker side-file loading
//! - Report generation (TXT/JSON)

use anyhow::{bail, Context, Result};
use clap::Parser;
use helm_log_decoder::{read_region_file, AnalysisConfig, AnalysisReport, Analyzer, SurveyResolution};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::{BatchReport, LogEntry, RegionSummary};

/// Helm Log Analysis - Resolve paths, windows and trajectories from helm logs
#[derive(Parser, Debug)]
#[command(name = "helm-log-cli")]
#[command(about = "Analyze helm telemetry logs (time;variable;value)", long_about = None)]
#[command(version)]
struct Args {
    /// Path to telemetry log file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Region/marker file (search polygon and fires)
    #[arg(long, value_name = "FILE")]
    region: Option<PathBuf>,

    /// Start of the analysis range (seconds)
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    time_start: Option<f64>,

    /// End of the analysis range (seconds)
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    time_end: Option<f64>,

    /// Known helm start time (enables stop inference)
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    helm_start: Option<f64>,

    /// Known helm stop time
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    helm_stop: Option<f64>,

    /// Do not infer the helm stop from the log
    #[arg(long)]
    no_auto_stop: bool,

    /// Literal desired path, e.g. "0,0:100,0:100,50"
    #[arg(long, value_name = "POINTS")]
    desired_path: Option<String>,

    /// Literal desired altitude
    #[arg(long, value_name = "METERS", allow_negative_numbers = true)]
    desired_altitude: Option<f64>,

    /// Anchor position along the active trajectory (0..1, -1 for none)
    #[arg(long, value_name = "FRACTION", allow_negative_numbers = true)]
    anchor_position: Option<f64>,

    /// Emit survey paths only while the mode is surveying (older logs)
    #[arg(long)]
    legacy_survey: bool,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Helm Log Analysis CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", helm_log_decoder::VERSION);

    let mut app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut app_config, &args);

    if app_config.input.files.is_empty() {
        println!("Helm Log Analysis - No input specified");
        println!("\nQuick Start:");
        println!("  helm-log-cli --log mission.csv --helm-start 120");
        println!("  helm-log-cli --log uav1.csv --log uav2.csv --region fires.txt --format json");
        println!("\nWith a configuration file:");
        println!("  helm-log-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let analysis = app_config.analysis_config();
    analysis.validate().context("Invalid analysis settings")?;

    let region = app_config.input.region_file.as_ref().map(|path| {
        let (polygon, markers) = read_region_file(path);
        RegionSummary {
            path: path.clone(),
            polygon,
            markers,
        }
    });

    // Each log is analyzed on its own; collect keeps input order
    let logs: Vec<LogEntry> = app_config
        .input
        .files
        .par_iter()
        .map(|path| LogEntry::from_result(path.clone(), analyze_file(path, &analysis)))
        .collect();

    let batch = BatchReport::new(logs, region);
    for entry in &batch.logs {
        if let Some(error) = &entry.error {
            log::error!("{:?}: {}", entry.path, error);
        }
    }

    let content = match app_config.output.format {
        OutputFormat::Txt => report::render_text(&batch)?,
        OutputFormat::Json => report::render_json(&batch)?,
    };
    report::write_output(&content, app_config.output.output_file.as_deref())?;

    if batch.failed() == batch.logs.len() {
        bail!("No log could be analyzed");
    }

    Ok(())
}

/// Read one log and run the full analysis on it
fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let analyzer =
        Analyzer::from_path(path).with_context(|| format!("Failed to read log file: {:?}", path))?;
    let report = analyzer
        .analyze(config)
        .with_context(|| format!("Failed to analyze log file: {:?}", path))?;
    Ok(report)
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if !args.log.is_empty() {
        config.input.files = args.log.clone();
    }
    if args.region.is_some() {
        config.input.region_file = args.region.clone();
    }

    let window = &mut config.window;
    window.time_start = args.time_start.or(window.time_start);
    window.time_end = args.time_end.or(window.time_end);
    window.helm_start = args.helm_start.or(window.helm_start);
    window.helm_stop = args.helm_stop.or(window.helm_stop);
    if args.no_auto_stop {
        window.auto_helm_stop = false;
    }

    let path = &mut config.path;
    if args.desired_path.is_some() {
        path.desired_path = args.desired_path.clone();
    }
    path.desired_altitude = args.desired_altitude.or(path.desired_altitude);
    if let Some(position) = args.anchor_position {
        path.anchor_position = position;
    }
    if args.legacy_survey {
        path.survey_resolution = SurveyResolution::Immediate;
    }

    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.output.is_some() {
        config.output.output_file = args.output.clone();
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
