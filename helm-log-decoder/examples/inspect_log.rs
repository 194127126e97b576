//! Standalone telemetry log inspector
//!
//! This tool streams a helm telemetry log, prints the structured events
//! (mode changes, path announcements, node reports) and summarizes the
//! channels and vehicles it saw.
//!
//! Usage:
//!   inspect_log <log_file> [--limit <count>] [--verbose]
//!
//! Example:
//!   inspect_log mission.csv --limit 100 --verbose

use helm_log_decoder::formats::{LogFileParser, TelemetryParser};
use helm_log_decoder::streams::{parse_path_value, VehicleReport};
use helm_log_decoder::{EventKind, HelmMode, LogEvent};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

struct InspectStats {
    total_events: usize,
    numeric_events: usize,
    mode_changes: usize,
    path_announcements: usize,
    node_reports: usize,
    channels: HashMap<String, usize>,
    vehicles: HashMap<String, usize>,
}

impl InspectStats {
    fn new() -> Self {
        Self {
            total_events: 0,
            numeric_events: 0,
            mode_changes: 0,
            path_announcements: 0,
            node_reports: 0,
            channels: HashMap::new(),
            vehicles: HashMap::new(),
        }
    }

    fn print_summary(&self, dropped_lines: usize) {
        println!("\n=== LOG SUMMARY ===");
        println!("Total events: {}", self.total_events);
        println!("Dropped lines: {}", dropped_lines);
        println!("Numeric samples: {}", self.numeric_events);
        println!("Mode changes: {}", self.mode_changes);
        println!("Path announcements: {}", self.path_announcements);
        println!("Node reports: {}", self.node_reports);
        println!("Unique channels: {}", self.channels.len());

        if !self.channels.is_empty() {
            println!("\nTop 10 Most Frequent Channels:");
            let mut sorted: Vec<_> = self.channels.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (name, count) in sorted.iter().take(10) {
                println!("  {}: {} samples", name, count);
            }
        }

        if !self.vehicles.is_empty() {
            println!("\nVehicles:");
            let mut names: Vec<_> = self.vehicles.iter().collect();
            names.sort();
            for (name, count) in names {
                println!("  {}: {} reports", name, count);
            }
        }
    }
}

fn print_event(event: &LogEvent, kind: &EventKind, verbose: bool) {
    match kind {
        EventKind::ModeFlag => {
            println!(
                "[{:>10.3}s] MODE {} ({:?})",
                event.time,
                event.raw_value,
                HelmMode::from_flag(&event.raw_value)
            );
        }
        EventKind::WaypointUpdate | EventKind::SurveyUpdate { .. } => {
            let owner = match kind {
                EventKind::SurveyUpdate { owner: Some(owner) } => owner.as_str(),
                _ => "ownship",
            };
            match parse_path_value(&event.raw_value) {
                Some(vertices) => println!(
                    "[{:>10.3}s] {} -> {} ({} vertices)",
                    event.time,
                    event.name,
                    owner,
                    vertices.len()
                ),
                None => println!("[{:>10.3}s] {} (unreadable point list)", event.time, event.name),
            }
        }
        EventKind::NodeReport => {
            if verbose {
                match VehicleReport::parse(&event.raw_value) {
                    Some(report) => println!(
                        "[{:>10.3}s] REPORT {} at ({:.1}, {:.1}){}",
                        event.time,
                        report.name,
                        report.x,
                        report.y,
                        report.mode.map(|m| format!(" {}", m)).unwrap_or_default()
                    ),
                    None => println!("[{:>10.3}s] REPORT (incomplete)", event.time),
                }
            }
        }
        EventKind::Channel => {}
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <log_file> [--limit <count>] [--verbose]", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} mission.csv --limit 100 --verbose", args[0]);
        std::process::exit(1);
    }

    let log_file = PathBuf::from(&args[1]);
    let mut limit: Option<usize> = None;
    let mut verbose = false;

    // Parse arguments
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    println!("=== Helm Log Inspector ===");
    println!("Log file: {:?}", log_file);
    if let Some(n) = limit {
        println!("Limit: {} events", n);
    }
    println!("Verbose: {}", verbose);
    println!();

    let mut parser = TelemetryParser::parse(&log_file)?;
    let mut stats = InspectStats::new();
    let mut printed = 0;

    for result in parser.by_ref() {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                eprintln!("Error reading log: {}", e);
                break;
            }
        };
        stats.total_events += 1;

        let kind = EventKind::of(&event.name);
        match &kind {
            EventKind::ModeFlag => stats.mode_changes += 1,
            EventKind::WaypointUpdate | EventKind::SurveyUpdate { .. } => stats.path_announcements += 1,
            EventKind::NodeReport => {
                stats.node_reports += 1;
                if let Some(report) = VehicleReport::parse(&event.raw_value) {
                    *stats.vehicles.entry(report.name).or_insert(0) += 1;
                }
            }
            EventKind::Channel => {}
        }
        if event.numeric_value().is_some() {
            stats.numeric_events += 1;
            *stats.channels.entry(event.name.clone()).or_insert(0) += 1;
        }

        if limit.map_or(true, |max| printed < max) {
            print_event(&event, &kind, verbose);
            printed += 1;
        }
    }

    stats.print_summary(parser.dropped_lines());

    Ok(())
}
