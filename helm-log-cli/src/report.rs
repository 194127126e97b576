//! Report generation
//!
//! Renders the analysis of one or more logs as a plain-text summary or as
//! pretty-printed JSON.

use anyhow::{Context, Result};
use helm_log_decoder::{
    AnalysisReport, DesiredPath, EntityTrajectory, Marker, Polygon, ResolvedWindow, TrajectoryPoint,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Outcome of analyzing one log file
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn from_result(path: PathBuf, result: Result<AnalysisReport>) -> Self {
        match result {
            Ok(report) => Self {
                path,
                report: Some(report),
                error: None,
            },
            Err(e) => Self {
                path,
                report: None,
                error: Some(format!("{:#}", e)),
            },
        }
    }
}

/// Parsed region side file
#[derive(Debug, Serialize)]
pub struct RegionSummary {
    pub path: PathBuf,
    pub polygon: Option<Polygon>,
    /// `None` when the file could not be read
    pub markers: Option<Vec<Marker>>,
}

/// Everything written in one run
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub tool_version: String,
    pub decoder_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionSummary>,
    pub logs: Vec<LogEntry>,
}

impl BatchReport {
    pub fn new(logs: Vec<LogEntry>, region: Option<RegionSummary>) -> Self {
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            decoder_version: helm_log_decoder::VERSION.to_string(),
            region,
            logs,
        }
    }

    pub fn failed(&self) -> usize {
        self.logs.iter().filter(|l| l.error.is_some()).count()
    }
}

/// Pretty JSON rendering
pub fn render_json(batch: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(batch).context("Failed to serialize report")
}

/// Plain-text rendering
pub fn render_text(batch: &BatchReport) -> Result<String> {
    let mut out = String::new();
    render_text_to(&mut out, batch)?;
    Ok(out)
}

/// Plain-text rendering into any formatter sink
pub fn render_text_to<W: std::fmt::Write>(out: &mut W, batch: &BatchReport) -> Result<()> {
    write_text(out, batch).context("Failed to render text report")
}

fn write_text<W: std::fmt::Write>(out: &mut W, batch: &BatchReport) -> std::fmt::Result {
    writeln!(out, "═══════════════════════════════════════════════")?;
    writeln!(out, "  Helm Log Analysis")?;
    writeln!(out, "═══════════════════════════════════════════════")?;
    writeln!(out, "Generated: {}", batch.generated_at)?;
    writeln!(
        out,
        "Tool v{} / decoder v{}",
        batch.tool_version, batch.decoder_version
    )?;

    if let Some(region) = &batch.region {
        writeln!(out, "\nRegion file: {:?}", region.path)?;
        match &region.polygon {
            Some(polygon) => writeln!(out, "  Polygon: {} vertices", polygon.vertices.len())?,
            None => writeln!(out, "  Polygon: none")?,
        }
        match &region.markers {
            Some(markers) => {
                writeln!(out, "  Markers: {}", markers.len())?;
                for marker in markers {
                    let name = if marker.name.is_empty() { "-" } else { marker.name.as_str() };
                    writeln!(out, "    {} at ({:.1}, {:.1})", name, marker.x, marker.y)?;
                }
            }
            None => writeln!(out, "  Markers: unreadable")?,
        }
    }

    for entry in &batch.logs {
        writeln!(out, "\n───────────────────────────────────────────────")?;
        writeln!(out, "Log: {:?}", entry.path)?;
        writeln!(out, "───────────────────────────────────────────────")?;

        match (&entry.report, &entry.error) {
            (Some(report), _) => write_log_report(out, report)?,
            (None, Some(error)) => writeln!(out, "  ✗ {}", error)?,
            (None, None) => writeln!(out, "  (no result)")?,
        }
    }

    Ok(())
}

fn write_log_report<W: std::fmt::Write>(out: &mut W, report: &AnalysisReport) -> std::fmt::Result {
    let stats = &report.stats;
    writeln!(
        out,
        "Events: {} ({} numeric, {} dropped lines)",
        stats.events, stats.numeric_samples, stats.dropped_lines
    )?;
    if stats.discarded_reports > 0 || stats.discarded_paths > 0 {
        writeln!(
            out,
            "Discarded: {} node reports, {} path announcements",
            stats.discarded_reports, stats.discarded_paths
        )?;
    }
    writeln!(
        out,
        "Time range: [{:.3}, {:.3}]",
        report.time_range.start, report.time_range.end
    )?;
    writeln!(out, "Active window: {}", format_window(&report.window))?;

    match &report.desired_path {
        Some(path) => writeln!(out, "Desired path: {}", format_path(path))?,
        None => writeln!(out, "Desired path: none")?,
    }
    writeln!(
        out,
        "Desired altitude: {:.2} ({:?})",
        report.desired_altitude.value, report.desired_altitude.source
    )?;

    match &report.ownship {
        Some(trajectory) => {
            writeln!(out, "\nOwnship trajectory:")?;
            write_trajectory(out, trajectory)?;
        }
        None => writeln!(out, "\nOwnship trajectory: no NAV_X/NAV_Y positions")?,
    }

    if !report.vehicles.is_empty() {
        writeln!(out, "\nVehicles ({}):", report.vehicles.len())?;
        for vehicle in &report.vehicles {
            writeln!(
                out,
                "  {} [{}] window {}",
                vehicle.name,
                vehicle.color,
                format_window(&vehicle.window)
            )?;
            write_trajectory(out, &vehicle.trajectory)?;
            if let Some(path) = &vehicle.survey_path {
                writeln!(out, "    Survey path: {}", format_path(path))?;
            }
        }
    }

    writeln!(out, "\nChannel pairs:")?;
    for pair in &report.channel_pairs {
        let mark = if pair.available { "✓" } else { "✗" };
        writeln!(out, "  {} {} / {}", mark, pair.desired, pair.actual)?;
    }
    writeln!(out, "Channels: {}", report.channels.join(", "))?;

    Ok(())
}

fn write_trajectory<W: std::fmt::Write>(out: &mut W, trajectory: &EntityTrajectory) -> std::fmt::Result {
    let segments = &trajectory.segments;
    writeln!(
        out,
        "    Points: {} before, {} active, {} after",
        segments.before.len(),
        segments.active.len(),
        segments.after.len()
    )?;
    if let Some(point) = &trajectory.helm_start_marker {
        writeln!(out, "    Helm start near {}", format_point(point))?;
    }
    if let Some(point) = &trajectory.helm_stop_marker {
        writeln!(out, "    Helm stop near {}", format_point(point))?;
    }
    if let Some(point) = &trajectory.anchor {
        writeln!(out, "    Anchor {}", format_point(point))?;
    }
    Ok(())
}

fn format_window(window: &ResolvedWindow) -> String {
    format!(
        "[{:.3}, {:.3}] (stop: {:?})",
        window.start(),
        window.stop(),
        window.stop_source
    )
}

fn format_path(path: &DesiredPath) -> String {
    match path.announced_at {
        Some(time) => format!("{} vertices, announced at {:.3}s: {}", path.len(), time, path),
        None => format!("{} vertices (configured): {}", path.len(), path),
    }
}

fn format_point(point: &TrajectoryPoint) -> String {
    match point.altitude {
        Some(altitude) => format!(
            "t={:.3}s ({:.1}, {:.1}, alt {:.1})",
            point.time, point.x, point.y, altitude
        ),
        None => format!("t={:.3}s ({:.1}, {:.1})", point.time, point.x, point.y),
    }
}

/// Write rendered output to a file, or stdout when no file is given
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_log_decoder::{AnalysisConfig, Analyzer};

    fn sample_batch() -> BatchReport {
        let analyzer = Analyzer::parse_str(
            "0;NAV_X;0\n0;NAV_Y;0\n0;AUTOPILOT_MODE;HELM_TOWAYPT\n1;TOWAYPT_UPDATE;points=5,5\n10;NAV_X;10\n10;NAV_Y;10\n",
        )
        .unwrap();
        let report = analyzer.analyze(&AnalysisConfig::new()).map_err(anyhow::Error::from);

        BatchReport::new(
            vec![
                LogEntry::from_result(PathBuf::from("mission.csv"), report),
                LogEntry::from_result(PathBuf::from("missing.csv"), Err(anyhow::anyhow!("not found"))),
            ],
            None,
        )
    }

    #[test]
    fn test_text_report() {
        let batch = sample_batch();
        let text = render_text(&batch).unwrap();

        assert!(text.contains("Helm Log Analysis"));
        assert!(text.contains("Desired path: 1 vertices, announced at 1.000s: 5,5"));
        assert!(text.contains("Points: 0 before, 2 active, 0 after"));
        assert!(text.contains("✗ not found"));
        assert_eq!(batch.failed(), 1);
    }

    /// Sink that accepts a fixed number of bytes, then fails
    struct ShortSink {
        room: usize,
    }

    impl std::fmt::Write for ShortSink {
        fn write_str(&mut self, s: &str) -> std::fmt::Result {
            if s.len() > self.room {
                return Err(std::fmt::Error);
            }
            self.room -= s.len();
            Ok(())
        }
    }

    #[test]
    fn test_text_report_surfaces_write_errors() {
        let batch = sample_batch();
        let err = render_text_to(&mut ShortSink { room: 64 }, &batch).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to render text report"));

        assert!(render_text_to(&mut ShortSink { room: usize::MAX }, &batch).is_ok());
    }

    #[test]
    fn test_json_report() {
        let batch = sample_batch();
        let json: serde_json::Value = serde_json::from_str(&render_json(&batch).unwrap()).unwrap();

        assert_eq!(json["logs"].as_array().unwrap().len(), 2);
        assert_eq!(json["logs"][0]["report"]["window"]["stop"], 10.0);
        assert_eq!(json["logs"][1]["error"], "not found");
        assert!(json["logs"][1].get("report").is_none());
        assert!(json.get("region").is_none());
    }

    #[test]
    fn test_write_output_to_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_output("hello", Some(file.path())).unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "hello");
    }
}
