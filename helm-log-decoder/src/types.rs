//! Core types for the helm log decoder library
//!
//! This module defines the fundamental values the decoder produces while
//! reading a helm telemetry log. Times are plain seconds as written by the
//! logger; they are not assumed to be monotonic in arrival order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding
///
/// Malformed log content never produces one of these; bad lines and
/// incomplete records are dropped. Only the primary log file itself and
/// the caller's configuration can fail.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to parse log file: {0}")]
    LogParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// One raw `time;variable;value` record from the log
///
/// The value is kept verbatim; whether it is numeric is decided later by
/// the stream splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Time in seconds
    pub time: f64,
    /// Variable name (e.g. `NAV_X`, `NODE_REPORT_UAV1`)
    pub name: String,
    /// Unparsed value field
    pub raw_value: String,
}

impl LogEvent {
    /// Create a new event
    pub fn new(time: f64, name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
            raw_value: raw_value.into(),
        }
    }

    /// Interpret the value as a real number, if it is one
    pub fn numeric_value(&self) -> Option<f64> {
        parse_real(&self.raw_value)
    }
}

/// Parse a real number the way the logger writes them
///
/// Surrounding whitespace is ignored. `NaN` is treated as "not a number"
/// so it can never enter a numeric table.
pub fn parse_real(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// A numeric sample of one variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSample {
    pub time: f64,
    pub value: f64,
}

/// A string-valued event (mode flags, path announcements, node reports)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalEvent {
    pub time: f64,
    pub variable: String,
    pub value: String,
}

/// A 2D point in local mission coordinates (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// An ordered sequence of path vertices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesiredPath {
    /// Path vertices in travel order
    pub vertices: Vec<Point>,
    /// Entity the path was issued to, if known
    pub owner: Option<String>,
    /// Time of the announcing event (None for caller-supplied literals)
    pub announced_at: Option<f64>,
}

impl DesiredPath {
    /// A path with no owner or announcement time
    pub fn from_vertices(vertices: Vec<Point>) -> Self {
        Self {
            vertices,
            owner: None,
            announced_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl fmt::Display for DesiredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.vertices.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(":"))
    }
}

/// Inclusive `[start, stop]` interval in which helm output is trusted
///
/// `start <= stop` is not enforced. An inverted window simply contains no
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveWindow {
    pub start: f64,
    pub stop: f64,
}

impl ActiveWindow {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    /// True if `time` lies inside the window (bounds included)
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.stop
    }

    /// True if the window cannot contain any sample
    pub fn is_inverted(&self) -> bool {
        self.start > self.stop
    }

    /// True if no stop was found and the window runs to infinity
    pub fn is_open(&self) -> bool {
        self.stop == f64::INFINITY
    }
}

/// Inclusive time range used to clip the log before analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// A range that admits every sample
    pub fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

impl From<ActiveWindow> for TimeRange {
    fn from(window: ActiveWindow) -> Self {
        Self {
            start: window.start,
            end: window.stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real("3.5"), Some(3.5));
        assert_eq!(parse_real(" -12 "), Some(-12.0));
        assert_eq!(parse_real("1e3"), Some(1000.0));
        assert_eq!(parse_real("HELM_SURVEYING"), None);
        assert_eq!(parse_real("NaN"), None);
        assert_eq!(parse_real(""), None);
    }

    #[test]
    fn test_window_contains_bounds() {
        let window = ActiveWindow::new(10.0, 20.0);
        assert!(window.contains(10.0));
        assert!(window.contains(20.0));
        assert!(!window.contains(20.5));
        assert!(!window.is_open());
        assert!(ActiveWindow::new(0.0, f64::INFINITY).is_open());
    }

    #[test]
    fn test_inverted_window_contains_nothing() {
        let window = ActiveWindow::new(30.0, 20.0);
        assert!(window.is_inverted());
        assert!(!window.contains(25.0));
        assert!(!window.contains(30.0));
    }

    #[test]
    fn test_desired_path_display() {
        let path = DesiredPath::from_vertices(vec![Point::new(1.0, 2.0), Point::new(3.5, -4.0)]);
        assert_eq!(path.to_string(), "1,2:3.5,-4");
        assert_eq!(path.len(), 2);
    }
}
