//! Input file formats
//!
//! This module contains the telemetry log parser and the region/marker
//! side-file reader. The log parser follows an iterator pattern over
//! [`LogEvent`] values.

use crate::types::{LogEvent, Result};
use std::path::Path;

pub mod region;
pub mod telemetry;

// Re-export parser types
pub use region::{read_region_file, Marker, Polygon, RegionFile};
pub use telemetry::{decode_line, TelemetryParser};

/// Common trait for log file parsers
///
/// A parser opens a log file and yields decoded events. Malformed lines
/// are skipped by the parser itself; only I/O failures surface as `Err`.
pub trait LogFileParser: Iterator<Item = Result<LogEvent>> + Sized {
    /// Open a log file and return an iterator over its events
    fn parse(path: &Path) -> Result<Self>;
}
