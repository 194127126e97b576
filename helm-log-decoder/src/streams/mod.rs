//! Typed tables built from the decoded event stream
//!
//! This module contains the stream splitter and the tables it fills:
//! numeric series, categorical series, per-vehicle tracks, and the shared
//! point-list grammar used for path announcements.

pub mod categorical;
pub mod fleet;
pub mod numeric;
pub mod path;
pub mod splitter;

// Re-export key types for convenience
pub use categorical::{CategoricalSeries, ClassifiedEvent};
pub use fleet::{Fleet, TrackSample, VehicleReport, VehicleTrack, DEFAULT_COLOR};
pub use numeric::NumericSeries;
pub use path::{parse_path_value, parse_point_list};
pub use splitter::{LogStats, StreamSplitter, TelemetryLog, UNKNOWN_OWNER};
