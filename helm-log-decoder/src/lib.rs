//! Helm Log Decoder Library
//!
//! A stateless, reusable library for analyzing helm telemetry logs of
//! autonomous vehicles: `time;variable;value` records written by the vehicle
//! (or by a ground station merging several vehicles).
//!
//! # Architecture
//!
//! The library turns one complete log into typed answers:
//! - Decodes records and splits them into numeric, categorical and
//!   per-vehicle tables
//! - Resolves the desired path announced by the helm from its mode flags
//! - Resolves the active window (global and per vehicle)
//! - Resamples trajectories and picks anchors and the desired altitude
//! - Reads region/marker side files
//!
//! The library does NOT:
//! - Render plots or figures
//! - Write output files
//! - Keep state between analysis runs
//!
//! All presentation is in the application layer (helm-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use helm_log_decoder::{AnalysisConfig, Analyzer, SurveyResolution};
//! use std::path::Path;
//!
//! let analyzer = Analyzer::from_path(Path::new("mission.csv")).unwrap();
//!
//! let config = AnalysisConfig::new()
//!     .with_helm_start(120.0)
//!     .with_survey_resolution(SurveyResolution::Deferred);
//!
//! let report = analyzer.analyze(&config).unwrap();
//! match &report.desired_path {
//!     Some(path) => println!("Desired path: {}", path),
//!     None => println!("No desired path announced"),
//! }
//! for vehicle in &report.vehicles {
//!     println!("{} active until {}", vehicle.name, vehicle.window.stop());
//! }
//! ```

// Public modules
pub mod classify;
pub mod config;
pub mod decoder;
pub mod formats;
pub mod mode_tracker;
pub mod resample;
pub mod streams;
pub mod types;
pub mod window;

// Re-export main types for convenience
pub use classify::EventKind;
pub use config::AnalysisConfig;
pub use decoder::{AnalysisReport, Analyzer, ChannelPair, EntityTrajectory, VehicleTrajectory};
pub use formats::{read_region_file, Marker, Polygon, RegionFile};
pub use mode_tracker::{HelmMode, ModeTracker, SurveyResolution};
pub use resample::{
    anchor_index, AltitudeSource, AnchorPosition, DesiredAltitude, ResampledTable, Resampler, Trajectory,
    TrajectoryPoint, TrajectorySegments,
};
pub use streams::{LogStats, TelemetryLog, VehicleTrack};
pub use types::{ActiveWindow, DecoderError, DesiredPath, LogEvent, Point, Result, TimeRange};
pub use window::{ResolvedWindow, StopSource, WindowResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
