//! Main analysis API
//!
//! This module provides the primary interface for the library. An
//! [`Analyzer`] owns the typed tables of one telemetry log and answers every
//! question about it for a given [`AnalysisConfig`]. Nothing is cached
//! between calls, so one analyzer can serve any number of configurations.

use crate::classify::{
    DESIRED_ALTITUDE, DESIRED_HEADING, DESIRED_SPEED, NAV_ALTITUDE, NAV_HEADING, NAV_SPEED, NAV_X, NAV_Y,
};
use crate::config::AnalysisConfig;
use crate::formats::{LogFileParser, TelemetryParser};
use crate::mode_tracker::ModeTracker;
use crate::resample::{
    infer_desired_altitude, DesiredAltitude, ResampledTable, Resampler, Trajectory, TrajectoryPoint,
    TrajectorySegments,
};
use crate::streams::fleet::VehicleTrack;
use crate::streams::splitter::{LogStats, StreamSplitter, TelemetryLog};
use crate::types::{ActiveWindow, DesiredPath, LogEvent, Result, TimeRange};
use crate::window::{ResolvedWindow, WindowResolver};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Ownship channels carried into the resampled position table
pub const OWNSHIP_CHANNELS: [&str; 5] = [NAV_X, NAV_Y, NAV_ALTITUDE, NAV_HEADING, NAV_SPEED];

/// Commanded/measured channel pairs worth comparing
pub const CHANNEL_PAIRS: [(&str, &str); 3] = [
    (DESIRED_HEADING, NAV_HEADING),
    (DESIRED_SPEED, NAV_SPEED),
    (DESIRED_ALTITUDE, NAV_ALTITUDE),
];

/// Entry point for analyzing one telemetry log
pub struct Analyzer {
    log: TelemetryLog,
}

impl Analyzer {
    /// Read and split a telemetry log file
    ///
    /// # Example
    /// ```no_run
    /// use helm_log_decoder::{AnalysisConfig, Analyzer};
    /// use std::path::Path;
    ///
    /// let analyzer = Analyzer::from_path(Path::new("mission.csv")).unwrap();
    /// let report = analyzer.analyze(&AnalysisConfig::new().with_helm_start(120.0)).unwrap();
    /// println!("helm stop: {}", report.window.stop());
    /// ```
    pub fn from_path(path: &Path) -> Result<Self> {
        let parser = TelemetryParser::parse(path)?;
        Self::from_parser(parser)
    }

    /// Read and split a log from any reader
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        Self::from_parser(TelemetryParser::from_reader(reader))
    }

    /// Split log text already in memory
    pub fn parse_str(content: &str) -> Result<Self> {
        Self::from_reader(content.as_bytes())
    }

    /// Split events that were decoded elsewhere
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = LogEvent>,
    {
        Self {
            log: StreamSplitter::split(events),
        }
    }

    fn from_parser<R: io::Read>(mut parser: TelemetryParser<R>) -> Result<Self> {
        let mut splitter = StreamSplitter::new();
        for event in parser.by_ref() {
            splitter.push(event?);
        }
        splitter.note_dropped(parser.dropped_lines());
        if parser.dropped_lines() > 0 {
            log::debug!("Dropped {} malformed lines", parser.dropped_lines());
        }

        Ok(Self {
            log: splitter.finish(),
        })
    }

    pub fn log(&self) -> &TelemetryLog {
        &self.log
    }

    pub fn into_log(self) -> TelemetryLog {
        self.log
    }

    pub fn stats(&self) -> LogStats {
        self.log.stats
    }

    /// Analysis range: configured bounds, else the numeric data bounds,
    /// else the whole stream's bounds
    pub fn time_range(&self, config: &AnalysisConfig) -> TimeRange {
        let start = config
            .time_start
            .or(self.log.numeric.min_time())
            .or(self.log.categorical.min_time())
            .unwrap_or(f64::NEG_INFINITY);
        let end = config
            .time_end
            .or(self.log.numeric.max_time())
            .or(self.log.categorical.max_time())
            .unwrap_or(f64::INFINITY);
        TimeRange::new(start, end)
    }

    /// Range of one vehicle's track: configured bounds, else the track's
    /// own first and last report
    pub fn vehicle_range(&self, config: &AnalysisConfig, track: &VehicleTrack) -> TimeRange {
        let start = config
            .time_start
            .or(track.first_time())
            .unwrap_or(f64::NEG_INFINITY);
        let end = config.time_end.or(track.last_time()).unwrap_or(f64::INFINITY);
        TimeRange::new(start, end)
    }

    /// Global active window
    pub fn window(&self, config: &AnalysisConfig) -> ResolvedWindow {
        WindowResolver::new(&self.log, config).resolve()
    }

    /// Active window of every vehicle seen in node reports
    pub fn vehicle_windows(&self, config: &AnalysisConfig) -> BTreeMap<String, ResolvedWindow> {
        WindowResolver::new(&self.log, config).resolve_per_vehicle()
    }

    /// Desired path: the configured literal, else the one the helm announced
    pub fn desired_path(&self, config: &AnalysisConfig) -> Option<DesiredPath> {
        if let Some(path) = config.literal_desired_path() {
            log::debug!("Using configured desired path ({} vertices)", path.len());
            return Some(path);
        }
        let start = WindowResolver::new(&self.log, config).start();
        ModeTracker::new(config.survey_resolution).resolve_series(&self.log.categorical, start)
    }

    pub fn desired_altitude(&self, config: &AnalysisConfig, window: ActiveWindow) -> DesiredAltitude {
        infer_desired_altitude(
            &self.log.numeric,
            window,
            config.desired_altitude,
            config.fallback_altitude,
        )
    }

    /// Ownship channels merged onto one table inside `range`
    pub fn ownship_table(&self, range: TimeRange) -> ResampledTable {
        Resampler::from_series(&self.log.numeric, &OWNSHIP_CHANNELS, range).resample()
    }

    /// Run every stage and collect the results
    pub fn analyze(&self, config: &AnalysisConfig) -> Result<AnalysisReport> {
        config.validate()?;

        let time_range = self.time_range(config);
        let window = self.window(config);
        let desired_path = self.desired_path(config);
        let desired_altitude = self.desired_altitude(config, window.window);

        let ownship_trajectory =
            Trajectory::from_table(&self.ownship_table(time_range), NAV_X, NAV_Y, NAV_ALTITUDE);
        let ownship = if ownship_trajectory.is_empty() {
            log::debug!("No NAV_X/NAV_Y positions in range; ownship trajectory omitted");
            None
        } else {
            Some(EntityTrajectory::build(&ownship_trajectory, window.window, config))
        };

        let vehicle_windows = self.vehicle_windows(config);
        let vehicles = self
            .log
            .fleet
            .tracks()
            .iter()
            .filter_map(|track| {
                let window = *vehicle_windows.get(&track.name)?;
                let trajectory = Trajectory::from_track(track, self.vehicle_range(config, track));
                Some(VehicleTrajectory {
                    name: track.name.clone(),
                    color: track.color.clone(),
                    window,
                    trajectory: EntityTrajectory::build(&trajectory, window.window, config),
                    survey_path: self.log.survey_path_for(&track.name).cloned(),
                })
            })
            .collect::<Vec<_>>();

        let channels: Vec<String> = self.log.numeric.variables().map(str::to_string).collect();
        let channel_pairs = CHANNEL_PAIRS
            .iter()
            .map(|&(desired, actual)| ChannelPair {
                desired: desired.to_string(),
                actual: actual.to_string(),
                available: self.log.numeric.has_variable(desired) && self.log.numeric.has_variable(actual),
            })
            .collect();

        log::info!(
            "Analysis: window [{}, {}], desired path {}, {} vehicles",
            window.start(),
            window.stop(),
            if desired_path.is_some() { "resolved" } else { "none" },
            vehicles.len()
        );

        Ok(AnalysisReport {
            time_range,
            window,
            desired_path,
            desired_altitude,
            ownship,
            vehicles,
            channels,
            channel_pairs,
            stats: self.log.stats,
        })
    }
}

/// Everything one analysis run produced
///
/// Infinite window bounds serialize as `null` in JSON.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub time_range: TimeRange,
    pub window: ResolvedWindow,
    pub desired_path: Option<DesiredPath>,
    pub desired_altitude: DesiredAltitude,
    /// `None` when the log has no `NAV_X`/`NAV_Y` positions in range
    pub ownship: Option<EntityTrajectory>,
    /// In order of first sighting
    pub vehicles: Vec<VehicleTrajectory>,
    /// Observed numeric channels, sorted
    pub channels: Vec<String>,
    pub channel_pairs: Vec<ChannelPair>,
    pub stats: LogStats,
}

/// A trajectory split against its active window, with its markers
#[derive(Debug, Clone, Serialize)]
pub struct EntityTrajectory {
    pub segments: TrajectorySegments,
    /// Point closest to the window start
    pub helm_start_marker: Option<TrajectoryPoint>,
    /// Point closest to the window stop
    pub helm_stop_marker: Option<TrajectoryPoint>,
    /// Sensor/detection anchor on the active segment
    pub anchor: Option<TrajectoryPoint>,
}

impl EntityTrajectory {
    fn build(trajectory: &Trajectory, window: ActiveWindow, config: &AnalysisConfig) -> Self {
        let segments = trajectory.split(window);
        let marker = |time: f64| {
            if time.is_finite() {
                trajectory.nearest(time).copied()
            } else {
                None
            }
        };

        Self {
            helm_start_marker: marker(window.start),
            helm_stop_marker: marker(window.stop),
            anchor: segments.active.anchor(config.anchor()).copied(),
            segments,
        }
    }
}

/// Per-vehicle part of the report
#[derive(Debug, Clone, Serialize)]
pub struct VehicleTrajectory {
    pub name: String,
    pub color: String,
    pub window: ResolvedWindow,
    #[serde(flatten)]
    pub trajectory: EntityTrajectory,
    /// Latest `SURVEY_UPDATE_<NAME>` path for this vehicle
    pub survey_path: Option<DesiredPath>,
}

/// Availability of one commanded/measured channel pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelPair {
    pub desired: String,
    pub actual: String,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::AltitudeSource;
    use crate::types::Point;
    use crate::window::StopSource;

    const MISSION: &str = "\
0;NAV_X;0
0;NAV_Y;0
0;NAV_ALTITUDE;90
0;AUTOPILOT_MODE;HELM_SURVEYING
1;SURVEY_UPDATE;pts={0,0:10,0:10,10}
5;DESIRED_SPEED;2
10;NAV_X;10
10;NAV_Y;5
10;NAV_ALTITUDE;110
20;DESIRED_SPEED;0
20;NAV_X;20
20;NAV_Y;10
garbage line
";

    #[test]
    fn test_parse_counts_dropped_lines() {
        let analyzer = Analyzer::parse_str(MISSION).unwrap();
        assert_eq!(analyzer.stats().dropped_lines, 1);
        assert_eq!(analyzer.log().numeric.len(), 10);
    }

    #[test]
    fn test_time_range_defaults_to_data_bounds() {
        let analyzer = Analyzer::parse_str(MISSION).unwrap();
        assert_eq!(analyzer.time_range(&AnalysisConfig::new()), TimeRange::new(0.0, 20.0));
        let config = AnalysisConfig::new().with_time_range(Some(5.0), None);
        assert_eq!(analyzer.time_range(&config), TimeRange::new(5.0, 20.0));
    }

    #[test]
    fn test_vehicle_range_ignores_numeric_bounds() {
        let analyzer = Analyzer::parse_str(
            "0;NODE_REPORT_UAV1;NAME=uav1,X=0,Y=0\n\
             10;DESIRED_SPEED;5\n\
             15;NODE_REPORT_UAV1;NAME=uav1,X=5,Y=0\n\
             20;DESIRED_SPEED;5\n\
             40;NODE_REPORT_UAV1;NAME=uav1,X=10,Y=0\n",
        )
        .unwrap();
        let report = analyzer.analyze(&AnalysisConfig::new()).unwrap();
        assert_eq!(report.time_range, TimeRange::new(10.0, 20.0));

        let vehicle = &report.vehicles[0];
        let segments = &vehicle.trajectory.segments;
        assert_eq!(segments.before.len() + segments.active.len() + segments.after.len(), 3);
        assert_eq!(segments.active.len(), 3);
        assert_eq!(vehicle.window.stop(), 40.0);
        assert_eq!(vehicle.window.stop_source, StopSource::EndOfData);
    }

    #[test]
    fn test_analyze_mission() {
        let analyzer = Analyzer::parse_str(MISSION).unwrap();
        let config = AnalysisConfig::new().with_helm_start(0.0);
        let report = analyzer.analyze(&config).unwrap();

        assert_eq!(report.window.stop(), 20.0);
        assert_eq!(report.window.stop_source, StopSource::DesiredSpeedZero);
        assert_eq!(
            report.desired_path.unwrap().vertices,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
        assert_eq!(report.desired_altitude.value, 100.0);
        assert_eq!(report.desired_altitude.source, AltitudeSource::WindowAverage);

        let ownship = report.ownship.unwrap();
        assert_eq!(ownship.segments.active.len(), 3);
        // round(0.5 * 3) = 2 with ties to even
        assert_eq!(ownship.anchor.unwrap().time, 20.0);
        assert_eq!(ownship.helm_stop_marker.unwrap().time, 20.0);
        assert!(report.vehicles.is_empty());

        let speed_pair = &report.channel_pairs[1];
        assert_eq!(speed_pair.desired, "DESIRED_SPEED");
        assert!(!speed_pair.available);
    }

    #[test]
    fn test_literal_path_overrides_log() {
        let analyzer = Analyzer::parse_str(MISSION).unwrap();
        let config = AnalysisConfig::new().with_desired_path("points=5,5:6,6");
        let path = analyzer.desired_path(&config).unwrap();
        assert_eq!(path.vertices, vec![Point::new(5.0, 5.0), Point::new(6.0, 6.0)]);
        assert_eq!(path.announced_at, None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let analyzer = Analyzer::parse_str(MISSION).unwrap();
        let config = AnalysisConfig::new().with_desired_path("nonsense");
        assert!(analyzer.analyze(&config).is_err());
    }

    #[test]
    fn test_empty_log_degrades() {
        let analyzer = Analyzer::parse_str("").unwrap();
        let report = analyzer.analyze(&AnalysisConfig::new()).unwrap();
        assert!(report.ownship.is_none());
        assert!(report.desired_path.is_none());
        assert_eq!(report.desired_altitude.source, AltitudeSource::Fallback);
        assert!(report.window.window.is_open());
    }
}
