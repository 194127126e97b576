//! Stream splitter
//!
//! Folds decoded [`LogEvent`]s into the typed tables the rest of the engine
//! reads: a numeric series, a categorical series, per-vehicle tracks and
//! per-vehicle survey paths.

use crate::classify::EventKind;
use crate::streams::categorical::{CategoricalSeries, ClassifiedEvent};
use crate::streams::fleet::{Fleet, VehicleReport};
use crate::streams::numeric::NumericSeries;
use crate::streams::path::parse_path_value;
use crate::types::{DesiredPath, LogEvent};
use std::collections::BTreeMap;

/// Owner used for `SURVEY_UPDATE` events without a vehicle suffix
pub const UNKNOWN_OWNER: &str = "unknown";

/// Everything the engine knows about one closed log
#[derive(Debug, Clone, Default)]
pub struct TelemetryLog {
    pub numeric: NumericSeries,
    pub categorical: CategoricalSeries,
    pub fleet: Fleet,
    /// Latest survey path per owner (lower-cased vehicle name)
    pub survey_paths: BTreeMap<String, DesiredPath>,
    pub stats: LogStats,
}

impl TelemetryLog {
    /// Earliest time seen in any table
    pub fn min_time(&self) -> Option<f64> {
        self.numeric.min_time().or(self.categorical.min_time())
    }

    /// Latest time seen in any table
    pub fn max_time(&self) -> Option<f64> {
        self.numeric.max_time().or(self.categorical.max_time())
    }

    /// Survey path announced for a vehicle (names compare case-insensitively)
    pub fn survey_path_for(&self, vehicle: &str) -> Option<&DesiredPath> {
        self.survey_paths.get(&vehicle.to_lowercase())
    }
}

/// Counters collected while splitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LogStats {
    /// Lines dropped by the event decoder (bad timestamp, too few fields)
    pub dropped_lines: usize,
    /// Events that reached the splitter
    pub events: usize,
    pub numeric_samples: usize,
    pub categorical_events: usize,
    /// Node reports accepted into a vehicle track
    pub node_reports: usize,
    /// Node reports discarded for missing `NAME`, `X` or `Y`
    pub discarded_reports: usize,
    /// Survey announcements whose point list could not be decoded
    pub discarded_paths: usize,
}

/// Splits a decoded event stream into typed tables
#[derive(Debug, Default)]
pub struct StreamSplitter {
    log: TelemetryLog,
}

impl StreamSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a complete event stream in one call
    pub fn split<I>(events: I) -> TelemetryLog
    where
        I: IntoIterator<Item = LogEvent>,
    {
        let mut splitter = Self::new();
        for event in events {
            splitter.push(event);
        }
        splitter.finish()
    }

    /// Fold one event into the tables
    pub fn push(&mut self, event: LogEvent) {
        let tables = &mut self.log;
        tables.stats.events += 1;

        if let Some(value) = event.numeric_value() {
            tables.numeric.push(&event.name, event.time, value);
            tables.stats.numeric_samples += 1;
        }

        let classified = ClassifiedEvent::new(event.time, &event.name, &event.raw_value);

        match &classified.kind {
            EventKind::NodeReport => match VehicleReport::parse(&event.raw_value) {
                Some(report) => {
                    tables.fleet.record(event.time, &report);
                    tables.stats.node_reports += 1;
                }
                None => {
                    log::warn!(
                        "Discarding {} at t={}: missing NAME, X or Y",
                        event.name,
                        event.time
                    );
                    tables.stats.discarded_reports += 1;
                }
            },
            EventKind::SurveyUpdate { owner } => {
                let owner = owner.as_deref().unwrap_or(UNKNOWN_OWNER);
                record_survey_path(tables, owner, event.time, &event.raw_value);
            }
            EventKind::ModeFlag | EventKind::WaypointUpdate | EventKind::Channel => {}
        }

        tables.categorical.push(classified);
        tables.stats.categorical_events += 1;
    }

    /// Record lines the decoder dropped before they became events
    pub fn note_dropped(&mut self, lines: usize) {
        self.log.stats.dropped_lines += lines;
    }

    /// Sort all tables by time and hand them over
    pub fn finish(mut self) -> TelemetryLog {
        self.log.numeric.sort_by_time();
        self.log.categorical.sort_by_time();
        self.log.fleet.sort_by_time();

        log::info!(
            "Split {} events: {} numeric, {} categorical, {} vehicles",
            self.log.stats.events,
            self.log.stats.numeric_samples,
            self.log.stats.categorical_events,
            self.log.fleet.len()
        );

        self.log
    }
}

/// Keep the most recent survey path of each owner
fn record_survey_path(tables: &mut TelemetryLog, owner: &str, time: f64, value: &str) {
    let Some(vertices) = parse_path_value(value) else {
        log::warn!("Discarding survey update for {} at t={}: no point list", owner, time);
        tables.stats.discarded_paths += 1;
        return;
    };

    let newer = tables
        .survey_paths
        .get(owner)
        .and_then(|p| p.announced_at)
        .map_or(true, |previous| time >= previous);

    if newer {
        tables.survey_paths.insert(
            owner.to_string(),
            DesiredPath {
                vertices,
                owner: Some(owner.to_string()),
                announced_at: Some(time),
            },
        );
    }
}
