//! Active-window resolution
//!
//! The helm is trusted between its start and the moment it hands control
//! back. The stop is taken from the first source that yields one:
//!
//! 1. the caller's explicit stop,
//! 2. the first `NODE_REPORT` at or after the start whose value carries the
//!    RETURN behavior sentinel (attributed by an exact `NAME` field match
//!    when resolving a single vehicle),
//! 3. the first `DESIRED_SPEED` sample equal to zero at or after the start
//!    (global window only),
//! 4. the end of the data, or `+inf` when the log has no time bounds.
//!
//! A vehicle window falls back to the vehicle's own track for its start
//! and end of data, so a vehicle is not clipped to the numeric range.
//!
//! Rules 2 and 3 only run when stop inference is enabled and the caller
//! gave an explicit helm start.

use crate::classify::DESIRED_SPEED;
use crate::config::AnalysisConfig;
use crate::streams::categorical::CategoricalSeries;
use crate::streams::splitter::TelemetryLog;
use crate::types::ActiveWindow;
use serde::Serialize;
use std::collections::BTreeMap;

/// Report value marking the switch to the RETURN behavior
pub const RETURN_MODE_SENTINEL: &str = "MODE=BHV_MODE@ACTIVE:RETURN";

/// Which rule produced the stop time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopSource {
    Explicit,
    ReturnMode,
    DesiredSpeedZero,
    EndOfData,
    /// No bound at all; stop is `+inf`
    Unbounded,
}

/// An active window together with the origin of its stop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedWindow {
    #[serde(flatten)]
    pub window: ActiveWindow,
    pub stop_source: StopSource,
}

impl ResolvedWindow {
    pub fn start(&self) -> f64 {
        self.window.start
    }

    pub fn stop(&self) -> f64 {
        self.window.stop
    }
}

/// Computes active windows for one log and one configuration
pub struct WindowResolver<'a> {
    log: &'a TelemetryLog,
    config: &'a AnalysisConfig,
}

impl<'a> WindowResolver<'a> {
    pub fn new(log: &'a TelemetryLog, config: &'a AnalysisConfig) -> Self {
        Self { log, config }
    }

    /// Window start: helm start, else range start, else first sample
    pub fn start(&self) -> f64 {
        self.config
            .helm_start
            .or(self.config.time_start)
            .or(self.log.numeric.min_time())
            .or(self.log.categorical.min_time())
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Window shared by the whole log
    pub fn resolve(&self) -> ResolvedWindow {
        let start = self.start();
        let resolved = self
            .explicit_stop()
            .or_else(|| self.inferred(|| return_mode_time(&self.log.categorical, None, start), StopSource::ReturnMode))
            .or_else(|| self.inferred(|| self.zero_speed_time(start), StopSource::DesiredSpeedZero))
            .unwrap_or_else(|| self.end_of_data());

        self.finish(start, resolved, "global")
    }

    /// Window of one vehicle
    pub fn resolve_for(&self, vehicle: &str) -> ResolvedWindow {
        let track = self.log.fleet.get(vehicle);
        let start = self
            .config
            .helm_start
            .or(self.config.time_start)
            .or(track.and_then(|t| t.first_time()))
            .unwrap_or_else(|| self.start());
        let resolved = self
            .explicit_stop()
            .or_else(|| {
                self.inferred(
                    || return_mode_time(&self.log.categorical, Some(vehicle), start),
                    StopSource::ReturnMode,
                )
            })
            .unwrap_or_else(|| {
                let end = self.config.time_end.or(track.and_then(|t| t.last_time()));
                match end {
                    Some(end) => (end, StopSource::EndOfData),
                    None => self.end_of_data(),
                }
            });

        self.finish(start, resolved, vehicle)
    }

    /// Independent window for every vehicle with a track
    pub fn resolve_per_vehicle(&self) -> BTreeMap<String, ResolvedWindow> {
        self.log
            .fleet
            .names()
            .map(|name| (name.to_string(), self.resolve_for(name)))
            .collect()
    }

    fn explicit_stop(&self) -> Option<(f64, StopSource)> {
        self.config.helm_stop.map(|stop| (stop, StopSource::Explicit))
    }

    fn inferred<F>(&self, find: F, source: StopSource) -> Option<(f64, StopSource)>
    where
        F: FnOnce() -> Option<f64>,
    {
        if !self.config.auto_helm_stop || self.config.helm_start.is_none() {
            return None;
        }
        find().map(|stop| (stop, source))
    }

    fn zero_speed_time(&self, start: f64) -> Option<f64> {
        self.log
            .numeric
            .first_at_or_after(DESIRED_SPEED, start, |v| v == 0.0)
            .map(|s| s.time)
    }

    fn end_of_data(&self) -> (f64, StopSource) {
        match self.config.time_end.or(self.log.max_time()) {
            Some(end) => (end, StopSource::EndOfData),
            None => (f64::INFINITY, StopSource::Unbounded),
        }
    }

    fn finish(&self, start: f64, (stop, stop_source): (f64, StopSource), label: &str) -> ResolvedWindow {
        log::debug!(
            "Active window ({}): [{}, {}] stop from {:?}",
            label,
            start,
            stop,
            stop_source
        );
        if start > stop {
            log::warn!("Active window ({}) is inverted: start {} > stop {}", label, start, stop);
        }
        ResolvedWindow {
            window: ActiveWindow::new(start, stop),
            stop_source,
        }
    }
}

/// Time of the first RETURN sentinel report at or after `start`
///
/// With a vehicle name, only reports whose `NAME` field equals the name
/// count.
pub fn return_mode_time(series: &CategoricalSeries, vehicle: Option<&str>, start: f64) -> Option<f64> {
    series
        .node_reports()
        .filter(|e| e.time() >= start)
        .find(|e| {
            let value = e.value();
            value.contains(RETURN_MODE_SENTINEL) && vehicle.map_or(true, |name| names_vehicle(value, name))
        })
        .map(|e| e.time())
}

/// Whether a report value carries `NAME=<vehicle>` as a whole field
fn names_vehicle(value: &str, vehicle: &str) -> bool {
    value
        .split(',')
        .filter_map(|field| field.split_once('='))
        .any(|(key, name)| key.trim().eq_ignore_ascii_case("NAME") && name.trim() == vehicle)
}
