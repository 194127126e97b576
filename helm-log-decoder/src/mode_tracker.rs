//! Helm mode tracking and desired-path resolution
//!
//! The helm announces what it is doing through a mode flag
//! (`AUTOPILOT_MODE`, or `MODE` in older logs) and announces the path it is
//! following through `TOWAYPT_UPDATE` / `SURVEY_UPDATE`. The two arrive
//! independently and in any order, so the tracker keeps the latest
//! announcement of each kind as a pending path and emits one as soon as the
//! matching mode is active.
//!
//! Resolution is a single fold over the time-ordered categorical stream.
//! The first qualifying `(mode, pending path)` pair wins and scanning stops.
//!
//! Two timing rules exist for survey paths, see [`SurveyResolution`].

use crate::classify::EventKind;
use crate::streams::categorical::{CategoricalSeries, ClassifiedEvent};
use crate::streams::path::parse_path_value;
use crate::types::{DesiredPath, Point};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

/// Mode flag value for waypoint following
pub const HELM_TOWAYPT: &str = "HELM_TOWAYPT";
/// Mode flag value for survey patterns
pub const HELM_SURVEYING: &str = "HELM_SURVEYING";

/// High-level helm behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HelmMode {
    /// A mode flag was seen but names no path-following behavior
    NoMode,
    ToWaypoint,
    Surveying,
}

impl HelmMode {
    /// Interpret a mode flag value
    pub fn from_flag(value: &str) -> Self {
        match value.trim() {
            HELM_TOWAYPT => HelmMode::ToWaypoint,
            HELM_SURVEYING => HelmMode::Surveying,
            _ => HelmMode::NoMode,
        }
    }
}

/// When a pending survey path is emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyResolution {
    /// Emit only while the current mode is `Surveying`
    Immediate,
    /// Emit once `Surveying` has been seen at any point of the scan
    #[default]
    Deferred,
}

/// A path announcement waiting for its mode
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPath {
    pub time: f64,
    pub vertices: Vec<Point>,
}

impl PendingPath {
    fn into_desired_path(self) -> DesiredPath {
        DesiredPath {
            vertices: self.vertices,
            owner: None,
            announced_at: Some(self.time),
        }
    }
}

/// Tracker state between two events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    /// `None` until the first mode flag is observed
    pub mode: Option<HelmMode>,
    pub pending_waypoint: Option<PendingPath>,
    pub pending_survey: Option<PendingPath>,
    pub surveying_seen: bool,
}

/// Outcome of feeding one event to the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue(TrackerState),
    Resolved(DesiredPath),
}

/// Desired-path resolver over a categorical stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeTracker {
    resolution: SurveyResolution,
}

impl ModeTracker {
    pub fn new(resolution: SurveyResolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> SurveyResolution {
        self.resolution
    }

    /// Transition function: apply one event and check for a resolution
    pub fn step(&self, mut state: TrackerState, event: &ClassifiedEvent) -> Step {
        match &event.kind {
            EventKind::ModeFlag => {
                let mode = HelmMode::from_flag(event.value());
                if mode == HelmMode::Surveying {
                    state.surveying_seen = true;
                }
                state.mode = Some(mode);
            }
            EventKind::WaypointUpdate => {
                if let Some(pending) = pending_from(event) {
                    state.pending_waypoint = Some(pending);
                }
            }
            // suffixed updates are per-vehicle and never drive the ownship helm
            EventKind::SurveyUpdate { owner: None } => {
                if let Some(pending) = pending_from(event) {
                    state.pending_survey = Some(pending);
                }
            }
            EventKind::SurveyUpdate { .. } | EventKind::NodeReport | EventKind::Channel => {}
        }

        if state.mode == Some(HelmMode::ToWaypoint) {
            if let Some(pending) = state.pending_waypoint.take() {
                return Step::Resolved(pending.into_desired_path());
            }
        }

        let survey_ready = match self.resolution {
            SurveyResolution::Immediate => state.mode == Some(HelmMode::Surveying),
            SurveyResolution::Deferred => state.surveying_seen,
        };
        if survey_ready {
            if let Some(pending) = state.pending_survey.take() {
                return Step::Resolved(pending.into_desired_path());
            }
        }

        Step::Continue(state)
    }

    /// Resolve the desired path from events at or after `start_time`
    ///
    /// `events` must be in ascending time order. Returns `None` when no
    /// mode and pending path ever line up.
    pub fn resolve<'a, I>(&self, events: I, start_time: f64) -> Option<DesiredPath>
    where
        I: IntoIterator<Item = &'a ClassifiedEvent>,
    {
        let outcome = events
            .into_iter()
            .filter(|e| e.time() >= start_time)
            .try_fold(TrackerState::default(), |state, event| {
                match self.step(state, event) {
                    Step::Continue(state) => ControlFlow::Continue(state),
                    Step::Resolved(path) => ControlFlow::Break(path),
                }
            });

        match outcome {
            ControlFlow::Break(path) => {
                log::debug!(
                    "Resolved desired path with {} vertices (announced at t={:?})",
                    path.len(),
                    path.announced_at
                );
                Some(path)
            }
            ControlFlow::Continue(state) => {
                log::debug!("No desired path resolved (final mode: {:?})", state.mode);
                None
            }
        }
    }

    /// Resolve over a whole categorical series
    pub fn resolve_series(&self, series: &CategoricalSeries, start_time: f64) -> Option<DesiredPath> {
        self.resolve(series.iter(), start_time)
    }
}

/// Helm mode in force at `time` (latest mode flag at or before it)
pub fn mode_at(series: &CategoricalSeries, time: f64) -> Option<HelmMode> {
    series
        .iter()
        .take_while(|e| e.time() <= time)
        .filter(|e| e.kind == EventKind::ModeFlag)
        .last()
        .map(|e| HelmMode::from_flag(e.value()))
}

fn pending_from(event: &ClassifiedEvent) -> Option<PendingPath> {
    match parse_path_value(event.value()) {
        Some(vertices) => Some(PendingPath {
            time: event.time(),
            vertices,
        }),
        None => {
            log::warn!(
                "Ignoring {} at t={}: no point list",
                event.event.variable,
                event.time()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(events: &[(f64, &str, &str)]) -> CategoricalSeries {
        events
            .iter()
            .map(|&(t, var, val)| ClassifiedEvent::new(t, var, val))
            .collect()
    }

    fn points(pairs: &[(f64, f64)]) -> Vec<Point> {
        pairs.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_survey_path_after_mode() {
        let events = series(&[
            (0.0, "AUTOPILOT_MODE", "HELM_SURVEYING"),
            (1.0, "SURVEY_UPDATE", "pts={0,0:10,0:10,10}"),
        ]);

        for resolution in [SurveyResolution::Deferred, SurveyResolution::Immediate] {
            let path = ModeTracker::new(resolution).resolve_series(&events, 0.0).unwrap();
            assert_eq!(path.vertices, points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]));
            assert_eq!(path.announced_at, Some(1.0));
        }
    }

    #[test]
    fn test_waypoint_first_match_wins() {
        let events = series(&[
            (0.0, "AUTOPILOT_MODE", "HELM_TOWAYPT"),
            (5.0, "TOWAYPT_UPDATE", "points=1,1:2,2"),
            (6.0, "AUTOPILOT_MODE", "HELM_SURVEYING"),
            (7.0, "SURVEY_UPDATE", "pts={9,9:8,8}"),
            (8.0, "AUTOPILOT_MODE", "HELM_TOWAYPT"),
            (9.0, "TOWAYPT_UPDATE", "points=3,3:4,4"),
        ]);

        let path = ModeTracker::default().resolve_series(&events, 0.0).unwrap();
        assert_eq!(path.vertices, points(&[(1.0, 1.0), (2.0, 2.0)]));
    }

    #[test]
    fn test_legacy_mode_flag() {
        let events = series(&[
            (0.0, "MODE", "HELM_TOWAYPT"),
            (1.0, "TOWAYPT_UPDATE", "points = 5,5:6,6"),
        ]);
        let path = ModeTracker::default().resolve_series(&events, 0.0).unwrap();
        assert_eq!(path.vertices, points(&[(5.0, 5.0), (6.0, 6.0)]));
    }

    #[test]
    fn test_start_time_is_inclusive() {
        let events = series(&[
            (0.0, "AUTOPILOT_MODE", "HELM_TOWAYPT"),
            (1.0, "TOWAYPT_UPDATE", "points=1,1"),
            (2.0, "AUTOPILOT_MODE", "HELM_TOWAYPT"),
            (3.0, "TOWAYPT_UPDATE", "points=2,2"),
        ]);

        let tracker = ModeTracker::default();
        assert_eq!(tracker.resolve_series(&events, 2.0).unwrap().vertices, points(&[(2.0, 2.0)]));
        assert_eq!(tracker.resolve_series(&events, 1.0).unwrap().vertices, points(&[(1.0, 1.0)]));
        assert!(tracker.resolve_series(&events, 3.5).is_none());
    }

    #[test]
    fn test_flapping_mode_variants_differ() {
        let events = series(&[
            (0.0, "AUTOPILOT_MODE", "HELM_SURVEYING"),
            (1.0, "AUTOPILOT_MODE", "HELM_PARK"),
            (2.0, "SURVEY_UPDATE", "pts={0,0:5,5}"),
        ]);

        assert!(ModeTracker::new(SurveyResolution::Immediate)
            .resolve_series(&events, 0.0)
            .is_none());
        let path = ModeTracker::new(SurveyResolution::Deferred)
            .resolve_series(&events, 0.0)
            .unwrap();
        assert_eq!(path.vertices, points(&[(0.0, 0.0), (5.0, 5.0)]));
    }

    #[test]
    fn test_pending_before_mode_is_emitted_on_entry() {
        let events = series(&[
            (0.0, "SURVEY_UPDATE", "pts={1,1:2,2}"),
            (1.0, "SURVEY_UPDATE", "pts={3,3:4,4}"),
            (2.0, "AUTOPILOT_MODE", "HELM_SURVEYING"),
        ]);

        let path = ModeTracker::new(SurveyResolution::Immediate)
            .resolve_series(&events, 0.0)
            .unwrap();
        assert_eq!(path.vertices, points(&[(3.0, 3.0), (4.0, 4.0)]));
    }

    #[test]
    fn test_suffixed_and_malformed_updates_are_ignored() {
        let events = series(&[
            (0.0, "AUTOPILOT_MODE", "HELM_SURVEYING"),
            (1.0, "SURVEY_UPDATE_UAV1", "pts={1,1:2,2}"),
            (2.0, "SURVEY_UPDATE", "garbage"),
        ]);
        assert!(ModeTracker::default().resolve_series(&events, 0.0).is_none());
    }

    #[test]
    fn test_no_mode_is_null_result() {
        let events = series(&[(0.0, "TOWAYPT_UPDATE", "points=1,1:2,2")]);
        assert!(ModeTracker::default().resolve_series(&events, 0.0).is_none());
        assert!(ModeTracker::default()
            .resolve_series(&CategoricalSeries::new(), 0.0)
            .is_none());
    }

    #[test]
    fn test_mode_at() {
        let events = series(&[
            (1.0, "AUTOPILOT_MODE", "HELM_TOWAYPT"),
            (5.0, "AUTOPILOT_MODE", "HELM_SURVEYING"),
            (9.0, "AUTOPILOT_MODE", "HELM_INACTIVE"),
        ]);
        assert_eq!(mode_at(&events, 0.5), None);
        assert_eq!(mode_at(&events, 1.0), Some(HelmMode::ToWaypoint));
        assert_eq!(mode_at(&events, 7.0), Some(HelmMode::Surveying));
        assert_eq!(mode_at(&events, 9.0), Some(HelmMode::NoMode));
    }
}
