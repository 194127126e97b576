//! Variable-name classification
//!
//! Every decoded event is tagged exactly once with an [`EventKind`] so the
//! downstream handlers match on a variant instead of re-testing name
//! prefixes at each call site.

use serde::Serialize;

/// Helm mode flag (current name)
pub const AUTOPILOT_MODE: &str = "AUTOPILOT_MODE";
/// Helm mode flag (legacy name)
pub const LEGACY_MODE: &str = "MODE";
/// Single-waypoint path announcement
pub const TOWAYPT_UPDATE: &str = "TOWAYPT_UPDATE";
/// Survey path announcement (optionally suffixed with `_<NAME>`)
pub const SURVEY_UPDATE: &str = "SURVEY_UPDATE";
/// Structured vehicle status report (optionally suffixed)
pub const NODE_REPORT: &str = "NODE_REPORT";

pub const DESIRED_SPEED: &str = "DESIRED_SPEED";
pub const DESIRED_HEADING: &str = "DESIRED_HEADING";
pub const DESIRED_ALTITUDE: &str = "DESIRED_ALTITUDE";
pub const NAV_X: &str = "NAV_X";
pub const NAV_Y: &str = "NAV_Y";
pub const NAV_ALTITUDE: &str = "NAV_ALTITUDE";
pub const NAV_HEADING: &str = "NAV_HEADING";
pub const NAV_SPEED: &str = "NAV_SPEED";

/// What a log variable means to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// `AUTOPILOT_MODE` or legacy `MODE`
    ModeFlag,
    /// `TOWAYPT_UPDATE`
    WaypointUpdate,
    /// `SURVEY_UPDATE` (owner `None`) or `SURVEY_UPDATE_<NAME>`
    SurveyUpdate { owner: Option<String> },
    /// Any variable starting with `NODE_REPORT`
    NodeReport,
    /// Everything else (plain telemetry channels)
    Channel,
}

impl EventKind {
    /// Classify a variable name
    pub fn of(variable: &str) -> Self {
        match variable {
            AUTOPILOT_MODE | LEGACY_MODE => return EventKind::ModeFlag,
            TOWAYPT_UPDATE => return EventKind::WaypointUpdate,
            _ => {}
        }

        if variable.starts_with(NODE_REPORT) {
            EventKind::NodeReport
        } else {
            match variable.strip_prefix(SURVEY_UPDATE) {
                Some(suffix) if suffix.is_empty() || suffix.starts_with('_') => {
                    EventKind::SurveyUpdate {
                        owner: survey_owner(suffix),
                    }
                }
                _ => EventKind::Channel,
            }
        }
    }

    pub fn is_node_report(&self) -> bool {
        matches!(self, EventKind::NodeReport)
    }
}

/// Owner name carried in a `SURVEY_UPDATE` suffix
///
/// `"_UAV1"` becomes `uav1`; an empty suffix means the update is not
/// addressed to a particular vehicle.
fn survey_owner(suffix: &str) -> Option<String> {
    let name = suffix.strip_prefix('_').unwrap_or_default().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_aliases() {
        assert_eq!(EventKind::of("AUTOPILOT_MODE"), EventKind::ModeFlag);
        assert_eq!(EventKind::of("MODE"), EventKind::ModeFlag);
        assert_eq!(EventKind::of("MODE_X"), EventKind::Channel);
    }

    #[test]
    fn test_survey_owner_is_lowercased() {
        assert_eq!(
            EventKind::of("SURVEY_UPDATE_UAV_ALPHA"),
            EventKind::SurveyUpdate {
                owner: Some("uav_alpha".to_string())
            }
        );
        assert_eq!(
            EventKind::of("SURVEY_UPDATE"),
            EventKind::SurveyUpdate { owner: None }
        );
    }

    #[test]
    fn test_survey_prefix_needs_separator() {
        assert_eq!(EventKind::of("SURVEY_UPDATES"), EventKind::Channel);
        assert_eq!(EventKind::of("SURVEY_UPDATE_COUNT_X"), EventKind::SurveyUpdate {
            owner: Some("count_x".to_string())
        });
        assert_eq!(EventKind::of("SURVEY_UPDATE_"), EventKind::SurveyUpdate { owner: None });
    }

    #[test]
    fn test_node_report_prefix() {
        assert!(EventKind::of("NODE_REPORT").is_node_report());
        assert!(EventKind::of("NODE_REPORT_LOCAL").is_node_report());
        assert_eq!(EventKind::of("NAV_X"), EventKind::Channel);
    }
}
