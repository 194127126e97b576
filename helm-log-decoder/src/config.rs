//! Analysis configuration types
//!
//! This module defines the parameters of a single analysis run: the time
//! range to look at, what the caller already knows about the helm window,
//! and the fallbacks to use when the log does not say.

use crate::mode_tracker::SurveyResolution;
use crate::resample::AnchorPosition;
use crate::streams::path::parse_path_value;
use crate::types::{DecoderError, DesiredPath, Result};
use serde::{Deserialize, Serialize};

/// Altitude used when the log carries no altitude at all
pub const DEFAULT_FALLBACK_ALTITUDE: f64 = 100.0;

/// Default anchor position: middle of the active trajectory
pub const DEFAULT_ANCHOR_POSITION: f64 = 0.5;

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Start of the analysis range (default: earliest sample)
    #[serde(default)]
    pub time_start: Option<f64>,

    /// End of the analysis range (default: latest sample)
    #[serde(default)]
    pub time_end: Option<f64>,

    /// Known helm start time
    #[serde(default)]
    pub helm_start: Option<f64>,

    /// Known helm stop time; overrides any inferred stop
    #[serde(default)]
    pub helm_stop: Option<f64>,

    /// Infer the helm stop from RETURN mode reports or zero desired speed
    #[serde(default = "default_true")]
    pub auto_helm_stop: bool,

    /// Literal desired path (`x,y:x,y:...`, optionally key-prefixed)
    #[serde(default)]
    pub desired_path: Option<String>,

    /// Literal desired altitude; skips altitude inference
    #[serde(default)]
    pub desired_altitude: Option<f64>,

    /// Altitude used when no altitude sample exists
    #[serde(default = "default_fallback_altitude")]
    pub fallback_altitude: f64,

    /// Fractional anchor position along the active trajectory (-1 = none)
    #[serde(default = "default_anchor_position")]
    pub anchor_position: f64,

    /// Timing rule for resolving survey paths
    #[serde(default)]
    pub survey_resolution: SurveyResolution,
}

fn default_true() -> bool {
    true
}

fn default_fallback_altitude() -> f64 {
    DEFAULT_FALLBACK_ALTITUDE
}

fn default_anchor_position() -> f64 {
    DEFAULT_ANCHOR_POSITION
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            time_start: None,
            time_end: None,
            helm_start: None,
            helm_stop: None,
            auto_helm_stop: true,
            desired_path: None,
            desired_altitude: None,
            fallback_altitude: DEFAULT_FALLBACK_ALTITUDE,
            anchor_position: DEFAULT_ANCHOR_POSITION,
            survey_resolution: SurveyResolution::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: restrict the analysis range
    pub fn with_time_range(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.time_start = start;
        self.time_end = end;
        self
    }

    /// Builder method: set the known helm start
    pub fn with_helm_start(mut self, start: f64) -> Self {
        self.helm_start = Some(start);
        self
    }

    /// Builder method: set the known helm stop
    pub fn with_helm_stop(mut self, stop: f64) -> Self {
        self.helm_stop = Some(stop);
        self
    }

    /// Builder method: enable or disable stop inference
    pub fn with_auto_helm_stop(mut self, enabled: bool) -> Self {
        self.auto_helm_stop = enabled;
        self
    }

    /// Builder method: supply a literal desired path
    pub fn with_desired_path(mut self, path: impl Into<String>) -> Self {
        self.desired_path = Some(path.into());
        self
    }

    /// Builder method: supply a literal desired altitude
    pub fn with_desired_altitude(mut self, altitude: f64) -> Self {
        self.desired_altitude = Some(altitude);
        self
    }

    /// Builder method: set the last-resort altitude
    pub fn with_fallback_altitude(mut self, altitude: f64) -> Self {
        self.fallback_altitude = altitude;
        self
    }

    /// Builder method: set the anchor position (-1 suppresses anchors)
    pub fn with_anchor_position(mut self, position: f64) -> Self {
        self.anchor_position = position;
        self
    }

    /// Builder method: choose the survey resolution rule
    pub fn with_survey_resolution(mut self, resolution: SurveyResolution) -> Self {
        self.survey_resolution = resolution;
        self
    }

    /// Anchor position as a typed value
    pub fn anchor(&self) -> AnchorPosition {
        AnchorPosition::from_value(self.anchor_position)
    }

    /// Parsed literal desired path, if one was supplied and is valid
    pub fn literal_desired_path(&self) -> Option<DesiredPath> {
        self.desired_path
            .as_deref()
            .and_then(parse_path_value)
            .map(DesiredPath::from_vertices)
    }

    /// Check that every supplied value is usable
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("time_start", self.time_start),
            ("time_end", self.time_end),
            ("helm_start", self.helm_start),
            ("helm_stop", self.helm_stop),
            ("desired_altitude", self.desired_altitude),
        ];
        for (name, value) in bounds {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(DecoderError::InvalidConfig(format!("{} must be finite, got {}", name, v)));
                }
            }
        }

        if !self.fallback_altitude.is_finite() {
            return Err(DecoderError::InvalidConfig(format!(
                "fallback_altitude must be finite, got {}",
                self.fallback_altitude
            )));
        }

        if !self.anchor_position.is_finite() {
            return Err(DecoderError::InvalidConfig(format!(
                "anchor_position must be finite, got {}",
                self.anchor_position
            )));
        }

        if let Some(path) = &self.desired_path {
            if parse_path_value(path).is_none() {
                return Err(DecoderError::InvalidConfig(format!(
                    "desired_path is not an x,y:x,y list: {:?}",
                    path
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    #[test]
    fn test_analysis_config_builder() {
        let config = AnalysisConfig::new()
            .with_time_range(Some(10.0), None)
            .with_helm_start(20.0)
            .with_auto_helm_stop(false)
            .with_desired_path("10,20:15,25")
            .with_anchor_position(-1.0)
            .with_survey_resolution(SurveyResolution::Immediate);

        assert_eq!(config.time_start, Some(10.0));
        assert_eq!(config.helm_start, Some(20.0));
        assert!(!config.auto_helm_stop);
        assert_eq!(config.anchor(), AnchorPosition::Suppressed);
        assert_eq!(
            config.literal_desired_path().unwrap().vertices,
            vec![Point::new(10.0, 20.0), Point::new(15.0, 25.0)]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert!(config.auto_helm_stop);
        assert_eq!(config.fallback_altitude, DEFAULT_FALLBACK_ALTITUDE);
        assert_eq!(config.anchor(), AnchorPosition::Fraction(0.5));
        assert_eq!(config.survey_resolution, SurveyResolution::Deferred);
        assert!(config.literal_desired_path().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(AnalysisConfig::new().with_helm_start(f64::NAN).validate().is_err());
        assert!(AnalysisConfig::new().with_anchor_position(f64::INFINITY).validate().is_err());
        assert!(AnalysisConfig::new().with_desired_path("not a path").validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"helm_start": 5.0, "survey_resolution": "immediate"}"#).unwrap();
        assert_eq!(config.helm_start, Some(5.0));
        assert!(config.auto_helm_stop);
        assert_eq!(config.anchor_position, DEFAULT_ANCHOR_POSITION);
        assert_eq!(config.survey_resolution, SurveyResolution::Immediate);
    }
}
