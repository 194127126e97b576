//! Configuration loading and parsing

use anyhow::{Context, Result};
use helm_log_decoder::config::{DEFAULT_ANCHOR_POSITION, DEFAULT_FALLBACK_ALTITUDE};
use helm_log_decoder::{AnalysisConfig, SurveyResolution};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub path: PathConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Region/marker side file
    pub region_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub time_start: Option<f64>,
    pub time_end: Option<f64>,
    pub helm_start: Option<f64>,
    pub helm_stop: Option<f64>,
    #[serde(default = "default_true")]
    pub auto_helm_stop: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            time_start: None,
            time_end: None,
            helm_start: None,
            helm_stop: None,
            auto_helm_stop: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathConfig {
    /// Literal desired path, e.g. "0,0:100,0:100,50"
    pub desired_path: Option<String>,
    pub desired_altitude: Option<f64>,
    #[serde(default = "default_fallback_altitude")]
    pub fallback_altitude: f64,
    /// Anchor position along the active trajectory (-1 = none)
    #[serde(default = "default_anchor_position")]
    pub anchor_position: f64,
    #[serde(default)]
    pub survey_resolution: SurveyResolution,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            desired_path: None,
            desired_altitude: None,
            fallback_altitude: DEFAULT_FALLBACK_ALTITUDE,
            anchor_position: DEFAULT_ANCHOR_POSITION,
            survey_resolution: SurveyResolution::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
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

impl AppConfig {
    /// Library configuration for one analysis run
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            time_start: self.window.time_start,
            time_end: self.window.time_end,
            helm_start: self.window.helm_start,
            helm_stop: self.window.helm_stop,
            auto_helm_stop: self.window.auto_helm_stop,
            desired_path: self.path.desired_path.clone(),
            desired_altitude: self.path.desired_altitude,
            fallback_altitude: self.path.fallback_altitude,
            anchor_position: self.path.anchor_position,
            survey_resolution: self.path.survey_resolution,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .analysis_config()
        .validate()
        .with_context(|| format!("Invalid settings in config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            files = ["mission_a.csv", "mission_b.csv"]
            region_file = "fires.txt"

            [window]
            helm_start = 120.0
            auto_helm_stop = false

            [path]
            desired_path = "0,0:100,0"
            anchor_position = -1.0
            survey_resolution = "immediate"

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.files.len(), 2);
        assert_eq!(config.input.region_file, Some(PathBuf::from("fires.txt")));
        assert_eq!(config.output.format, OutputFormat::Json);

        let analysis = config.analysis_config();
        assert_eq!(analysis.helm_start, Some(120.0));
        assert!(!analysis.auto_helm_stop);
        assert_eq!(analysis.anchor_position, -1.0);
        assert_eq!(analysis.survey_resolution, SurveyResolution::Immediate);
        assert_eq!(analysis.fallback_altitude, DEFAULT_FALLBACK_ALTITUDE);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.files.is_empty());
        assert!(config.window.auto_helm_stop);
        assert_eq!(config.output.format, OutputFormat::Txt);
        assert_eq!(config.analysis_config(), AnalysisConfig::default());
    }

    #[test]
    fn test_load_config_rejects_bad_path_literal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[path]\ndesired_path = \"not a path\"").unwrap();
        file.flush().unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Path::new("/nonexistent/config.toml")).is_err());
    }
}
