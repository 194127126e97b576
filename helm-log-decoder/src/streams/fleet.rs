//! Per-vehicle demultiplexing of `NODE_REPORT` broadcasts
//!
//! Several cooperating vehicles report into one merged log. Each report is
//! decoded into a [`VehicleReport`] and appended to the [`VehicleTrack`] of
//! the vehicle it names. Tracks live in a [`Fleet`] built once per log.

use crate::types::{parse_real, TimeRange};
use serde::Serialize;
use std::collections::HashMap;

/// Display color used when a vehicle never reports one
pub const DEFAULT_COLOR: &str = "blue";

/// One decoded `NODE_REPORT` value
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleReport {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub altitude: Option<f64>,
    pub color: Option<String>,
    /// Behavior mode string, e.g. `BHV_MODE@ACTIVE:RETURN`
    pub mode: Option<String>,
}

impl VehicleReport {
    /// Decode a comma-separated `KEY=VALUE` list
    ///
    /// Returns `None` if `NAME`, `X` or `Y` is missing or unparseable; such
    /// a report cannot be attributed or placed.
    pub fn parse(value: &str) -> Option<Self> {
        let mut name = None;
        let mut x = None;
        let mut y = None;
        let mut altitude = None;
        let mut color = None;
        let mut mode = None;

        for field in value.split(',') {
            let Some((key, val)) = field.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let val = val.trim();

            // first occurrence of a key wins
            if key.eq_ignore_ascii_case("NAME") {
                name = name.or_else(|| Some(val.to_string()).filter(|v| !v.is_empty()));
            } else if key.eq_ignore_ascii_case("X") {
                x = x.or_else(|| parse_real(val));
            } else if key.eq_ignore_ascii_case("Y") {
                y = y.or_else(|| parse_real(val));
            } else if key.eq_ignore_ascii_case("ALTITUDE") {
                altitude = altitude.or_else(|| parse_real(val));
            } else if key.eq_ignore_ascii_case("COLOR") {
                color = color.or_else(|| Some(val.to_string()).filter(|v| !v.is_empty()));
            } else if key.eq_ignore_ascii_case("MODE") {
                mode = mode.or_else(|| Some(val.to_string()));
            }
        }

        Some(Self {
            name: name?,
            x: x?,
            y: y?,
            altitude,
            color,
            mode,
        })
    }
}

/// One position fix of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub altitude: Option<f64>,
}

/// Append-only position history of one vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleTrack {
    pub name: String,
    pub color: String,
    pub samples: Vec<TrackSample>,
}

impl VehicleTrack {
    fn new(name: &str, color: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            color: color.unwrap_or(DEFAULT_COLOR).to_string(),
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples inside `range`, in time order
    pub fn samples_in(&self, range: TimeRange) -> impl Iterator<Item = &TrackSample> {
        self.samples.iter().filter(move |s| range.contains(s.time))
    }

    pub fn first_time(&self) -> Option<f64> {
        self.samples.first().map(|s| s.time)
    }

    pub fn last_time(&self) -> Option<f64> {
        self.samples.last().map(|s| s.time)
    }
}

/// All vehicle tracks of one log, in order of first sighting
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    tracks: Vec<VehicleTrack>,
    /// Name lookup: name -> index in `tracks`
    index: HashMap<String, usize>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report to its vehicle's track, creating the track on first sighting
    pub fn record(&mut self, time: f64, report: &VehicleReport) {
        let idx = match self.index.get(&report.name) {
            Some(&idx) => idx,
            None => {
                log::debug!("New vehicle in node reports: {}", report.name);
                self.tracks
                    .push(VehicleTrack::new(&report.name, report.color.as_deref()));
                self.index.insert(report.name.clone(), self.tracks.len() - 1);
                self.tracks.len() - 1
            }
        };

        self.tracks[idx].samples.push(TrackSample {
            time,
            x: report.x,
            y: report.y,
            altitude: report.altitude,
        });
    }

    /// Stable sort of every track by time
    pub fn sort_by_time(&mut self) {
        for track in &mut self.tracks {
            track.samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
    }

    pub fn get(&self, name: &str) -> Option<&VehicleTrack> {
        self.index.get(name).map(|&idx| &self.tracks[idx])
    }

    pub fn tracks(&self) -> &[VehicleTrack] {
        &self.tracks
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_report() {
        let report =
            VehicleReport::parse("NAME=uav1,X=10.5,Y=-3,SPD=12,ALTITUDE=90,COLOR=red,MODE=BHV_MODE@ACTIVE:SURVEY")
                .unwrap();
        assert_eq!(report.name, "uav1");
        assert_eq!(report.x, 10.5);
        assert_eq!(report.y, -3.0);
        assert_eq!(report.altitude, Some(90.0));
        assert_eq!(report.color.as_deref(), Some("red"));
        assert_eq!(report.mode.as_deref(), Some("BHV_MODE@ACTIVE:SURVEY"));
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(VehicleReport::parse("NAME=uav1,Y=2").is_none());
        assert!(VehicleReport::parse("NAME=uav1,X=1").is_none());
        assert!(VehicleReport::parse("X=1,Y=2").is_none());
        assert!(VehicleReport::parse("NAME=uav1,X=abc,Y=2").is_none());
    }

    #[test]
    fn test_index_key_does_not_shadow_x() {
        let report = VehicleReport::parse("NAME=a,INDEX=7,X=1,Y=2").unwrap();
        assert_eq!(report.x, 1.0);
    }

    #[test]
    fn test_fleet_creates_tracks_lazily() {
        let mut fleet = Fleet::new();
        let a = VehicleReport::parse("NAME=a,X=0,Y=0").unwrap();
        let b = VehicleReport::parse("NAME=b,X=5,Y=5,COLOR=green").unwrap();
        fleet.record(2.0, &a);
        fleet.record(1.0, &b);
        fleet.record(1.0, &a);
        fleet.sort_by_time();

        assert_eq!(fleet.names().collect::<Vec<_>>(), vec!["a", "b"]);
        let track_a = fleet.get("a").unwrap();
        assert_eq!(track_a.color, DEFAULT_COLOR);
        assert_eq!(track_a.first_time(), Some(1.0));
        assert_eq!(track_a.last_time(), Some(2.0));
        assert_eq!(fleet.get("b").unwrap().color, "green");
        assert!(fleet.get("c").is_none());
    }
}
