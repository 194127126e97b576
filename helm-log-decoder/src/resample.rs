//! Trajectory resampling
//!
//! Channels are logged independently, so a position fix rarely has all of
//! `x`, `y` and altitude at the same timestamp. The [`Resampler`] merges any
//! set of columns onto the union of their timestamps and fills gaps by
//! linear interpolation in time. A column is never extrapolated: outside the
//! span of its own samples it stays undefined.
//!
//! On top of the merged table this module provides:
//! - [`Trajectory`] with before/active/after segmentation and markers
//! - anchor selection along the active part ([`AnchorPosition`])
//! - desired-altitude inference ([`infer_desired_altitude`])

use crate::classify::{DESIRED_ALTITUDE, NAV_ALTITUDE};
use crate::streams::fleet::VehicleTrack;
use crate::streams::numeric::NumericSeries;
use crate::types::{ActiveWindow, NumericSample, TimeRange};
use serde::Serialize;
use std::collections::BTreeMap;

/// Column names used for vehicle tracks
pub const COLUMN_X: &str = "x";
pub const COLUMN_Y: &str = "y";
pub const COLUMN_ALTITUDE: &str = "altitude";

/// Merged, time-ordered table with one row per distinct timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResampledTable {
    pub times: Vec<f64>,
    /// One value per row; `None` outside the column's sampled span
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl ResampledTable {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Value of `column` in row `row`
    pub fn value(&self, column: &str, row: usize) -> Option<f64> {
        self.columns.get(column)?.get(row).copied().flatten()
    }

    /// Row index of an exact timestamp
    pub fn row_at(&self, time: f64) -> Option<usize> {
        self.times.binary_search_by(|t| t.total_cmp(&time)).ok()
    }
}

/// Collects per-column samples and merges them into a [`ResampledTable`]
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    columns: BTreeMap<String, Vec<NumericSample>>,
}

impl Resampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample to a column
    pub fn add(&mut self, column: &str, time: f64, value: f64) {
        self.columns
            .entry(column.to_string())
            .or_default()
            .push(NumericSample { time, value });
    }

    /// Columns taken from numeric variables, restricted to `range`
    ///
    /// Variables that have no sample in the range do not become columns.
    pub fn from_series(series: &NumericSeries, variables: &[&str], range: TimeRange) -> Self {
        let mut resampler = Self::new();
        for &variable in variables {
            for sample in series.samples(variable).iter().filter(|s| range.contains(s.time)) {
                resampler.add(variable, sample.time, sample.value);
            }
        }
        resampler
    }

    /// `x`, `y` and `altitude` columns of one vehicle, restricted to `range`
    pub fn from_track(track: &VehicleTrack, range: TimeRange) -> Self {
        let mut resampler = Self::new();
        for sample in track.samples_in(range) {
            resampler.add(COLUMN_X, sample.time, sample.x);
            resampler.add(COLUMN_Y, sample.time, sample.y);
            if let Some(altitude) = sample.altitude {
                resampler.add(COLUMN_ALTITUDE, sample.time, altitude);
            }
        }
        resampler
    }

    /// Merge all columns onto the union of their timestamps
    pub fn resample(&self) -> ResampledTable {
        let known: BTreeMap<&str, Vec<NumericSample>> = self
            .columns
            .iter()
            .map(|(name, samples)| (name.as_str(), distinct_by_time(samples)))
            .collect();

        let mut times: Vec<f64> = known.values().flatten().map(|s| s.time).collect();
        times.sort_by(f64::total_cmp);
        times.dedup();

        let columns = known
            .iter()
            .map(|(name, samples)| {
                let values = times.iter().map(|&t| interpolate_at(samples, t)).collect();
                (name.to_string(), values)
            })
            .collect();

        ResampledTable { times, columns }
    }
}

/// Time-sorted copy with one sample per timestamp (the first one logged)
fn distinct_by_time(samples: &[NumericSample]) -> Vec<NumericSample> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    sorted.dedup_by(|later, earlier| later.time == earlier.time);
    sorted
}

/// Linear interpolation of time-sorted `samples` at `time`
///
/// Returns `None` outside `[first.time, last.time]`.
pub fn interpolate_at(samples: &[NumericSample], time: f64) -> Option<f64> {
    let idx = samples.partition_point(|s| s.time < time);
    let after = samples.get(idx)?;
    if after.time == time {
        return Some(after.value);
    }
    let before = samples.get(idx.checked_sub(1)?)?;

    let fraction = (time - before.time) / (after.time - before.time);
    Some(before.value + (after.value - before.value) * fraction)
}

/// One position fix on a trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub altitude: Option<f64>,
}

/// Time-ordered positions of one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    pub points: Vec<TrajectoryPoint>,
}

/// A trajectory split against an active window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectorySegments {
    /// Points with `time < start`
    pub before: Trajectory,
    /// Points with `start <= time <= stop`
    pub active: Trajectory,
    /// Points with `time > stop`
    pub after: Trajectory,
}

impl Trajectory {
    /// Rows of `table` where both position columns are defined
    pub fn from_table(table: &ResampledTable, x: &str, y: &str, altitude: &str) -> Self {
        let points = (0..table.len())
            .filter_map(|row| {
                Some(TrajectoryPoint {
                    time: table.times[row],
                    x: table.value(x, row)?,
                    y: table.value(y, row)?,
                    altitude: table.value(altitude, row),
                })
            })
            .collect();
        Self { points }
    }

    /// Resampled trajectory of one vehicle inside `range`
    pub fn from_track(track: &VehicleTrack, range: TimeRange) -> Self {
        let table = Resampler::from_track(track, range).resample();
        Self::from_table(&table, COLUMN_X, COLUMN_Y, COLUMN_ALTITUDE)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Split into before/active/after segments
    pub fn split(&self, window: ActiveWindow) -> TrajectorySegments {
        let mut segments = TrajectorySegments::default();
        for point in &self.points {
            let segment = if point.time < window.start {
                &mut segments.before
            } else if point.time > window.stop {
                &mut segments.after
            } else if window.contains(point.time) {
                &mut segments.active
            } else {
                // inverted window: between stop and start belongs nowhere
                continue;
            };
            segment.points.push(*point);
        }
        segments
    }

    /// Point whose time is closest to `time` (earliest on ties)
    pub fn nearest(&self, time: f64) -> Option<&TrajectoryPoint> {
        if time.is_nan() {
            return None;
        }
        self.points
            .iter()
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }

    /// Anchor point for the given position
    pub fn anchor(&self, position: AnchorPosition) -> Option<&TrajectoryPoint> {
        anchor_index(position, self.len()).map(|idx| &self.points[idx])
    }
}

/// Where along a trajectory to place the sensor/detection anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AnchorPosition {
    /// No anchor at all
    Suppressed,
    /// Fraction of the way along the samples
    Fraction(f64),
}

impl AnchorPosition {
    /// Configuration value that suppresses anchors
    pub const SENTINEL: f64 = -1.0;

    pub fn from_value(value: f64) -> Self {
        if value == Self::SENTINEL {
            AnchorPosition::Suppressed
        } else {
            AnchorPosition::Fraction(value)
        }
    }
}

/// Anchor index among `count` samples
///
/// Fractions strictly inside `(0, 1)` map to `round(p * count)` (ties to
/// even), clamped to the last index. Anything else falls back to the
/// midpoint `count / 2`.
pub fn anchor_index(position: AnchorPosition, count: usize) -> Option<usize> {
    let AnchorPosition::Fraction(p) = position else {
        return None;
    };
    if count == 0 {
        return None;
    }

    let idx = if p > 0.0 && p < 1.0 {
        (p * count as f64).round_ties_even() as usize
    } else {
        count / 2
    };
    Some(idx.min(count - 1))
}

/// Where a desired altitude came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AltitudeSource {
    /// Supplied by the caller
    Explicit,
    /// Mean of `DESIRED_ALTITUDE` inside the active window
    DesiredChannel,
    /// Mean of `NAV_ALTITUDE` inside the active window
    WindowAverage,
    /// Mean of `NAV_ALTITUDE` over the whole log
    SeriesAverage,
    /// No altitude data; configured fallback
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesiredAltitude {
    pub value: f64,
    pub source: AltitudeSource,
}

/// Pick the altitude the helm was holding
pub fn infer_desired_altitude(
    series: &NumericSeries,
    window: ActiveWindow,
    explicit: Option<f64>,
    fallback: f64,
) -> DesiredAltitude {
    let range = TimeRange::from(window);

    let (value, source) = explicit
        .map(|v| (v, AltitudeSource::Explicit))
        .or_else(|| {
            series
                .mean_in(DESIRED_ALTITUDE, range)
                .map(|v| (v, AltitudeSource::DesiredChannel))
        })
        .or_else(|| {
            series
                .mean_in(NAV_ALTITUDE, range)
                .map(|v| (v, AltitudeSource::WindowAverage))
        })
        .or_else(|| series.mean(NAV_ALTITUDE).map(|v| (v, AltitudeSource::SeriesAverage)))
        .unwrap_or((fallback, AltitudeSource::Fallback));

    log::debug!("Desired altitude {} from {:?}", value, source);
    DesiredAltitude { value, source }
}
