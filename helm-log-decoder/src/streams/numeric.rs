//! Numeric time series
//!
//! Holds every sample whose value parsed as a real number, grouped by
//! variable. After [`NumericSeries::sort_by_time`] each variable's samples
//! are in ascending time order; samples sharing a timestamp keep their
//! arrival order, so "first wins" is simply the first one encountered.

use crate::types::{NumericSample, TimeRange};
use std::collections::BTreeMap;

/// Numeric samples keyed by variable name
#[derive(Debug, Clone, Default)]
pub struct NumericSeries {
    samples: BTreeMap<String, Vec<NumericSample>>,
    len: usize,
    min_time: Option<f64>,
    max_time: Option<f64>,
}

impl NumericSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample (arrival order is kept until sorting)
    pub fn push(&mut self, variable: &str, time: f64, value: f64) {
        self.samples
            .entry(variable.to_string())
            .or_default()
            .push(NumericSample { time, value });

        self.len += 1;
        self.min_time = Some(self.min_time.map_or(time, |t| t.min(time)));
        self.max_time = Some(self.max_time.map_or(time, |t| t.max(time)));
    }

    /// Stable sort of every variable by time
    pub fn sort_by_time(&mut self) {
        for samples in self.samples.values_mut() {
            samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
    }

    /// Total number of samples over all variables
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Earliest sample time of any variable
    pub fn min_time(&self) -> Option<f64> {
        self.min_time
    }

    /// Latest sample time of any variable
    pub fn max_time(&self) -> Option<f64> {
        self.max_time
    }

    /// Observed variable names, sorted
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        self.samples.contains_key(variable)
    }

    /// All samples of one variable (empty slice if never seen)
    pub fn samples(&self, variable: &str) -> &[NumericSample] {
        self.samples
            .get(variable)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Samples of one variable inside `range` (bounds included)
    pub fn samples_in(&self, variable: &str, range: TimeRange) -> Vec<NumericSample> {
        self.samples(variable)
            .iter()
            .filter(|s| range.contains(s.time))
            .copied()
            .collect()
    }

    /// Earliest sample at or after `start` whose value satisfies `predicate`
    pub fn first_at_or_after<P>(&self, variable: &str, start: f64, predicate: P) -> Option<NumericSample>
    where
        P: Fn(f64) -> bool,
    {
        self.samples(variable)
            .iter()
            .filter(|s| s.time >= start && predicate(s.value))
            .min_by(|a, b| a.time.total_cmp(&b.time))
            .copied()
    }

    /// Mean value of one variable inside `range`, `None` if no sample falls in it
    pub fn mean_in(&self, variable: &str, range: TimeRange) -> Option<f64> {
        mean(self.samples(variable).iter().filter(|s| range.contains(s.time)))
    }

    /// Mean value of one variable over the whole log
    pub fn mean(&self, variable: &str) -> Option<f64> {
        mean(self.samples(variable).iter())
    }

    /// Iterate over `(variable, sample)` pairs, variable by variable
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NumericSample)> {
        self.samples
            .iter()
            .flat_map(|(name, samples)| samples.iter().map(move |s| (name.as_str(), s)))
    }
}

fn mean<'a>(samples: impl Iterator<Item = &'a NumericSample>) -> Option<f64> {
    let (sum, count) = samples.fold((0.0, 0usize), |(sum, count), s| (sum + s.value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> NumericSeries {
        let mut series = NumericSeries::new();
        series.push("DESIRED_SPEED", 20.0, 0.0);
        series.push("DESIRED_SPEED", 10.0, 5.0);
        series.push("DESIRED_SPEED", 30.0, 0.0);
        series.push("NAV_ALTITUDE", 15.0, 100.0);
        series.push("NAV_ALTITUDE", 25.0, 120.0);
        series.sort_by_time();
        series
    }

    #[test]
    fn test_bounds_and_len() {
        let series = series();
        assert_eq!(series.len(), 5);
        assert_eq!(series.min_time(), Some(10.0));
        assert_eq!(series.max_time(), Some(30.0));
        assert_eq!(
            series.variables().collect::<Vec<_>>(),
            vec!["DESIRED_SPEED", "NAV_ALTITUDE"]
        );
    }

    #[test]
    fn test_sorted_by_time() {
        let series = series();
        let times: Vec<f64> = series.samples("DESIRED_SPEED").iter().map(|s| s.time).collect();
        assert_eq!(times, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_duplicate_timestamps_keep_arrival_order() {
        let mut series = NumericSeries::new();
        series.push("NAV_X", 5.0, 1.0);
        series.push("NAV_X", 1.0, 0.0);
        series.push("NAV_X", 5.0, 2.0);
        series.sort_by_time();
        let values: Vec<f64> = series.samples("NAV_X").iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_first_at_or_after() {
        let series = series();
        let hit = series.first_at_or_after("DESIRED_SPEED", 0.0, |v| v == 0.0).unwrap();
        assert_eq!(hit.time, 20.0);
        assert!(series.first_at_or_after("DESIRED_SPEED", 31.0, |v| v == 0.0).is_none());
        assert!(series.first_at_or_after("MISSING", 0.0, |_| true).is_none());
    }

    #[test]
    fn test_means() {
        let series = series();
        assert_eq!(series.mean("NAV_ALTITUDE"), Some(110.0));
        assert_eq!(series.mean_in("NAV_ALTITUDE", TimeRange::new(0.0, 20.0)), Some(100.0));
        assert_eq!(series.mean_in("NAV_ALTITUDE", TimeRange::new(40.0, 50.0)), None);
        assert_eq!(series.mean("MISSING"), None);
    }
}
