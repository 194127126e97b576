//! Categorical (string-valued) event series

use crate::classify::EventKind;
use crate::types::CategoricalEvent;
use serde::Serialize;

/// A categorical event together with its classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    pub event: CategoricalEvent,
    pub kind: EventKind,
}

impl ClassifiedEvent {
    pub fn new(time: f64, variable: &str, value: &str) -> Self {
        Self {
            kind: EventKind::of(variable),
            event: CategoricalEvent {
                time,
                variable: variable.to_string(),
                value: value.to_string(),
            },
        }
    }

    pub fn time(&self) -> f64 {
        self.event.time
    }

    pub fn value(&self) -> &str {
        &self.event.value
    }
}

/// Every event whose time parsed, value kept verbatim
#[derive(Debug, Clone, Default)]
pub struct CategoricalSeries {
    events: Vec<ClassifiedEvent>,
}

impl CategoricalSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ClassifiedEvent) {
        self.events.push(event);
    }

    /// Stable sort by time; events sharing a timestamp keep arrival order
    pub fn sort_by_time(&mut self) {
        self.events.sort_by(|a, b| a.time().total_cmp(&b.time()));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedEvent> {
        self.events.iter()
    }

    /// Events at or after `start`, in time order
    pub fn from_time(&self, start: f64) -> impl Iterator<Item = &ClassifiedEvent> {
        self.events.iter().filter(move |e| e.time() >= start)
    }

    /// `NODE_REPORT*` events, in time order
    pub fn node_reports(&self) -> impl Iterator<Item = &ClassifiedEvent> {
        self.events.iter().filter(|e| e.kind.is_node_report())
    }

    pub fn has_node_reports(&self) -> bool {
        self.node_reports().next().is_some()
    }

    pub fn min_time(&self) -> Option<f64> {
        self.events.first().map(ClassifiedEvent::time)
    }

    pub fn max_time(&self) -> Option<f64> {
        self.events.last().map(ClassifiedEvent::time)
    }
}

impl FromIterator<ClassifiedEvent> for CategoricalSeries {
    fn from_iter<I: IntoIterator<Item = ClassifiedEvent>>(iter: I) -> Self {
        let mut series = Self {
            events: iter.into_iter().collect(),
        };
        series.sort_by_time();
        series
    }
}
