//! # Snapshot
//!
//! The aggregated metrics handed over by statsd on every flush

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Point in time read of the aggregator state, one map per metric family
///
/// Deserializes from the statsd shape `{"counters": {..}, "gauges": {..}, "timers": {..}, "sets": {..}}`,
/// missing families are empty
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, f64>,
    pub gauges: BTreeMap<String, f64>,
    pub timers: BTreeMap<String, Vec<f64>>,
    /// Only the number of distinct members is exported
    pub sets: BTreeMap<String, BTreeSet<String>>,
}

impl MetricsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(mut self, key: impl Into<String>, value: f64) -> Self {
        self.counters.insert(key.into(), value);
        self
    }

    pub fn with_gauge(mut self, key: impl Into<String>, value: f64) -> Self {
        self.gauges.insert(key.into(), value);
        self
    }

    pub fn with_timer(mut self, key: impl Into<String>, samples: impl IntoIterator<Item = f64>) -> Self {
        self.timers.entry(key.into()).or_default().extend(samples);
        self
    }

    pub fn with_set<T: Into<String>>(mut self, key: impl Into<String>, members: impl IntoIterator<Item = T>) -> Self {
        self.sets
            .entry(key.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty() && self.timers.is_empty() && self.sets.is_empty()
    }
}
