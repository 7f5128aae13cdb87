//! # Shaper
//!
//! Converts statsd counters, gauges, timers and sets into CloudWatch datums and resolves
//! which namespace and metric name each one is exported under

use super::datum::{self, Datapoint, DatapointValue, StatisticSet, Unit};
use super::key;
use chrono::{DateTime, Utc};
use metrics::SharedString;
use std::collections::BTreeSet;

/// Namespace used when neither the configuration nor the key provides one
pub const DEFAULT_NAMESPACE: &str = "AwsCloudWatchStatsdBackend";

/// Naming rules for an instance
///
/// Empty strings are treated the same as unset values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Forces every datum into this namespace
    pub namespace: Option<SharedString>,
    /// Forces every datum to use this metric name
    pub metric_name: Option<SharedString>,
    /// Derive namespace and metric name from the key, see [key::classify]
    pub process_key_for_namespace: bool,
}

/// Where a datum goes and what it is called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub namespace: String,
    pub metric_name: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl RoutingConfig {
    /// configured value > classified key > raw key / [DEFAULT_NAMESPACE]
    pub fn resolve(&self, key: &str) -> Resolved {
        let classified = self.process_key_for_namespace.then(|| key::classify(key));
        let (derived_name, derived_namespace) = match &classified {
            Some(classified) => (Some(classified.metric_name), classified.namespace.as_deref()),
            None => (None, None),
        };

        let namespace = non_empty(self.namespace.as_deref())
            .or(non_empty(derived_namespace))
            .unwrap_or(DEFAULT_NAMESPACE);
        let metric_name = non_empty(self.metric_name.as_deref())
            .or(non_empty(derived_name))
            .unwrap_or(key);

        Resolved {
            namespace: namespace.to_owned(),
            metric_name: metric_name.to_owned(),
        }
    }
}

/// A shaped datum along with its destination namespace
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub namespace: String,
    pub datapoint: Datapoint,
}

/// Shapes the entries of a single flush, every datum shares the flush timestamp
pub struct Shaper<'a> {
    routing: &'a RoutingConfig,
    timestamp: DateTime<Utc>,
}

impl<'a> Shaper<'a> {
    pub fn new(routing: &'a RoutingConfig, timestamp: i64) -> Self {
        Self {
            routing,
            timestamp: datum::flush_time(timestamp),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn route(&self, key: &str, unit: Unit, value: DatapointValue) -> Routed {
        let Resolved { namespace, metric_name } = self.routing.resolve(key);
        Routed {
            namespace,
            datapoint: Datapoint {
                metric_name,
                unit,
                timestamp: self.timestamp,
                value,
            },
        }
    }

    pub fn counter(&self, key: &str, value: f64) -> Routed {
        self.route(key, Unit::Count, DatapointValue::Value(value))
    }

    pub fn gauge(&self, key: &str, value: f64) -> Routed {
        self.route(key, Unit::None, DatapointValue::Value(value))
    }

    /// Sets export their cardinality
    pub fn set(&self, key: &str, members: &BTreeSet<String>) -> Routed {
        self.route(key, Unit::None, DatapointValue::Value(members.len() as f64))
    }

    /// Timers export min/max/sum/count, nothing is exported without samples
    pub fn timer(&self, key: &str, samples: &[f64]) -> Option<Routed> {
        let statistics = timer_statistics(samples)?;
        Some(self.route(
            key,
            Unit::Milliseconds,
            DatapointValue::StatisticValues(statistics),
        ))
    }
}

/// Reduce timer samples to a [StatisticSet]
pub fn timer_statistics(samples: &[f64]) -> Option<StatisticSet> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let minimum = *sorted.first()?;
    let maximum = *sorted.last()?;

    // Running total over the sorted samples, the sum is the final partial sum
    let sum = sorted.iter().skip(1).fold(minimum, |cumulative, value| cumulative + value);

    Some(StatisticSet {
        minimum,
        maximum,
        sum,
        sample_count: sorted.len(),
    })
}
