//! # Datum
//!
//! Helpers for serializing CloudWatch PutMetricData payloads via serde_json
//!
//! <https://docs.aws.amazon.com/AmazonCloudWatch/latest/APIReference/API_PutMetricData.html>

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// One MetricDatum of a PutMetricData request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    #[serde(rename = "MetricName")]
    pub metric_name: String,
    #[serde(rename = "Unit")]
    pub unit: Unit,
    #[serde(rename = "Timestamp")]
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub value: DatapointValue,
}

/// The CloudWatch units statsd metrics are exported with
///
/// <https://docs.aws.amazon.com/AmazonCloudWatch/latest/APIReference/API_MetricDatum.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Count,
    Milliseconds,
    None,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Milliseconds => "Milliseconds",
            Self::None => "None",
        }
    }
}

/// A datum carries either a single value or pre-aggregated statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DatapointValue {
    Value(f64),
    StatisticValues(StatisticSet),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticSet {
    #[serde(rename = "Minimum")]
    pub minimum: f64,
    #[serde(rename = "Maximum")]
    pub maximum: f64,
    #[serde(rename = "Sum")]
    pub sum: f64,
    #[serde(rename = "SampleCount")]
    pub sample_count: usize,
}

/// Body of a single PutMetricData call
#[derive(Debug, Serialize)]
pub struct PutMetricData<'a> {
    #[serde(rename = "Namespace")]
    pub namespace: &'a str,
    #[serde(rename = "MetricData")]
    pub metric_data: &'a [Datapoint],
}

/// Flush time from seconds since the epoch
///
/// Out of range timestamps fall back to the epoch
pub fn flush_time(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default()
}

/// ISO-8601 with millisecond precision, e.g. `1970-01-01T00:00:01.000Z`
pub fn iso_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso_timestamp(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(iso_timestamp(&flush_time(0)), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(&flush_time(1)), "1970-01-01T00:00:01.000Z");
        assert_eq!(iso_timestamp(&flush_time(1687394207)), "2023-06-22T00:36:47.000Z");
        assert_eq!(iso_timestamp(&flush_time(i64::MAX)), "1970-01-01T00:00:00.000Z");
        assert_eq!(flush_time(1687394207).timestamp(), 1687394207);
    }

    #[test]
    fn units() {
        for unit in [Unit::Count, Unit::Milliseconds, Unit::None] {
            assert_eq!(serde_json::to_string(&unit).unwrap(), format!("\"{}\"", unit.as_str()));
        }
    }

    #[test]
    fn put_metric_data() {
        let metric_data = vec![
            Datapoint {
                metric_name: "requests".into(),
                unit: Unit::Count,
                timestamp: flush_time(1),
                value: DatapointValue::Value(42.0),
            },
            Datapoint {
                metric_name: "connections".into(),
                unit: Unit::None,
                timestamp: flush_time(1),
                value: DatapointValue::Value(3.5),
            },
            Datapoint {
                metric_name: "latency".into(),
                unit: Unit::Milliseconds,
                timestamp: flush_time(1),
                value: DatapointValue::StatisticValues(StatisticSet {
                    minimum: 1.0,
                    maximum: 5.0,
                    sum: 9.0,
                    sample_count: 3,
                }),
            },
        ];

        let payload = PutMetricData {
            namespace: "GameServerMetrics",
            metric_data: &metric_data,
        };

        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"Namespace":"GameServerMetrics","MetricData":[{"MetricName":"requests","Unit":"Count","Timestamp":"1970-01-01T00:00:01.000Z","Value":42.0},{"MetricName":"connections","Unit":"None","Timestamp":"1970-01-01T00:00:01.000Z","Value":3.5},{"MetricName":"latency","Unit":"Milliseconds","Timestamp":"1970-01-01T00:00:01.000Z","StatisticValues":{"Minimum":1.0,"Maximum":5.0,"Sum":9.0,"SampleCount":3}}]}"#
        );
    }
}
