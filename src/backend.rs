//! # Backend
//!
//! Flush pipeline returned from statsd_cloudwatch_backend::Builder

use super::config::{self, CredentialSource, InstanceConfig};
use super::datum;
use super::filter::FilterConfig;
use super::router::NamespaceGroups;
use super::sender::{BatchSender, FlushHandle, MetricsSink};
use super::shaper::{RoutingConfig, Shaper};
use super::snapshot::MetricsSnapshot;
use super::{Builder, Error};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration via Builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub routing: RoutingConfig,
    pub filter: FilterConfig,
    pub region: Option<String>,
    pub credentials: CredentialSource,
}

/// A statsd flush, as broadcast to every configured instance
#[derive(Debug, Clone)]
pub struct FlushEvent {
    /// Seconds since the epoch
    pub timestamp: i64,
    pub metrics: Arc<MetricsSnapshot>,
}

/// CloudWatch export pipeline for a single destination
///
/// Use [Builder](super::Builder) to construct
///
/// # Example
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let backend = statsd_cloudwatch_backend::Builder::new()
///     .process_key_for_namespace(true)
///     .init(std::sync::Arc::new(statsd_cloudwatch_backend::WriterSink::new(std::io::stdout())));
///
/// let metrics = statsd_cloudwatch_backend::MetricsSnapshot::new().with_counter("api.requests", 42.0);
///
/// backend.flush(1687394207, &metrics).join().await;
/// # }
/// ```
pub struct Backend {
    pub config: Config,
    sender: BatchSender,
}

impl Backend {
    pub fn new(config: Config, sink: Arc<dyn MetricsSink>) -> Self {
        info!(
            "Starting cloudwatch reporter instance in region: {}",
            config.region.as_deref().unwrap_or("default")
        );
        Self {
            config,
            sender: BatchSender::new(sink),
        }
    }

    /// Export one statsd flush
    ///
    /// * Requests are only dispatched within a tokio runtime, see [BatchSender::send]
    /// * Requests are dispatched in the background, the returned [FlushHandle] may be dropped
    /// * Counters, timers, gauges and sets are grouped and sent separately
    pub fn flush(&self, timestamp: i64, metrics: &MetricsSnapshot) -> FlushHandle {
        let shaper = Shaper::new(&self.config.routing, timestamp);
        info!("Flushing metrics at {}", datum::iso_timestamp(&shaper.timestamp()));
        debug!("{metrics:?}");

        let filter = &self.config.filter;
        let mut handle = FlushHandle::default();

        let counters = metrics
            .counters
            .iter()
            .filter(|(key, _)| filter.is_eligible(key))
            .map(|(key, value)| shaper.counter(key, *value));
        handle.append(self.send_groups(counters.collect()));

        // Timers without samples are skipped before filtering
        let timers = metrics
            .timers
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .filter(|(key, _)| filter.is_eligible(key))
            .filter_map(|(key, samples)| shaper.timer(key, samples));
        handle.append(self.send_groups(timers.collect()));

        let gauges = metrics
            .gauges
            .iter()
            .filter(|(key, _)| filter.is_eligible(key))
            .map(|(key, value)| shaper.gauge(key, *value));
        handle.append(self.send_groups(gauges.collect()));

        let sets = metrics
            .sets
            .iter()
            .filter(|(key, _)| filter.is_eligible(key))
            .map(|(key, members)| shaper.set(key, members));
        handle.append(self.send_groups(sets.collect()));

        handle
    }

    fn send_groups(&self, groups: NamespaceGroups) -> FlushHandle {
        let mut handle = FlushHandle::default();
        for (namespace, datapoints) in groups {
            handle.append(self.sender.send(datapoints, &namespace));
        }
        handle
    }

    /// Flush on every event until the channel is closed
    pub async fn run(&self, mut events: broadcast::Receiver<FlushEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.flush(event.timestamp, &event.metrics);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Flush events arrived faster than they were exported, skipped {skipped}");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Every instance configured for this process
///
/// Instances share nothing and each export every flush on their own
pub struct Backends {
    instances: Vec<Arc<Backend>>,
}

impl Backends {
    pub fn new(instances: impl IntoIterator<Item = Backend>) -> Self {
        Self {
            instances: instances.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build every instance of a statsd configuration document, `make_sink` provides the
    /// destination of each one
    pub fn from_json(
        json: &str,
        mut make_sink: impl FnMut(&InstanceConfig) -> Arc<dyn MetricsSink>,
    ) -> Result<Self, Error> {
        let instances = config::instances_from_json(json)?
            .iter()
            .map(|instance| Builder::from(instance).init(make_sink(instance)))
            .collect::<Vec<_>>();
        Ok(Self::new(instances))
    }

    /// Build every instance of a statsd configuration document, each sending to CloudWatch
    /// in its configured region
    #[cfg(feature = "cloudwatch")]
    pub async fn from_json_cloudwatch(json: &str) -> Result<Self, Error> {
        let mut instances = Vec::new();
        for instance in config::instances_from_json(json)? {
            instances.push(Builder::from(&instance).init_cloudwatch().await);
        }
        Ok(Self::new(instances))
    }

    pub fn instances(&self) -> &[Arc<Backend>] {
        &self.instances
    }

    /// Export one statsd flush to every instance
    pub fn flush(&self, timestamp: i64, metrics: &MetricsSnapshot) -> FlushHandle {
        let mut handle = FlushHandle::default();
        for instance in &self.instances {
            handle.append(instance.flush(timestamp, metrics));
        }
        handle
    }

    /// Spawn a [Backend::run] task per instance listening on `events`
    pub fn subscribe(&self, events: &broadcast::Sender<FlushEvent>) -> Vec<JoinHandle<()>> {
        self.instances
            .iter()
            .map(|instance| {
                let instance = instance.clone();
                let receiver = events.subscribe();
                tokio::spawn(async move { instance.run(receiver).await })
            })
            .collect()
    }
}
