pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub use {
    backend::{Backend, Backends, Config, FlushEvent},
    builder::Builder,
    config::{instances_from_json, CredentialSource, InstanceConfig},
    datum::{Datapoint, DatapointValue, StatisticSet, Unit},
    filter::FilterConfig,
    key::{classify, Classified},
    router::NamespaceGroups,
    sender::{chunk, BatchSender, FlushHandle, MetricsSink, WriterSink, MAX_DATUMS_PER_REQUEST},
    shaper::{timer_statistics, Resolved, Routed, RoutingConfig, Shaper, DEFAULT_NAMESPACE},
    snapshot::MetricsSnapshot,
};

#[cfg(feature = "cloudwatch")]
pub use cloudwatch::CloudWatchSink;

mod backend;
mod builder;
#[cfg(feature = "cloudwatch")]
pub mod cloudwatch;
mod config;
mod datum;
mod filter;
mod key;
mod router;
mod sender;
mod shaper;
mod snapshot;
