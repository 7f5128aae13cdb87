use super::backend::{self, Backend};
use super::config::{CredentialSource, InstanceConfig};
use super::filter::FilterConfig;
use super::sender::MetricsSink;
use super::shaper::RoutingConfig;
use metrics::SharedString;
use std::sync::Arc;

/// Builder for a CloudWatch export [Backend]
///
/// # Example
/// ```
///  let backend = statsd_cloudwatch_backend::Builder::new()
///      .namespace("MyApplication")
///      .blacklist(["debug."])
///      .init(std::sync::Arc::new(statsd_cloudwatch_backend::WriterSink::new(std::io::stdout())));
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    namespace: Option<SharedString>,
    metric_name: Option<SharedString>,
    process_key_for_namespace: bool,
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    region: Option<String>,
    credentials: CredentialSource,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends every metric to this CloudWatch namespace
    /// * Overrides namespaces derived via [Builder::process_key_for_namespace]
    /// * Without either, metrics go to `AwsCloudWatchStatsdBackend`
    pub fn namespace(self, namespace: impl Into<SharedString>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..self
        }
    }

    /// Sends every metric under this metric name
    pub fn metric_name(self, metric_name: impl Into<SharedString>) -> Self {
        Self {
            metric_name: Some(metric_name.into()),
            ..self
        }
    }

    /// Splits keys like `api.requests` into namespace `api` and metric name `requests`
    pub fn process_key_for_namespace(self, enabled: bool) -> Self {
        Self {
            process_key_for_namespace: enabled,
            ..self
        }
    }

    /// Exact keys that are always exported
    /// * Without a blacklist, keys not listed here are dropped
    pub fn whitelist<I: IntoIterator<Item = T>, T: Into<String>>(mut self, keys: I) -> Self {
        self.whitelist.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Substrings of keys that are not exported, unless whitelisted
    pub fn blacklist<I: IntoIterator<Item = T>, T: Into<String>>(mut self, substrings: I) -> Self {
        self.blacklist.extend(substrings.into_iter().map(Into::into));
        self
    }

    /// AWS region of the CloudWatch endpoint, the SDK default is used when unset
    pub fn region(self, region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..self
        }
    }

    pub fn credentials(self, credentials: CredentialSource) -> Self {
        Self { credentials, ..self }
    }

    /// Consume the builder into backend configuration
    pub fn build(self) -> backend::Config {
        backend::Config {
            routing: RoutingConfig {
                namespace: self.namespace,
                metric_name: self.metric_name,
                process_key_for_namespace: self.process_key_for_namespace,
            },
            filter: FilterConfig {
                whitelist: self.whitelist,
                blacklist: self.blacklist,
            },
            region: self.region,
            credentials: self.credentials,
        }
    }

    /// Construct a backend sending to `sink`
    pub fn init(self, sink: Arc<dyn MetricsSink>) -> Backend {
        Backend::new(self.build(), sink)
    }

    /// Construct a backend sending to the CloudWatch API
    ///
    /// Credential failures are logged, the backend is still returned and its requests will fail
    #[cfg(feature = "cloudwatch")]
    pub async fn init_cloudwatch(self) -> Backend {
        let config = self.build();
        let sink = super::cloudwatch::CloudWatchSink::new(config.region.clone(), &config.credentials).await;
        Backend::new(config, Arc::new(sink))
    }
}

impl From<&InstanceConfig> for Builder {
    fn from(config: &InstanceConfig) -> Self {
        Self {
            namespace: config.namespace.clone().map(Into::into),
            metric_name: config.metric_name.clone().map(Into::into),
            process_key_for_namespace: config.process_key_for_namespace,
            whitelist: config.whitelist.clone(),
            blacklist: config.blacklist.clone(),
            region: config.region.clone(),
            credentials: config.credential_source(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build() {
        let config = Builder::new()
            .namespace("MyApp")
            .metric_name("Everything")
            .process_key_for_namespace(true)
            .whitelist(["a", "b"])
            .blacklist(vec![String::from("c")])
            .region("us-east-1")
            .build();

        assert_eq!(config.routing.namespace.as_deref(), Some("MyApp"));
        assert_eq!(config.routing.metric_name.as_deref(), Some("Everything"));
        assert!(config.routing.process_key_for_namespace);
        assert_eq!(config.filter.whitelist, ["a", "b"]);
        assert_eq!(config.filter.blacklist, ["c"]);
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.credentials, CredentialSource::Default);
    }

    #[test]
    fn from_instance_config() {
        let instance = InstanceConfig {
            namespace: Some("MyApp".into()),
            whitelist: vec!["a".into()],
            iam_role: Some("any".into()),
            ..Default::default()
        };

        let config = Builder::from(&instance).build();
        assert_eq!(config.routing.namespace.as_deref(), Some("MyApp"));
        assert_eq!(config.routing.metric_name, None);
        assert_eq!(config.filter.whitelist, ["a"]);
        assert!(config.filter.blacklist.is_empty());
        assert_eq!(config.credentials, CredentialSource::InstanceMetadataAny);
        assert_eq!(Builder::new().build(), backend::Config::default());
    }
}
