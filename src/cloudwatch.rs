//! # CloudWatch
//!
//! [MetricsSink] backed by the AWS SDK
//!
//! *this module requires the `cloudwatch` feature flag*

use super::config::CredentialSource;
use super::datum::{Datapoint, DatapointValue};
use super::sender::MetricsSink;
use super::Error;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{MetricDatum, StandardUnit, StatisticSet};
use aws_sdk_cloudwatch::{config::Region, Client};
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error};

/// Sends PutMetricData requests to CloudWatch
#[derive(Debug, Clone)]
pub struct CloudWatchSink {
    client: Client,
}

impl CloudWatchSink {
    /// Resolve credentials and construct the client
    ///
    /// Credentials are checked once up front, a failure is logged and the client is still
    /// returned
    pub async fn new(region: Option<String>, credentials: &CredentialSource) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        if let Some(provider) = credentials_provider(credentials) {
            if let Err(err) = provider.provide_credentials().await {
                error!("Failed to fetch IAM role credentials: {err}");
            }
            loader = loader.credentials_provider(provider);
        }

        let config = loader.load().await;
        debug!(?credentials, region = ?config.region(), "CloudWatch client initialized");

        Self {
            client: Client::new(&config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// `None` leaves credentials to the SDK default chain
fn credentials_provider(credentials: &CredentialSource) -> Option<SharedCredentialsProvider> {
    match credentials {
        CredentialSource::Default => None,
        CredentialSource::Static {
            access_key_id,
            secret_access_key,
            session_token,
        } => Some(SharedCredentialsProvider::new(Credentials::new(
            access_key_id,
            secret_access_key,
            session_token.clone(),
            None,
            "statsd-cloudwatch-config",
        ))),
        CredentialSource::InstanceMetadataAny => {
            Some(SharedCredentialsProvider::new(ImdsCredentialsProvider::builder().build()))
        }
        CredentialSource::InstanceMetadataRole(role) => Some(SharedCredentialsProvider::new(
            ImdsCredentialsProvider::builder().profile(role).build(),
        )),
    }
}

fn to_metric_datum(datapoint: &Datapoint) -> MetricDatum {
    let datum = MetricDatum::builder()
        .metric_name(&datapoint.metric_name)
        .unit(StandardUnit::from(datapoint.unit.as_str()))
        .timestamp(DateTime::from_millis(datapoint.timestamp.timestamp_millis()));

    match &datapoint.value {
        DatapointValue::Value(value) => datum.value(*value),
        DatapointValue::StatisticValues(statistics) => datum.statistic_values(
            StatisticSet::builder()
                .minimum(statistics.minimum)
                .maximum(statistics.maximum)
                .sum(statistics.sum)
                .sample_count(statistics.sample_count as f64)
                .build(),
        ),
    }
    .build()
}

impl MetricsSink for CloudWatchSink {
    fn put_metric_data(
        &self,
        namespace: String,
        metric_data: Vec<Datapoint>,
    ) -> BoxFuture<'static, Result<(), Error>> {
        let request = self
            .client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(metric_data.iter().map(to_metric_datum).collect()));

        async move {
            let output = request.send().await?;
            debug!("{output:?}");
            Ok(())
        }
        .boxed()
    }
}
