//! Prints the PutMetricData requests a statsd flush would produce
//!
//! `statsd-cloudwatch-dry-run config.json < snapshot.json`

use statsd_cloudwatch_backend::{Backends, Error, MetricsSink, MetricsSnapshot, WriterSink};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .ok_or("usage: statsd-cloudwatch-dry-run <config.json>")?;
    let config = std::fs::read_to_string(config_path)?;
    let metrics: MetricsSnapshot = serde_json::from_reader(std::io::stdin())?;

    let backends = Backends::from_json(&config, |_| {
        Arc::new(WriterSink::new(std::io::stdout())) as Arc<dyn MetricsSink>
    })?;

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    backends.flush(timestamp, &metrics).join().await;

    Ok(())
}
