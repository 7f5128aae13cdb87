//! # Sender
//!
//! Splits namespace groups into PutMetricData sized requests and dispatches them to a
//! [MetricsSink] without waiting on the result

use super::datum::{Datapoint, PutMetricData};
use super::Error;
use futures::future::{self, BoxFuture, FutureExt};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// PutMetricData accepts at most 20 MetricDatum per request
pub const MAX_DATUMS_PER_REQUEST: usize = 20;

/// Destination of PutMetricData requests
///
/// Each call is independent, a failed request only loses its own datums
pub trait MetricsSink: Send + Sync {
    fn put_metric_data(
        &self,
        namespace: String,
        metric_data: Vec<Datapoint>,
    ) -> BoxFuture<'static, Result<(), Error>>;
}

/// Writes every request as a line of PutMetricData json to an implementation of [std::io::Write]
///
/// # Example
/// ```
/// let sink = statsd_cloudwatch_backend::WriterSink::new(std::io::stdout());
/// ```
pub struct WriterSink<W> {
    writer: Arc<Mutex<W>>,
}

impl<W: Write + Send + 'static> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    fn write(&self, namespace: &str, metric_data: &[Datapoint]) -> Result<(), Error> {
        let payload = PutMetricData { namespace, metric_data };
        let mut writer = self.writer.lock().map_err(|_| "writer mutex poisoned")?;
        serde_json::to_writer(&mut *writer, &payload)?;
        writeln!(writer)?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> MetricsSink for WriterSink<W> {
    fn put_metric_data(
        &self,
        namespace: String,
        metric_data: Vec<Datapoint>,
    ) -> BoxFuture<'static, Result<(), Error>> {
        future::ready(self.write(&namespace, &metric_data)).boxed()
    }
}

/// Handles to the requests dispatched by a flush
///
/// Dropping this leaves the requests running in the background
#[derive(Debug, Default)]
pub struct FlushHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl FlushHandle {
    /// Number of requests dispatched
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn append(&mut self, mut other: FlushHandle) {
        self.tasks.append(&mut other.tasks);
    }

    /// Wait for every dispatched request to finish
    pub async fn join(self) {
        for result in future::join_all(self.tasks).await {
            if let Err(err) = result {
                error!("PutMetricData task failed: {err}");
            }
        }
    }
}

/// Split `items` into consecutive chunks of at most `size`, preserving order
pub fn chunk<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size.max(1)));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(size.max(1)).collect());
    }
    chunks
}

/// Dispatches PutMetricData requests on the current tokio runtime
#[derive(Clone)]
pub struct BatchSender {
    sink: Arc<dyn MetricsSink>,
}

impl BatchSender {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self { sink }
    }

    /// Send `datapoints` for `namespace`, one request per [MAX_DATUMS_PER_REQUEST] datums
    ///
    /// * Outside of a tokio runtime nothing is sent and the error is logged
    /// * Failures are logged and never retried
    pub fn send(&self, datapoints: Vec<Datapoint>, namespace: &str) -> FlushHandle {
        let mut handle = FlushHandle::default();
        if datapoints.is_empty() {
            return handle;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(namespace, dropped = datapoints.len(), "PutMetricData requires a tokio runtime: {err}");
                return handle;
            }
        };

        for metric_data in chunk(datapoints, MAX_DATUMS_PER_REQUEST) {
            debug!(
                namespace,
                count = metric_data.len(),
                "{:?}",
                PutMetricData {
                    namespace,
                    metric_data: &metric_data,
                }
            );

            let namespace = namespace.to_owned();
            let request = self.sink.put_metric_data(namespace.clone(), metric_data);
            handle.tasks.push(runtime.spawn(async move {
                match request.await {
                    Ok(()) => debug!(namespace = %namespace, "PutMetricData succeeded"),
                    Err(err) => {
                        error!(namespace = %namespace, error = %err, "PutMetricData failed: {err:?}")
                    }
                }
            }));
        }

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{DatapointValue, Unit};

    fn datapoints(count: usize) -> Vec<Datapoint> {
        (0..count)
            .map(|i| Datapoint {
                metric_name: format!("metric{i}"),
                unit: Unit::None,
                timestamp: crate::datum::flush_time(1),
                value: DatapointValue::Value(i as f64),
            })
            .collect()
    }

    #[test]
    fn chunking() {
        let chunks = chunk(datapoints(45), MAX_DATUMS_PER_REQUEST);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, [20, 20, 5]);

        let flattened: Vec<Datapoint> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, datapoints(45));

        assert_eq!(chunk(datapoints(20), MAX_DATUMS_PER_REQUEST).len(), 1);
        assert_eq!(chunk(datapoints(21), MAX_DATUMS_PER_REQUEST).len(), 2);
        assert!(chunk(Vec::<Datapoint>::new(), MAX_DATUMS_PER_REQUEST).is_empty());
    }

    #[tokio::test]
    async fn empty_send_is_a_noop() {
        let sender = BatchSender::new(Arc::new(WriterSink::new(std::io::sink())));
        let handle = sender.send(Vec::new(), "namespace");
        assert!(handle.is_empty());
        handle.join().await;
    }

    #[test]
    fn send_outside_runtime() {
        let sink = WriterSink::new(Vec::new());
        let writer = sink.writer.clone();
        let sender = BatchSender::new(Arc::new(sink));

        let handle = sender.send(datapoints(25), "namespace");
        assert!(handle.is_empty());
        assert!(writer.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn writer_sink_output() {
        let sink = WriterSink::new(Vec::new());
        let writer = sink.writer.clone();
        let sender = BatchSender::new(Arc::new(sink));

        let handle = sender.send(datapoints(2), "namespace");
        assert_eq!(handle.len(), 1);
        handle.join().await;

        let output = writer.lock().unwrap();
        assert_eq!(
            std::str::from_utf8(&output).unwrap(),
            r#"{"Namespace":"namespace","MetricData":[{"MetricName":"metric0","Unit":"None","Timestamp":"1970-01-01T00:00:01.000Z","Value":0.0},{"MetricName":"metric1","Unit":"None","Timestamp":"1970-01-01T00:00:01.000Z","Value":1.0}]}
"#
        );
    }
}
