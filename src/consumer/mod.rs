//! Downstream trace consumers.
//!
//! The receiver hands every translated batch to a [`TraceConsumer`]. The
//! host pipeline plugs its own implementation in; two are provided:
//! - [`ChannelConsumer`] forwards into a bounded tokio channel
//! - [`LoggingConsumer`] logs a summary of each batch and drops it

use async_trait::async_trait;
use opentelemetry_proto::tonic::trace::v1::ResourceSpans;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors returned by a consumer. The receiver does not retry them.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The receiving side is gone.
    #[error("trace consumer is closed")]
    Closed,

    /// Any other downstream failure.
    #[error("trace consumer failed: {0}")]
    Failed(String),
}

/// Capability to accept translated trace batches.
#[async_trait]
pub trait TraceConsumer: Send + Sync + 'static {
    async fn consume_traces(&self, traces: ResourceSpans) -> Result<(), ConsumeError>;
}

/// Forwards batches into an `mpsc` channel; waits when the channel is full.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::Sender<ResourceSpans>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiver that drains it.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ResourceSpans>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TraceConsumer for ChannelConsumer {
    async fn consume_traces(&self, traces: ResourceSpans) -> Result<(), ConsumeError> {
        self.tx.send(traces).await.map_err(|_| ConsumeError::Closed)
    }
}

/// Logs each batch at info level and every span at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConsumer;

#[async_trait]
impl TraceConsumer for LoggingConsumer {
    async fn consume_traces(&self, traces: ResourceSpans) -> Result<(), ConsumeError> {
        let spans = traces.scope_spans.iter().flat_map(|s| s.spans.iter());
        let count = traces.scope_spans.iter().map(|s| s.spans.len()).sum::<usize>();

        tracing::info!(span_count = count, "Received trace batch");
        for span in spans {
            tracing::debug!(
                trace_id = %hex::encode(&span.trace_id),
                span_id = %hex::encode(&span.span_id),
                name = %span.name,
                kind = span.kind,
                "Span"
            );
        }
        Ok(())
    }
}
