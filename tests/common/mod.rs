//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use newrelic_receiver::config::ReceiverConfig;
use newrelic_receiver::{ChannelConsumer, ConsumeError, NewRelicReceiver, TraceConsumer};
use opentelemetry_proto::tonic::trace::v1::ResourceSpans;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const PATH: &str = "/agent_listener/invoke_raw_method";

/// Config bound to an ephemeral localhost port.
pub fn test_config() -> ReceiverConfig {
    let mut config = ReceiverConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.shutdown_secs = 5;
    config
}

/// Start a receiver forwarding into a channel.
pub async fn start_receiver(
    config: ReceiverConfig,
) -> (NewRelicReceiver, SocketAddr, mpsc::Receiver<ResourceSpans>) {
    let (consumer, rx) = ChannelConsumer::new(64);
    let mut receiver = NewRelicReceiver::new(config, Arc::new(consumer));
    let addr = receiver.start().await.expect("receiver failed to start");
    (receiver, addr, rx)
}

/// Start a receiver with a programmable consumer.
pub async fn start_programmable_receiver<F, Fut>(
    config: ReceiverConfig,
    f: F,
) -> (NewRelicReceiver, SocketAddr)
where
    F: Fn(ResourceSpans) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ConsumeError>> + Send + 'static,
{
    let mut receiver = NewRelicReceiver::new(config, Arc::new(FnConsumer(f)));
    let addr = receiver.start().await.expect("receiver failed to start");
    (receiver, addr)
}

struct FnConsumer<F>(F);

#[async_trait]
impl<F, Fut> TraceConsumer for FnConsumer<F>
where
    F: Fn(ResourceSpans) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ConsumeError>> + Send + 'static,
{
    async fn consume_traces(&self, traces: ResourceSpans) -> Result<(), ConsumeError> {
        (self.0)(traces).await
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn invoke_url(addr: SocketAddr, method: &str) -> String {
    format!("http://{addr}{PATH}?method={method}&protocol_version=17&marshal_format=json")
}

/// POST a JSON body to `method`, returning status and body text.
pub async fn invoke(client: &reqwest::Client, addr: SocketAddr, method: &str, body: &Value) -> (u16, String) {
    let res = client
        .post(invoke_url(addr, method))
        .body(serde_json::to_vec(body).unwrap())
        .send()
        .await
        .expect("receiver unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

pub fn connect_payload(app: &str, pid: u64, host: &str) -> Value {
    json!([{
        "pid": pid,
        "language": "go",
        "agent_version": "3.35.1",
        "host": host,
        "app_name": [app],
        "identifier": app,
        "settings": {},
        "utilization": {}
    }])
}

pub fn span_entry(trace_id: &str, span_id: &str, kind: &str) -> Value {
    json!([
        {
            "type": "Span",
            "traceId": trace_id,
            "guid": span_id,
            "transactionId": "0123456789abcdef",
            "sampled": true,
            "priority": 1.5,
            "timestamp": 1_700_000_000_000u64,
            "duration": 0.5,
            "name": "WebTransaction/Go/GET /",
            "category": "generic",
            "span.kind": kind
        },
        {"user.tier": "gold"},
        {"request.method": "GET", "code.lineno": 42}
    ])
}

pub fn span_payload(run_id: &str, entries: Vec<Value>) -> Value {
    json!([run_id, {"reservoir_size": 2000, "events_seen": entries.len()}, entries])
}
