//! Typed records decoded from agent payloads.
//!
//! Field names follow the agent's JSON keys through `serde(rename)`. Records
//! tolerate missing keys and `null` values (both default) but reject values of
//! the wrong JSON type.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};
use std::collections::BTreeMap;

/// Identity of one connected agent, sent with the `connect` method.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionRecord {
    /// Process id of the instrumented application.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub pid: i64,

    /// Agent language tag (e.g. `go`, `java`).
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub language: String,

    /// Agent version.
    #[serde(default, rename = "agent_version")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub version: String,

    /// Host the agent runs on.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub host: String,

    /// Application names; the first one is the canonical identifier.
    #[serde(rename = "app_name")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub app_names: Vec<String>,

    #[serde(default)]
    pub display_host: Option<String>,

    #[serde(default)]
    pub identifier: Option<String>,
}

impl ConnectionRecord {
    /// The canonical application name, used as the registry key and run id.
    pub fn app_name(&self) -> &str {
        self.app_names.first().map(String::as_str).unwrap_or_default()
    }
}

/// Sampling metadata sent as the second element of every event batch.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventBatchInfo {
    /// Capacity of the agent's sampling reservoir.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub reservoir_size: u64,
    /// Events observed before sampling.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub events_seen: u64,
}

/// Intrinsic fields of one span event.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParsedSpan {
    #[serde(rename = "type")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub event_type: String,
    /// 32 hex characters.
    #[serde(rename = "traceId")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub trace_id: String,
    /// 16 hex characters.
    #[serde(rename = "guid")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub span_id: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(rename = "transactionId")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub transaction_id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub sampled: bool,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub priority: f64,
    /// Start time, milliseconds since the Unix epoch.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub timestamp: u64,
    /// Duration in seconds.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub duration: f64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub category: String,
    #[serde(rename = "nr.entryPoint")]
    pub entry_point: Option<bool>,
    pub component: Option<String>,
    #[serde(rename = "span.kind")]
    pub span_kind: Option<String>,
    #[serde(rename = "trustedParentId")]
    pub trusted_parent_id: Option<String>,
    #[serde(rename = "tracingVendors")]
    pub tracing_vendors: Option<String>,
    #[serde(rename = "transaction.name")]
    pub transaction_name: Option<String>,
}

/// Intrinsic fields of one transaction event.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParsedTransaction {
    #[serde(rename = "type")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub event_type: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub name: String,
    /// Start time, milliseconds since the Unix epoch.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub timestamp: u64,
    /// Duration in seconds.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub duration: f64,
    #[serde(rename = "totalTime")]
    pub total_time: Option<f64>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub error: bool,
    #[serde(rename = "nr.apdexPerfZone")]
    pub apdex_perf_zone: Option<String>,
    pub guid: Option<String>,
    #[serde(rename = "traceId")]
    pub trace_id: Option<String>,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(rename = "parentSpanId")]
    pub parent_span_id: Option<String>,
    pub priority: Option<f64>,
    pub sampled: Option<bool>,
    #[serde(rename = "externalCallCount")]
    pub external_call_count: Option<u64>,
    #[serde(rename = "externalDuration")]
    pub external_duration: Option<f64>,
    #[serde(rename = "databaseCallCount")]
    pub database_call_count: Option<u64>,
    #[serde(rename = "databaseDuration")]
    pub database_duration: Option<f64>,
}

/// An attribute value as the agent sent it.
///
/// JSON has no integer/float split, so every number is a `Double`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Double(f64),
    /// Arrays, objects and `null`.
    Other(Value),
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => AttributeValue::String(s),
            Value::Bool(b) => AttributeValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => AttributeValue::Double(f),
                None => AttributeValue::Other(Value::Number(n)),
            },
            other => AttributeValue::Other(other),
        }
    }
}

/// Attribute map keyed by attribute name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One positional `[fields, user_attributes, agent_attributes]` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<T> {
    pub fields: T,
    pub user_attributes: Attributes,
    pub agent_attributes: Attributes,
}

/// One `[run_id, info, events]` payload. Events keep wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch<T> {
    /// Run id the agent received from `connect`; the application name.
    pub run_id: String,
    pub info: EventBatchInfo,
    pub events: Vec<Event<T>>,
}

impl<T> EventBatch<T> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub type Span = Event<ParsedSpan>;
pub type SpanEventBatch = EventBatch<ParsedSpan>;
pub type Transaction = Event<ParsedTransaction>;
pub type TransactionEventBatch = EventBatch<ParsedTransaction>;
