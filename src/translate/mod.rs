//! Translation of agent events into the OTLP trace model.
//!
//! # Data Flow
//! ```text
//! ConnectionRecord ──→ resource attributes + instrumentation scope
//! SpanEventBatch   ──→ per span:
//!     ids.rs         hex ids → fixed-width bytes (any failure aborts the batch)
//!     time math      epoch millis + duration seconds → unix nanos
//!     kind mapping   "server" / "client" / anything else
//!     attributes.rs  user attributes, then agent attributes (agent wins)
//!                ──→ ResourceSpans (one resource, one scope)
//! ```
//!
//! # Design Decisions
//! - All-or-nothing: a single bad identifier refuses the whole batch
//! - Attribute values never fail translation; odd shapes become strings
//! - Only `span.kind` drives the OTLP kind; `category` and `component` are
//!   carried as-is in the source and not mapped yet

pub mod attributes;
pub mod ids;

use opentelemetry_proto::tonic::common::v1::InstrumentationScope;
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1 as otlp;
use otlp::span::SpanKind;
use thiserror::Error;

use crate::protocol::{ConnectionRecord, Span, SpanEventBatch, ValidationError};

pub use attributes::{merge_attributes, to_any_value};
pub use ids::{decode_span_id, decode_trace_id};

/// Value of `telemetry.sdk.name` and the instrumentation scope name.
pub const SDK_NAME: &str = "NewRelic";

/// Semantic conventions version the resource attributes follow.
pub const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.27.0";

const SERVICE_NAME: &str = "service.name";
const HOST_NAME: &str = "host.name";
const PROCESS_PID: &str = "process.pid";
const TELEMETRY_SDK_NAME: &str = "telemetry.sdk.name";
const TELEMETRY_SDK_LANGUAGE: &str = "telemetry.sdk.language";
const TELEMETRY_SDK_VERSION: &str = "telemetry.sdk.version";

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// An event that could not be translated; the batch it belonged to is dropped.
#[derive(Debug, Error)]
#[error("event {index} ({name:?}) rejected: {source}")]
pub struct TranslationError {
    /// Position of the event within its batch.
    pub index: usize,
    pub name: String,
    #[source]
    pub source: ValidationError,
}

/// Batches whose events can become OTLP spans.
///
/// Spans implement this today; transaction batches are parsed but not translated.
pub trait CanonicalSpans {
    fn canonical_spans(&self) -> Result<Vec<otlp::Span>, TranslationError>;
}

impl CanonicalSpans for SpanEventBatch {
    fn canonical_spans(&self) -> Result<Vec<otlp::Span>, TranslationError> {
        self.events
            .iter()
            .enumerate()
            .map(|(index, span)| {
                translate_span(span).map_err(|source| TranslationError {
                    index,
                    name: span.fields.name.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Build the OTLP representation of one batch from the agent that sent it.
pub fn to_canonical_trace<B>(
    connection: &ConnectionRecord,
    batch: &B,
) -> Result<otlp::ResourceSpans, TranslationError>
where
    B: CanonicalSpans + ?Sized,
{
    let spans = batch.canonical_spans()?;

    Ok(otlp::ResourceSpans {
        resource: Some(Resource {
            attributes: resource_attributes(connection),
            ..Default::default()
        }),
        scope_spans: vec![otlp::ScopeSpans {
            scope: Some(InstrumentationScope {
                name: SDK_NAME.to_string(),
                version: connection.version.clone(),
                ..Default::default()
            }),
            spans,
            ..Default::default()
        }],
        schema_url: SCHEMA_URL.to_string(),
    })
}

fn resource_attributes(
    connection: &ConnectionRecord,
) -> Vec<opentelemetry_proto::tonic::common::v1::KeyValue> {
    let pid = connection.pid.to_string();
    [
        (SERVICE_NAME, connection.app_name()),
        (HOST_NAME, connection.host.as_str()),
        (PROCESS_PID, pid.as_str()),
        (TELEMETRY_SDK_NAME, SDK_NAME),
        (TELEMETRY_SDK_LANGUAGE, connection.language.as_str()),
        (TELEMETRY_SDK_VERSION, connection.version.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(key, value)| attributes::string_attribute(key, value))
    .collect()
}

fn translate_span(span: &Span) -> Result<otlp::Span, ValidationError> {
    let fields = &span.fields;

    let trace_id = decode_trace_id(&fields.trace_id)?;
    let span_id = decode_span_id(&fields.span_id)?;
    let parent_span_id = match fields.parent_id.as_deref().filter(|p| !p.is_empty()) {
        Some(parent) => decode_span_id(parent)
            .map_err(|_| ValidationError::ParentId(parent.to_string()))?
            .to_vec(),
        None => Vec::new(),
    };

    let start = start_time_unix_nano(fields.timestamp);
    let end = start.saturating_add(duration_nanos(fields.duration));

    Ok(otlp::Span {
        trace_id: trace_id.to_vec(),
        span_id: span_id.to_vec(),
        parent_span_id,
        name: fields.name.clone(),
        kind: span_kind(fields.span_kind.as_deref()) as i32,
        start_time_unix_nano: start,
        end_time_unix_nano: end,
        attributes: merge_attributes(&span.user_attributes, &span.agent_attributes),
        ..Default::default()
    })
}

/// Map the agent's free-form `span.kind` tag.
pub fn span_kind(tag: Option<&str>) -> SpanKind {
    match tag {
        Some("server") => SpanKind::Server,
        Some("client") => SpanKind::Client,
        _ => SpanKind::Unspecified,
    }
}

fn start_time_unix_nano(timestamp_ms: u64) -> u64 {
    timestamp_ms.saturating_mul(NANOS_PER_MILLI)
}

/// Negative or non-finite durations count as zero so a span never ends before it starts.
fn duration_nanos(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * NANOS_PER_SEC).round() as u64
    } else {
        0
    }
}
