//! Agent method dispatch.
//!
//! Every agent call hits one path; the `method` query parameter selects the
//! operation. Failures are logged with the request id and answered with an
//! error status; they never reach the server loop.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::time::Instant;

use crate::http::request::request_id;
use crate::http::response::{self, ConnectReply, PreconnectReply, RequestError, SecurityPolicies};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::protocol::{
    parse_connection_data, parse_span_event_batch, parse_transaction_event_batch, SpanEventBatch,
};
use crate::translate::to_canonical_trace;

/// Query string of an agent call. Other agent parameters are ignored.
#[derive(Debug, Deserialize)]
pub struct InvokeQuery {
    pub method: Option<String>,
}

/// Agent methods this receiver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMethod {
    Preconnect,
    Connect,
    SpanEventData,
    AnalyticEventData,
}

impl AgentMethod {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "preconnect" => Some(Self::Preconnect),
            "connect" => Some(Self::Connect),
            "span_event_data" => Some(Self::SpanEventData),
            "analytic_event_data" => Some(Self::AnalyticEventData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preconnect => "preconnect",
            Self::Connect => "connect",
            Self::SpanEventData => "span_event_data",
            Self::AnalyticEventData => "analytic_event_data",
        }
    }
}

/// Entry point for `invoke_raw_method`.
pub async fn invoke_raw_method(
    State(state): State<AppState>,
    query: Result<Query<InvokeQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let method = query
        .map_err(RequestError::from)
        .and_then(|Query(query)| {
            let name = query.method.ok_or(RequestError::MissingMethod)?;
            AgentMethod::parse(&name).ok_or(RequestError::UnknownMethod(name))
        });
    let label = method.as_ref().map(AgentMethod::as_str).unwrap_or("unknown");

    let result = match method {
        Ok(method) => match body {
            Ok(body) => dispatch(&state, method, &body, request_id).await,
            Err(rejection) => Err(rejection.into()),
        },
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, method = label, error = %e, "Agent request failed");
            } else {
                tracing::warn!(request_id = %request_id, method = label, error = %e, "Agent request rejected");
            }
            e.into_response()
        }
    };

    metrics::record_request(label, response.status().as_u16(), start);
    response
}

async fn dispatch(
    state: &AppState,
    method: AgentMethod,
    body: &[u8],
    request_id: &str,
) -> Result<Response, RequestError> {
    match method {
        AgentMethod::Preconnect => preconnect(state),
        AgentMethod::Connect => connect(state, body, request_id),
        AgentMethod::SpanEventData => span_event_data(state, body, request_id).await,
        AgentMethod::AnalyticEventData => analytic_event_data(body, request_id),
    }
}

fn preconnect(state: &AppState) -> Result<Response, RequestError> {
    response::return_value(PreconnectReply {
        redirect_host: state.redirect_host.to_string(),
        security_policies: SecurityPolicies::default(),
    })
}

fn connect(state: &AppState, body: &[u8], request_id: &str) -> Result<Response, RequestError> {
    let connection = parse_connection_data(body)?;
    let app_name = connection.app_name().to_string();

    tracing::info!(
        request_id = %request_id,
        app_name = %app_name,
        pid = connection.pid,
        host = %connection.host,
        language = %connection.language,
        agent_version = %connection.version,
        "Agent connected"
    );
    state.registry.put(app_name.clone(), connection);

    response::return_value(ConnectReply {
        agent_run_id: app_name,
    })
}

async fn span_event_data(
    state: &AppState,
    body: &[u8],
    request_id: &str,
) -> Result<Response, RequestError> {
    let batch = parse_span_event_batch(body)?;
    let count = batch.len();

    match forward_spans(state, &batch).await {
        Ok(()) => {
            metrics::record_spans_accepted(count);
            tracing::debug!(
                request_id = %request_id,
                run_id = %batch.run_id,
                span_count = count,
                reservoir_size = batch.info.reservoir_size,
                events_seen = batch.info.events_seen,
                "Spans forwarded"
            );
            Ok(response::empty())
        }
        Err(e) => {
            metrics::record_spans_refused(count);
            Err(e)
        }
    }
}

async fn forward_spans(state: &AppState, batch: &SpanEventBatch) -> Result<(), RequestError> {
    let connection = state
        .registry
        .get(&batch.run_id)
        .ok_or_else(|| RequestError::UnknownRunId(batch.run_id.clone()))?;
    let traces = to_canonical_trace(&connection, batch)?;
    state.consumer.consume_traces(traces).await?;
    Ok(())
}

fn analytic_event_data(body: &[u8], request_id: &str) -> Result<Response, RequestError> {
    let batch = parse_transaction_event_batch(body)?;
    metrics::record_transactions(batch.len());

    tracing::info!(
        request_id = %request_id,
        run_id = %batch.run_id,
        transaction_count = batch.len(),
        reservoir_size = batch.info.reservoir_size,
        events_seen = batch.info.events_seen,
        "Transaction events received"
    );
    for tx in &batch.events {
        tracing::debug!(
            request_id = %request_id,
            name = %tx.fields.name,
            duration = tx.fields.duration,
            error = tx.fields.error,
            "Transaction"
        );
    }

    Ok(response::empty())
}
