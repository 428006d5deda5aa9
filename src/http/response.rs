//! Reply envelopes and error responses.
//!
//! # Design Decisions
//! - Every reply is `application/json; charset=utf-8`, including empty ones
//! - Successful agent replies wrap their payload in `{"return_value": ...}`
//! - Errors carry only `{"status": "<code> <reason>"}`

use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::consumer::ConsumeError;
use crate::protocol::ParseError;
use crate::translate::TranslationError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Serialize)]
struct Envelope<T> {
    return_value: T,
}

/// Reply to `preconnect`: where the agent should send everything else.
#[derive(Debug, Serialize)]
pub struct PreconnectReply {
    pub redirect_host: String,
    pub security_policies: SecurityPolicies,
}

/// Security policies advertised to the agent. None are enforced.
#[derive(Debug, Default, Serialize)]
pub struct SecurityPolicies {
    pub record_sql: SecurityPolicy,
    pub attributes_include: SecurityPolicy,
    pub allow_raw_exception_messages: SecurityPolicy,
    pub custom_events: SecurityPolicy,
    pub custom_parameters: SecurityPolicy,
}

#[derive(Debug, Default, Serialize)]
pub struct SecurityPolicy {
    pub enabled: Option<bool>,
}

/// Reply to `connect`. The run id is the application name.
#[derive(Debug, Serialize)]
pub struct ConnectReply {
    pub agent_run_id: String,
}

/// `200 OK` with `{"return_value": value}`.
pub fn return_value<T: Serialize>(value: T) -> Result<Response, RequestError> {
    let body = serde_json::to_vec(&Envelope {
        return_value: value,
    })?;
    Ok(json_response(StatusCode::OK, body))
}

/// `200 OK` with no body.
pub fn empty() -> Response {
    json_response(StatusCode::OK, Vec::new())
}

/// `{"status":"<code> <reason>"}` with the matching status.
pub fn status(status: StatusCode) -> Response {
    json_response(status, format!(r#"{{"status":"{}"}}"#, status).into_bytes())
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}

/// Why a single agent request failed.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing `method` query parameter")]
    MissingMethod,

    #[error("unsupported method `{0}`")]
    UnknownMethod(String),

    #[error("malformed query string: {0}")]
    Query(#[from] QueryRejection),

    #[error("failed to read body: {0}")]
    Body(#[from] BytesRejection),

    #[error("unsupported content encoding `{0}`")]
    UnsupportedEncoding(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("no connection registered for run id `{0}`")]
    UnknownRunId(String),

    #[error("failed to forward traces: {0}")]
    Consume(#[from] ConsumeError),

    #[error("failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RequestError {
    /// HTTP status reported to the agent.
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MissingMethod
            | RequestError::UnknownMethod(_)
            | RequestError::Query(_)
            | RequestError::Parse(_)
            | RequestError::Translation(_) => StatusCode::BAD_REQUEST,
            RequestError::Body(rejection) => rejection.status(),
            RequestError::UnsupportedEncoding(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            // Agents reconnect when they see 409.
            RequestError::UnknownRunId(_) => StatusCode::CONFLICT,
            RequestError::Consume(_) | RequestError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        status(self.status())
    }
}
