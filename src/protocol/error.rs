//! Errors raised while decoding agent payloads.

use thiserror::Error;

/// A payload that does not match the shape the agent protocol defines.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON, or does not decode into the expected record.
    #[error("failed to parse payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A connect payload holding an empty array.
    #[error("connect payload has no connection entries")]
    NoConnections,

    /// An array at `position` has the wrong number of elements.
    #[error("{position} has {actual} elements, expected {expected}")]
    Arity {
        position: String,
        expected: usize,
        actual: usize,
    },

    /// The element at `position` has the wrong JSON type.
    #[error("{position} is not {expected}, found {found}")]
    UnexpectedType {
        position: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The element at `position` has the right type but its contents do not decode.
    #[error("failed to decode {position}: {source}")]
    Decode {
        position: String,
        #[source]
        source: serde_json::Error,
    },

    /// Well-formed JSON that breaks a record invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Well-formed data that is semantically unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("connection has no application name")]
    MissingAppName,

    #[error("invalid trace id {0:?}: must be exactly 32 hexadecimal characters")]
    TraceId(String),

    #[error("invalid span id {0:?}: must be exactly 16 hexadecimal characters")]
    SpanId(String),

    #[error("invalid parent span id {0:?}: must be exactly 16 hexadecimal characters")]
    ParentId(String),
}
