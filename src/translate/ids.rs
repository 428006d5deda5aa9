//! Hex identifier decoding.

use crate::protocol::ValidationError;

/// Decode a 32-character hex trace id into 16 bytes.
pub fn decode_trace_id(id: &str) -> Result<[u8; 16], ValidationError> {
    let mut bytes = [0u8; 16];
    hex::decode_to_slice(id, &mut bytes).map_err(|_| ValidationError::TraceId(id.to_string()))?;
    Ok(bytes)
}

/// Decode a 16-character hex span id into 8 bytes.
pub fn decode_span_id(id: &str) -> Result<[u8; 8], ValidationError> {
    let mut bytes = [0u8; 8];
    hex::decode_to_slice(id, &mut bytes).map_err(|_| ValidationError::SpanId(id.to_string()))?;
    Ok(bytes)
}
