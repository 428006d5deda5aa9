//! Decoders for the three payload shapes the agent sends.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::protocol::error::{ParseError, ValidationError};
use crate::protocol::payload::{
    Attributes, ConnectionRecord, Event, EventBatch, EventBatchInfo, SpanEventBatch,
    TransactionEventBatch,
};

/// Decode a `connect` body: a JSON array whose first object describes the agent.
pub fn parse_connection_data(payload: &[u8]) -> Result<ConnectionRecord, ParseError> {
    let connections: Vec<ConnectionRecord> = serde_json::from_slice(payload)?;
    let connection = connections
        .into_iter()
        .next()
        .ok_or(ParseError::NoConnections)?;

    if connection.app_name().trim().is_empty() {
        return Err(ValidationError::MissingAppName.into());
    }

    Ok(connection)
}

/// Decode a `span_event_data` body.
pub fn parse_span_event_batch(payload: &[u8]) -> Result<SpanEventBatch, ParseError> {
    parse_event_batch(payload)
}

/// Decode an `analytic_event_data` body.
pub fn parse_transaction_event_batch(payload: &[u8]) -> Result<TransactionEventBatch, ParseError> {
    parse_event_batch(payload)
}

/// `[run_id: string, info: object, events: [[fields, user, agent], ...]]`
fn parse_event_batch<T: DeserializeOwned>(payload: &[u8]) -> Result<EventBatch<T>, ParseError> {
    let elements: Vec<Value> = serde_json::from_slice(payload)?;
    let [run_id, info, events] = take_exact::<3>(elements, "payload")?;

    let run_id = match run_id {
        Value::String(s) => s,
        other => return Err(unexpected("run id (element 0)", "a string", &other)),
    };

    let info: EventBatchInfo = match info {
        Value::Object(_) => decode(info, "event batch info (element 1)")?,
        other => return Err(unexpected("event batch info (element 1)", "an object", &other)),
    };

    let entries = match events {
        Value::Array(entries) => entries,
        other => return Err(unexpected("events (element 2)", "an array", &other)),
    };

    let events = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_event(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventBatch {
        run_id,
        info,
        events,
    })
}

fn parse_event<T: DeserializeOwned>(index: usize, entry: Value) -> Result<Event<T>, ParseError> {
    let position = format!("event {index}");
    let elements = match entry {
        Value::Array(elements) => elements,
        other => return Err(unexpected(position, "an array", &other)),
    };
    let [fields, user, agent] = take_exact::<3>(elements, &position)?;

    let fields = match fields {
        Value::Object(_) => decode(fields, format!("{position} fields"))?,
        other => return Err(unexpected(format!("{position} fields"), "an object", &other)),
    };

    Ok(Event {
        fields,
        user_attributes: attributes(user, format!("{position} user attributes"))?,
        agent_attributes: attributes(agent, format!("{position} agent attributes"))?,
    })
}

fn take_exact<const N: usize>(
    elements: Vec<Value>,
    position: &str,
) -> Result<[Value; N], ParseError> {
    let actual = elements.len();
    elements.try_into().map_err(|_| ParseError::Arity {
        position: position.to_string(),
        expected: N,
        actual,
    })
}

fn decode<T: DeserializeOwned>(value: Value, position: impl Into<String>) -> Result<T, ParseError> {
    serde_json::from_value(value).map_err(|source| ParseError::Decode {
        position: position.into(),
        source,
    })
}

fn attributes(value: Value, position: String) -> Result<Attributes, ParseError> {
    match value {
        Value::Object(map) => Ok(into_attributes(map)),
        other => Err(unexpected(position, "an object", &other)),
    }
}

fn into_attributes(map: Map<String, Value>) -> Attributes {
    map.into_iter().map(|(k, v)| (k, v.into())).collect()
}

fn unexpected(position: impl Into<String>, expected: &'static str, found: &Value) -> ParseError {
    ParseError::UnexpectedType {
        position: position.into(),
        expected,
        found: json_type(found),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
