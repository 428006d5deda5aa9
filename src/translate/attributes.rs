//! Attribute coercion into OTLP values.

use opentelemetry_proto::tonic::common::v1::{any_value::Value, AnyValue, KeyValue};

use crate::protocol::{AttributeValue, Attributes};

/// Merge user then agent attributes; on a shared key the agent value wins.
///
/// Output is sorted by key with each key present once.
pub fn merge_attributes(user: &Attributes, agent: &Attributes) -> Vec<KeyValue> {
    let mut merged: Attributes = user.clone();
    merged.extend(agent.iter().map(|(k, v)| (k.clone(), v.clone())));

    merged
        .into_iter()
        .map(|(key, value)| KeyValue {
            key,
            value: Some(to_any_value(value)),
        })
        .collect()
}

/// Strings, booleans and numbers keep their type; everything else becomes
/// its compact JSON text.
pub fn to_any_value(value: AttributeValue) -> AnyValue {
    let value = match value {
        AttributeValue::String(s) => Value::StringValue(s),
        AttributeValue::Bool(b) => Value::BoolValue(b),
        AttributeValue::Double(d) => Value::DoubleValue(d),
        AttributeValue::Other(other) => Value::StringValue(other.to_string()),
    };
    AnyValue { value: Some(value) }
}

pub(crate) fn string_attribute(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(Value::StringValue(value.to_string())),
        }),
    }
}
