//! Conversion between JSON and store values.
//!
//! JSON has no byte strings or timestamps, so they are rendered as arrays of
//! numbers and as millisecond numbers. Parsing never produces either.

use super::CliError;
use serde_json::{Map, Number, Value as Json};
use tandem_store::{Snapshot, Value};

/// Parses a command-line JSON argument into a store value.
pub fn parse_value(input: &str) -> Result<Value, CliError> {
    let json: Json = serde_json::from_str(input)?;
    from_json(json)
}

/// Converts a JSON value into a store value. `null` is rejected.
pub fn from_json(json: Json) -> Result<Value, CliError> {
    match json {
        Json::Null => Err(CliError::InvalidValue(
            "null cannot be stored, use delete instead".into(),
        )),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Integer(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| CliError::InvalidValue(format!("number {n} is out of range"))),
        },
        Json::String(s) => Ok(Value::Text(s)),
        Json::Array(items) => items
            .into_iter()
            .map(from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Json::Object(fields) => fields
            .into_iter()
            .map(|(k, v)| from_json(v).map(|v| (k, v)))
            .collect::<Result<_, _>>()
            .map(Value::Map),
    }
}

/// Renders a store value as JSON.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Timestamp(ts) => Json::Number(ts.as_millis().into()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Map(fields) => Json::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}

/// Renders a whole snapshot as a JSON object.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Json {
    Json::Object(
        snapshot
            .iter()
            .map(|(k, v)| (k.clone(), to_json(v)))
            .collect(),
    )
}
