use crate::value::Value;
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

impl Value {
    /// Convert a JSON document into an attribute value.
    ///
    /// Integral numbers become `Int`, everything else numeric becomes
    /// `Float`. Objects become `Map`, arrays become `List`.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(v) => Self::Bool(*v),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the value as JSON.
    ///
    /// Timestamps render as RFC 3339 strings, sets as sorted arrays, and
    /// non-finite floats as `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Int(v) => JsonValue::Number(JsonNumber::from(*v)),
            Self::Float(v) => JsonNumber::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
            Self::Text(v) => JsonValue::String(v.clone()),
            Self::Timestamp(v) => JsonValue::String(v.to_rfc3339()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::TextSet(items) => {
                JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
            }
            Self::IntSet(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|v| JsonValue::Number(JsonNumber::from(*v)))
                    .collect(),
            ),
            Self::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<JsonMap<String, JsonValue>>(),
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Self::from_json(&json)
    }
}
