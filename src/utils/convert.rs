//! TOML → JSON value conversion.
//!
//! Injection rules may carry inline TOML tables (e.g. a JSON-LD wrapper
//! schema) that renderers re-emit as JSON. Datetimes degrade to their
//! string form since JSON has no native date type.

use serde_json::Value as JsonValue;
use toml::Value as TomlValue;

/// Convert a TOML value into the equivalent JSON value.
pub fn toml_to_json(value: &TomlValue) -> JsonValue {
    match value {
        TomlValue::String(s) => JsonValue::String(s.clone()),
        TomlValue::Integer(i) => JsonValue::from(*i),
        TomlValue::Float(f) => {
            serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
        }
        TomlValue::Boolean(b) => JsonValue::Bool(*b),
        TomlValue::Datetime(dt) => JsonValue::String(dt.to_string()),
        TomlValue::Array(items) => JsonValue::Array(items.iter().map(toml_to_json).collect()),
        TomlValue::Table(table) => JsonValue::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}
