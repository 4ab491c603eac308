//! Embed model: the structured message document a webhook message displays.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single embed field.
///
/// `name` and `value` are kept as raw JSON so fields the client built with
/// numbers or nulls still pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub name: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub inline: bool,
    /// Keys the platform may add that we pass through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmbedField {
    /// Create a field with no extra keys.
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: Value::String(name.into()),
            value: Value::String(value.into()),
            inline,
            extra: Map::new(),
        }
    }

    /// The field name, when it is a string.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_str()
    }
}

/// Anything but a JSON `true` reads as `false`.
fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Option::<Value>::deserialize(deserializer)?, Some(Value::Bool(true))))
}

/// An embed as registered by the client.
///
/// Only `fields` is interpreted. Everything else round-trips verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(default, deserialize_with = "fields_or_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A missing, null or non-array `fields` key reads as no fields.
fn fields_or_empty<'de, D>(deserializer: D) -> Result<Vec<EmbedField>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => {
            serde_json::from_value(Value::Array(items)).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}
