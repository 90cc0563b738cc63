//! Literal values and their dialect representation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::datetime::DateMacro;
use crate::error::RenderError;

/// A value bound to a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers above `i64::MAX`.
    UInt(u64),
    /// Must be finite to render.
    Float(f64),
    String(String),
    DateTime(OffsetDateTime),
    /// Arrays and objects, rendered as quoted JSON text.
    Json(serde_json::Value),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Literal form of the value as it appears in a rendered filter.
    pub fn to_literal(&self) -> Result<String, RenderError> {
        Ok(match self {
            FilterValue::Null => "null".to_string(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Int(i) => i.to_string(),
            FilterValue::UInt(u) => u.to_string(),
            FilterValue::Float(f) if !f.is_finite() => return Err(RenderError::NonFinite(*f)),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::String(s) => quote(s),
            FilterValue::DateTime(dt) => format!("'{}'", format_datetime(dt)?),
            FilterValue::Json(v) => quote(&serde_json::to_string(v)?),
        })
    }
}

/// Single-quote `text`, escaping embedded quotes with a backslash.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "\\'"))
}

/// UTC datetime in the store's literal format, `2024-01-02 03:04:05.000Z`.
pub fn format_datetime(dt: &OffsetDateTime) -> Result<String, time::error::Format> {
    dt.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]Z"
    ))
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValue::Null => serializer.serialize_unit(),
            FilterValue::Bool(b) => serializer.serialize_bool(*b),
            FilterValue::Int(i) => serializer.serialize_i64(*i),
            FilterValue::UInt(u) => serializer.serialize_u64(*u),
            FilterValue::Float(f) => serializer.serialize_f64(*f),
            FilterValue::String(s) => serializer.serialize_str(s),
            FilterValue::DateTime(dt) => {
                let text = format_datetime(dt).map_err(<S::Error as serde::ser::Error>::custom)?;
                serializer.serialize_str(&text)
            }
            FilterValue::Json(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(FilterValue::from)
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FilterValue::Null,
            serde_json::Value::Bool(b) => FilterValue::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => FilterValue::Int(i),
                (None, Some(u)) => FilterValue::UInt(u),
                (None, None) => FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => FilterValue::String(s),
            other => FilterValue::Json(other),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Int(i64::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Int(i64::from(value))
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(FilterValue::Int)
            .unwrap_or(FilterValue::UInt(value))
    }
}

impl From<f32> for FilterValue {
    fn from(value: f32) -> Self {
        FilterValue::Float(f64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        FilterValue::String(value.clone())
    }
}

impl From<OffsetDateTime> for FilterValue {
    fn from(value: OffsetDateTime) -> Self {
        FilterValue::DateTime(value)
    }
}

/// Naive datetimes are taken to be UTC.
impl From<PrimitiveDateTime> for FilterValue {
    fn from(value: PrimitiveDateTime) -> Self {
        FilterValue::DateTime(value.assume_utc())
    }
}

impl From<DateMacro> for FilterValue {
    fn from(value: DateMacro) -> Self {
        FilterValue::String(value.as_str().to_string())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}
