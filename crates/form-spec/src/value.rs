use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::FormError;

/// Value kinds a host field can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value passed between host objects and widgets.
///
/// Absence (an unset optional field) is modelled as `Option::None` around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Bool(_) => ValueKind::Boolean,
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::Text(_) => ValueKind::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Loose boolean reading of any stored value; absent reads as false.
    pub fn coerce_bool(value: Option<&FieldValue>) -> bool {
        match value {
            Some(FieldValue::Bool(flag)) => *flag,
            Some(FieldValue::Integer(number)) => *number != 0,
            Some(FieldValue::Float(number)) => *number != 0.0,
            Some(FieldValue::Text(text)) => parse_bool(text).unwrap_or(false),
            None => false,
        }
    }

    /// Reads a JSON value as the declared kind. `null` is absent.
    pub fn from_json(field: &str, kind: ValueKind, value: &Value) -> Result<Option<Self>, FormError> {
        let parsed = match (kind, value) {
            (_, Value::Null) => return Ok(None),
            (ValueKind::Boolean, Value::Bool(flag)) => FieldValue::Bool(*flag),
            (ValueKind::Integer, Value::Number(number)) if number.is_i64() => {
                FieldValue::Integer(number.as_i64().unwrap_or_default())
            }
            (ValueKind::Float, Value::Number(number)) => {
                FieldValue::Float(number.as_f64().unwrap_or_default())
            }
            (ValueKind::String, Value::String(text)) => FieldValue::Text(text.clone()),
            (expected, other) => {
                return Err(FormError::TypeMismatch {
                    field: field.to_string(),
                    expected,
                    found: json_type_label(other).to_string(),
                });
            }
        };
        Ok(Some(parsed))
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(flag) => Value::Bool(*flag),
            FieldValue::Integer(number) => Value::Number(Number::from(*number)),
            FieldValue::Float(number) => Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(flag) => write!(f, "{flag}"),
            FieldValue::Integer(number) => write!(f, "{number}"),
            FieldValue::Float(number) => write!(f, "{number}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Typed extraction used by host objects when a widget writes a field back.
pub trait FromFieldValue: Sized {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError>;
}

/// Shorthand for [`FromFieldValue::from_field_value`].
pub fn extract<V: FromFieldValue>(field: &str, value: Option<FieldValue>) -> Result<V, FormError> {
    V::from_field_value(field, value)
}

fn mismatch(field: &str, expected: ValueKind, found: Option<&FieldValue>) -> FormError {
    FormError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found
            .map(|value| value.kind().to_string())
            .unwrap_or_else(|| "nothing".to_string()),
    }
}

impl FromFieldValue for bool {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        match value {
            Some(FieldValue::Bool(flag)) => Ok(flag),
            other => Err(mismatch(field, ValueKind::Boolean, other.as_ref())),
        }
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        match value {
            Some(FieldValue::Integer(number)) => Ok(number),
            other => Err(mismatch(field, ValueKind::Integer, other.as_ref())),
        }
    }
}

impl FromFieldValue for i32 {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        let wide = i64::from_field_value(field, value)?;
        i32::try_from(wide).map_err(|_| FormError::TypeMismatch {
            field: field.to_string(),
            expected: ValueKind::Integer,
            found: format!("out of range integer {wide}"),
        })
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        match value {
            Some(FieldValue::Float(number)) => Ok(number),
            other => Err(mismatch(field, ValueKind::Float, other.as_ref())),
        }
    }
}

impl FromFieldValue for f32 {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        let wide = f64::from_field_value(field, value)?;
        let narrow = wide as f32;
        if narrow.is_finite() || !wide.is_finite() {
            Ok(narrow)
        } else {
            Err(FormError::TypeMismatch {
                field: field.to_string(),
                expected: ValueKind::Float,
                found: format!("out of range float {wide}"),
            })
        }
    }
}

impl FromFieldValue for String {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        match value {
            Some(FieldValue::Text(text)) => Ok(text),
            None => Ok(String::new()),
            other => Err(mismatch(field, ValueKind::String, other.as_ref())),
        }
    }
}

/// Absence maps to `None`; a present value goes through `V`.
impl<V: FromFieldValue> FromFieldValue for Option<V> {
    fn from_field_value(field: &str, value: Option<FieldValue>) -> Result<Self, FormError> {
        match value {
            Some(value) => V::from_field_value(field, Some(value)).map(Some),
            None => Ok(None),
        }
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn json_type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
