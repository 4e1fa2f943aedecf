//! JSON Schema helpers for MCP argument validation.
//!
//! Covers the subset of JSON Schema that capability descriptors use:
//! `required`, per-property `type` and `enum`, and
//! `additionalProperties: false`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Schema validation errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The input does not match the expected schema.
    #[error("schema validation failed: {message}")]
    ValidationFailed { message: String },
    /// The schema itself is malformed.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

impl SchemaError {
    fn failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// The message without the "schema validation failed" prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::ValidationFailed { message } | Self::InvalidSchema { message } => message,
        }
    }
}

/// How much of a schema is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Required fields, JSON types and enums.
    #[default]
    Strict,
    /// Required fields only.
    Presence,
}

/// Validates `input` against `schema` in the given mode.
pub fn validate(schema: &Value, input: &Value, mode: ValidationMode) -> Result<(), SchemaError> {
    validate_required_fields(schema, input)?;
    if mode == ValidationMode::Presence {
        return Ok(());
    }

    let input_obj = as_object(input)?;
    let properties = match schema.get("properties") {
        Some(Value::Object(p)) => Some(p),
        Some(_) => {
            return Err(SchemaError::InvalidSchema {
                message: "properties must be an object".to_string(),
            })
        }
        None => None,
    };
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (name, value) in input_obj {
        let Some(prop) = properties.and_then(|p| p.get(name)) else {
            if closed {
                return Err(SchemaError::failed(format!("unexpected field: {name}")));
            }
            continue;
        };
        if value.is_null() && !is_required(schema, name) {
            continue;
        }
        check_type(name, prop, value)?;
        check_enum(name, prop, value)?;
    }

    Ok(())
}

/// Checks that a JSON value contains required properties from a schema.
///
/// This is the presence-only check; [`validate`] layers type and enum
/// checks on top of it.
pub fn validate_required_fields(schema: &Value, input: &Value) -> Result<(), SchemaError> {
    let required = match schema.get("required") {
        Some(Value::Array(arr)) => arr,
        _ => return Ok(()),
    };

    let input_obj = as_object(input)?;

    for field in required {
        let field_name = field.as_str().ok_or_else(|| SchemaError::InvalidSchema {
            message: "required field names must be strings".to_string(),
        })?;
        if !input_obj.contains_key(field_name) {
            return Err(SchemaError::failed(format!(
                "missing required field: {field_name}"
            )));
        }
    }

    Ok(())
}

fn as_object(input: &Value) -> Result<&Map<String, Value>, SchemaError> {
    input
        .as_object()
        .ok_or_else(|| SchemaError::failed("input must be an object"))
}

fn is_required(schema: &Value, name: &str) -> bool {
    schema
        .get("required")
        .and_then(Value::as_array)
        .is_some_and(|r| r.iter().any(|f| f.as_str() == Some(name)))
}

fn check_type(name: &str, prop: &Value, value: &Value) -> Result<(), SchemaError> {
    let allowed: Vec<&str> = match prop.get("type") {
        None => return Ok(()),
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        Some(_) => {
            return Err(SchemaError::InvalidSchema {
                message: format!("type of '{name}' must be a string or array"),
            })
        }
    };

    if allowed.iter().any(|t| matches_type(t, value)) {
        return Ok(());
    }
    Err(SchemaError::failed(format!(
        "field '{name}' must be of type {}, got {}",
        allowed.join(" or "),
        type_name(value)
    )))
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        // Unknown type keywords are not ours to reject.
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// String enums compare ASCII-case-insensitively: handlers normalise
/// case themselves (`"BUY"` is accepted for `["buy", "sell"]`).
fn check_enum(name: &str, prop: &Value, value: &Value) -> Result<(), SchemaError> {
    let Some(Value::Array(options)) = prop.get("enum") else {
        return Ok(());
    };
    let ok = options.iter().any(|opt| match (opt, value) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (a, b) => a == b,
    });
    if ok {
        return Ok(());
    }
    let listed: Vec<String> = options.iter().map(Value::to_string).collect();
    Err(SchemaError::failed(format!(
        "field '{name}' must be one of [{}], got {value}",
        listed.join(", ")
    )))
}
