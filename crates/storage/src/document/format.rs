//! Text encodings of a document

use crate::error::DocumentError;
use crate::value::Value;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// File format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Determine format from file extension
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Toml, // Default to TOML
        }
    }

    /// Parses document text into its root map. Blank text is an empty document.
    pub fn parse(&self, content: &str) -> Result<Value, String> {
        if content.trim().is_empty() {
            return Ok(Value::Map(Vec::new()));
        }
        match self {
            Self::Json => {
                let json: serde_json::Value = serde_json::from_str(content)
                    .map_err(|e| format!("JSON parse error: {}", e))?;
                match json {
                    serde_json::Value::Object(_) => Ok(from_json(json)),
                    _ => Err("JSON parse error: document root is not an object".to_string()),
                }
            }
            Self::Toml => {
                let table: toml::Table = toml::from_str(content)
                    .map_err(|e| format!("TOML parse error: {}", e))?;
                Ok(from_toml(toml::Value::Table(table)))
            }
        }
    }

    pub fn render(&self, root: &Value) -> Result<String, DocumentError> {
        match self {
            Self::Json => serde_json::to_string_pretty(&to_json(root)?)
                .map_err(|e| DocumentError::Unsupported(format!("JSON serialize error: {}", e))),
            Self::Toml => {
                let table = match to_toml(root)? {
                    Some(toml::Value::Table(table)) => table,
                    _ => toml::Table::new(),
                };
                toml::to_string_pretty(&table)
                    .map_err(|e| DocumentError::Unsupported(format!("TOML serialize error: {}", e)))
            }
        }
    }
}

fn integer(value: i64) -> Value {
    match i32::try_from(value) {
        Ok(value) => Value::Int(value),
        Err(_) => Value::Long(value),
    }
}

fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Bool(value),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(value) => integer(value),
            None => Value::Double(number.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(value) => Value::String(value),
        serde_json::Value::Array(values) => Value::List(values.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| (Value::String(key), from_json(value)))
                .collect(),
        ),
    }
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(value) => Value::String(value),
        toml::Value::Integer(value) => integer(value),
        toml::Value::Float(value) => Value::Double(value),
        toml::Value::Boolean(value) => Value::Bool(value),
        toml::Value::Datetime(value) => Value::String(value.to_string()),
        toml::Value::Array(values) => Value::List(values.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(key, value)| (Value::String(key), from_toml(value)))
                .collect(),
        ),
    }
}

/// f32 goes through its shortest text form so `0.1` stays `0.1`.
fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

fn unsupported(value: &Value) -> DocumentError {
    DocumentError::Unsupported(format!(
        "{} must be translated before it is written",
        value.kind_name()
    ))
}

fn to_json(value: &Value) -> Result<serde_json::Value, DocumentError> {
    let float = |value: f64| {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .ok_or_else(|| DocumentError::Unsupported(format!("{value} is not a finite number")))
    };
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(value) => serde_json::Value::Bool(*value),
        Value::Float(value) => float(widen(*value))?,
        Value::Double(value) => float(*value)?,
        Value::Char(value) => serde_json::Value::String(value.to_string()),
        Value::String(value) => serde_json::Value::String(value.clone()),
        Value::Bytes(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
        Value::List(values) => serde_json::Value::Array(
            values.iter().map(to_json).collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => {
            let mut map = serde_json::Map::new();
            for (key, value) in entries.iter().filter(|(_, value)| !value.is_null()) {
                map.insert(key.to_string(), to_json(value)?);
            }
            serde_json::Value::Object(map)
        }
        Value::Enum(_) | Value::Object(_) => return Err(unsupported(value)),
        integral => match integral.as_i64() {
            Some(number) => serde_json::Value::from(number),
            None => return Err(unsupported(integral)),
        },
    })
}

/// TOML has no null, so nulls yield `None` and are left out.
fn to_toml(value: &Value) -> Result<Option<toml::Value>, DocumentError> {
    Ok(Some(match value {
        Value::Null => return Ok(None),
        Value::Bool(value) => toml::Value::Boolean(*value),
        Value::Float(value) => toml::Value::Float(widen(*value)),
        Value::Double(value) => toml::Value::Float(*value),
        Value::Char(value) => toml::Value::String(value.to_string()),
        Value::String(value) => toml::Value::String(value.clone()),
        Value::Bytes(bytes) => toml::Value::String(STANDARD.encode(bytes)),
        Value::List(values) => {
            let mut array = Vec::with_capacity(values.len());
            for value in values {
                if let Some(value) = to_toml(value)? {
                    array.push(value);
                }
            }
            toml::Value::Array(array)
        }
        Value::Map(entries) => {
            let mut table = toml::Table::new();
            for (key, value) in entries {
                if let Some(value) = to_toml(value)? {
                    table.insert(key.to_string(), value);
                }
            }
            toml::Value::Table(table)
        }
        Value::Enum(_) | Value::Object(_) => return Err(unsupported(value)),
        integral => match integral.as_i64() {
            Some(number) => toml::Value::Integer(number),
            None => return Err(unsupported(integral)),
        },
    }))
}
