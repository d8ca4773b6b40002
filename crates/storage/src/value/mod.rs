//! Tagged value model shared by documents, translators and fields
//!
//! A [`Value`] is both the raw form read from a document and the live form a
//! translator produces for an attribute. Collections and maps nest arbitrarily.

mod convert;
mod object;

pub use convert::{enum_from_value, enum_to_value, enum_type_tag, StorageEnum, StorageValue};
pub use object::{EnumConstant, Object, ObjectValue};

use crate::types::{Scalar, TypeTag};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Entries in insertion order. Equality ignores the order.
    Map(Vec<(Value, Value)>),
    #[serde(skip)]
    Enum(EnumConstant),
    #[serde(skip)]
    Object(Object),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Whether both values are lists or both are maps.
    pub fn same_container_kind(&self, other: &Value) -> bool {
        matches!(
            (self, other),
            (Self::List(_), Self::List(_)) | (Self::Map(_), Self::Map(_))
        )
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "Boolean",
            Self::Byte(_) => "Byte",
            Self::Short(_) => "Short",
            Self::Int(_) => "Integer",
            Self::Long(_) => "Long",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::Char(_) => "Character",
            Self::String(_) => "String",
            Self::Bytes(_) => "byte[]",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Enum(constant) => constant.tag().name(),
            Self::Object(object) => object.type_tag().name(),
        }
    }

    /// Runtime type of this value, used to pick a translator per element.
    pub fn runtime_type(&self) -> TypeTag {
        match self {
            Self::Null => TypeTag::object(),
            Self::Bool(_) => Scalar::Bool.wrapper(),
            Self::Byte(_) => Scalar::Byte.wrapper(),
            Self::Short(_) => Scalar::Short.wrapper(),
            Self::Int(_) => Scalar::Int.wrapper(),
            Self::Long(_) => Scalar::Long.wrapper(),
            Self::Float(_) => Scalar::Float.wrapper(),
            Self::Double(_) => Scalar::Double.wrapper(),
            Self::Char(_) => Scalar::Char.wrapper(),
            Self::String(_) => <String as StorageValue>::type_tag(),
            Self::Bytes(_) => TypeTag::bytes(),
            Self::List(_) => <Vec<Value> as StorageValue>::type_tag(),
            Self::Map(_) => <HashMap<Value, Value> as StorageValue>::type_tag(),
            Self::Enum(constant) => constant.tag(),
            Self::Object(object) => object.type_tag(),
        }
    }

    /// Stable hash of the value within this process.
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integral value of any integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(value) => Some(i64::from(*value)),
            Self::Short(value) => Some(i64::from(*value)),
            Self::Int(value) => Some(i64::from(*value)),
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }

    /// Floating value of any numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(f64::from(*value)),
            Self::Double(value) => Some(*value),
            other => other.as_i64().map(|value| value as f64),
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a string key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Builds a map value from string keys.
    pub fn map_of<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (Self::String(key.into()), value))
                .collect(),
        )
    }

    fn discriminant(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Byte(_) => 2,
            Self::Short(_) => 3,
            Self::Int(_) => 4,
            Self::Long(_) => 5,
            Self::Float(_) => 6,
            Self::Double(_) => 7,
            Self::Char(_) => 8,
            Self::String(_) => 9,
            Self::Bytes(_) => 10,
            Self::List(_) => 11,
            Self::Map(_) => 12,
            Self::Enum(_) => 13,
            Self::Object(_) => 14,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len() && a.iter().all(|entry| b.contains(entry))
            }
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(value) => value.hash(state),
            Self::Byte(value) => value.hash(state),
            Self::Short(value) => value.hash(state),
            Self::Int(value) => value.hash(state),
            Self::Long(value) => value.hash(state),
            Self::Float(value) => value.to_bits().hash(state),
            Self::Double(value) => value.to_bits().hash(state),
            Self::Char(value) => value.hash(state),
            Self::String(value) => value.hash(state),
            Self::Bytes(value) => value.hash(state),
            Self::List(values) => values.hash(state),
            Self::Map(entries) => {
                // order independent
                let sum = entries.iter().fold(0u64, |acc, entry| {
                    let mut hasher = DefaultHasher::new();
                    entry.hash(&mut hasher);
                    acc.wrapping_add(hasher.finish())
                });
                entries.len().hash(state);
                sum.hash(state);
            }
            Self::Enum(constant) => constant.hash(state),
            Self::Object(object) => object.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Byte(value) => write!(f, "{value}"),
            Self::Short(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}"),
            Self::Float(value) => fmt_float(f, f64::from(*value)),
            Self::Double(value) => fmt_float(f, *value),
            Self::Char(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Bytes(bytes) => write!(f, "{bytes:?}"),
            Self::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Self::Enum(constant) => write!(f, "{constant}"),
            Self::Object(object) => write!(f, "{object}"),
        }
    }
}

/// Whole floats keep a trailing `.0` so they read back as floats.
fn fmt_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}
