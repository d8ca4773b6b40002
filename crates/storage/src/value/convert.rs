//! Conversions between typed attributes and [`Value`]

use super::{EnumConstant, Object, Value};
use crate::error::{Result, StorageError};
use crate::types::{normalize, Interface, Scalar, TypeKind, TypeTag};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use util::{IgnoreCase, Location};
use uuid::Uuid;

/// A Rust type that can live in a persisted attribute.
pub trait StorageValue: Sized + 'static {
    /// Declared type of the attribute.
    fn type_tag() -> TypeTag;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;

    /// Merges a loaded collection or map into `self` in place.
    ///
    /// Returns false when `self` is not a live container of the same kind,
    /// in which case the caller replaces the attribute instead.
    fn merge_value(&mut self, value: &Value) -> Result<bool> {
        let _ = value;
        Ok(false)
    }

    /// Appends the nested key and value types of this type, outermost first.
    fn describe_shape(keys: &mut Vec<TypeTag>, values: &mut Vec<TypeTag>) {
        let _ = (keys, values);
    }
}

/// A fieldless enumeration persisted by constant name.
///
/// Usually implemented through [`storage_enum!`](crate::storage_enum).
pub trait StorageEnum: Copy + 'static {
    const CONSTANTS: &'static [Self];
    const NAMES: &'static [&'static str];

    fn ordinal(&self) -> usize;

    fn name(&self) -> &'static str;
}

pub fn enum_type_tag<E: StorageEnum>() -> TypeTag {
    TypeTag::enumeration::<E>(E::NAMES)
}

pub fn enum_to_value<E: StorageEnum>(value: &E) -> Value {
    Value::Enum(EnumConstant::new(
        enum_type_tag::<E>(),
        value.ordinal(),
        value.name(),
    ))
}

/// Accepts a constant of `E` or its name in any case.
pub fn enum_from_value<E: StorageEnum>(value: Value) -> Result<E> {
    let tag = enum_type_tag::<E>();
    let ordinal = match &value {
        Value::Enum(constant) if constant.tag() == tag => Some(constant.ordinal()),
        Value::String(name) => E::NAMES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name)),
        other => return Err(StorageError::mismatch(tag.name(), other.kind_name())),
    };
    ordinal
        .and_then(|ordinal| E::CONSTANTS.get(ordinal).copied())
        .ok_or_else(|| StorageError::Conversion(format!("{value} is not a constant of {tag}")))
}

/// Declares a fieldless enum that can be persisted by name.
///
/// The generated enum derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`
/// and `Hash`.
#[macro_export]
macro_rules! storage_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $crate::StorageEnum for $name {
            const CONSTANTS: &'static [Self] = &[$(Self::$variant),+];
            const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn ordinal(&self) -> usize {
                *self as usize
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl $crate::StorageValue for $name {
            fn type_tag() -> $crate::TypeTag {
                $crate::enum_type_tag::<Self>()
            }

            fn to_value(&self) -> $crate::Value {
                $crate::enum_to_value(self)
            }

            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                $crate::enum_from_value(value)
            }
        }
    };
}

fn out_of_range(raw: impl std::fmt::Display, target: &str) -> StorageError {
    StorageError::Conversion(format!("{raw} is out of range for {target}"))
}

macro_rules! integer_value {
    ($($ty:ty => $scalar:ident, $variant:ident, $wide:ty;)+) => {$(
        impl StorageValue for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::new::<$ty>(stringify!($ty), TypeKind::Primitive(Scalar::$scalar), &[])
            }

            fn to_value(&self) -> Value {
                Value::$variant(<$wide>::from(*self))
            }

            fn from_value(value: Value) -> Result<Self> {
                let raw = value
                    .as_i64()
                    .ok_or_else(|| StorageError::mismatch(stringify!($ty), value.kind_name()))?;
                <$ty>::try_from(raw).map_err(|_| out_of_range(raw, stringify!($ty)))
            }
        }
    )+};
}

integer_value! {
    i8 => Byte, Byte, i8;
    i16 => Short, Short, i16;
    i32 => Int, Int, i32;
    i64 => Long, Long, i64;
    u8 => Short, Short, i16;
    u16 => Int, Int, i32;
    u32 => Long, Long, i64;
}

impl StorageValue for isize {
    fn type_tag() -> TypeTag {
        TypeTag::new::<isize>("isize", TypeKind::Primitive(Scalar::Long), &[])
    }

    fn to_value(&self) -> Value {
        Value::Long(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        let raw = value
            .as_i64()
            .ok_or_else(|| StorageError::mismatch("isize", value.kind_name()))?;
        isize::try_from(raw).map_err(|_| out_of_range(raw, "isize"))
    }
}

// Stored as the two's complement i64 so every value round-trips.
impl StorageValue for u64 {
    fn type_tag() -> TypeTag {
        TypeTag::new::<u64>("u64", TypeKind::Primitive(Scalar::Long), &[])
    }

    fn to_value(&self) -> Value {
        Value::Long(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_i64()
            .map(|raw| raw as u64)
            .ok_or_else(|| StorageError::mismatch("u64", value.kind_name()))
    }
}

impl StorageValue for usize {
    fn type_tag() -> TypeTag {
        TypeTag::new::<usize>("usize", TypeKind::Primitive(Scalar::Long), &[])
    }

    fn to_value(&self) -> Value {
        Value::Long(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        let raw = u64::from_value(value)?;
        usize::try_from(raw).map_err(|_| out_of_range(raw, "usize"))
    }
}

impl StorageValue for bool {
    fn type_tag() -> TypeTag {
        TypeTag::new::<bool>("bool", TypeKind::Primitive(Scalar::Bool), &[])
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| StorageError::mismatch("bool", value.kind_name()))
    }
}

impl StorageValue for f32 {
    fn type_tag() -> TypeTag {
        TypeTag::new::<f32>("f32", TypeKind::Primitive(Scalar::Float), &[])
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(value) => Ok(value),
            other => other
                .as_f64()
                .map(|value| value as f32)
                .ok_or_else(|| StorageError::mismatch("f32", other.kind_name())),
        }
    }
}

impl StorageValue for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::new::<f64>("f64", TypeKind::Primitive(Scalar::Double), &[])
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| StorageError::mismatch("f64", value.kind_name()))
    }
}

impl StorageValue for char {
    fn type_tag() -> TypeTag {
        TypeTag::new::<char>("char", TypeKind::Primitive(Scalar::Char), &[])
    }

    fn to_value(&self) -> Value {
        Value::Char(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(value) => Ok(value),
            Value::String(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(value), None) => Ok(value),
                    _ => Err(StorageError::Conversion(format!(
                        "'{text}' is not a single character"
                    ))),
                }
            }
            other => Err(StorageError::mismatch("char", other.kind_name())),
        }
    }
}

impl StorageValue for String {
    fn type_tag() -> TypeTag {
        TypeTag::new::<String>("String", TypeKind::Class, &[])
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(value) => Ok(value),
            other => Err(StorageError::mismatch("String", other.kind_name())),
        }
    }
}

impl<T: StorageValue> StorageValue for Option<T> {
    fn type_tag() -> TypeTag {
        normalize(&T::type_tag())
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, StorageValue::to_value)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }

    fn merge_value(&mut self, value: &Value) -> Result<bool> {
        match self {
            Some(inner) => inner.merge_value(value),
            None => Ok(false),
        }
    }

    fn describe_shape(keys: &mut Vec<TypeTag>, values: &mut Vec<TypeTag>) {
        T::describe_shape(keys, values);
    }
}

fn list_items<T: StorageValue>(value: Value, container: &str) -> Result<Vec<T>> {
    match value {
        Value::List(items) => items.into_iter().map(T::from_value).collect(),
        other => Err(StorageError::mismatch(container, other.kind_name())),
    }
}

fn map_entries<K: StorageValue, V: StorageValue>(
    value: Value,
    container: &str,
) -> Result<Vec<(K, V)>> {
    match value {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(key, value)| Ok((K::from_value(key)?, V::from_value(value)?)))
            .collect(),
        other => Err(StorageError::mismatch(container, other.kind_name())),
    }
}

macro_rules! sequence_value {
    ($($container:ident [$($bounds:tt)*] => $interface:ident, $insert:ident;)+) => {$(
        impl<T: StorageValue $($bounds)*> StorageValue for $container<T> {
            fn type_tag() -> TypeTag {
                TypeTag::class::<Self>(&[Interface::$interface])
            }

            fn to_value(&self) -> Value {
                Value::List(self.iter().map(StorageValue::to_value).collect())
            }

            fn from_value(value: Value) -> Result<Self> {
                Ok(list_items::<T>(value, stringify!($container))?.into_iter().collect())
            }

            fn merge_value(&mut self, value: &Value) -> Result<bool> {
                if !value.is_list() {
                    return Ok(false);
                }
                for item in list_items::<T>(value.clone(), stringify!($container))? {
                    self.$insert(item);
                }
                Ok(true)
            }

            fn describe_shape(keys: &mut Vec<TypeTag>, values: &mut Vec<TypeTag>) {
                values.push(T::type_tag());
                T::describe_shape(keys, values);
            }
        }
    )+};
}

sequence_value! {
    Vec [] => List, push;
    VecDeque [] => List, push_back;
    HashSet [+ Eq + Hash] => Set, insert;
    BTreeSet [+ Ord] => Set, insert;
}

macro_rules! map_value {
    ($($container:ident<K: $bound:path> => $interface:ident;)+) => {$(
        impl<K, V> StorageValue for $container<K, V>
        where
            K: StorageValue + Eq + $bound,
            V: StorageValue,
        {
            fn type_tag() -> TypeTag {
                TypeTag::class::<Self>(&[Interface::$interface])
            }

            fn to_value(&self) -> Value {
                Value::Map(
                    self.iter()
                        .map(|(key, value)| (key.to_value(), value.to_value()))
                        .collect(),
                )
            }

            fn from_value(value: Value) -> Result<Self> {
                Ok(map_entries::<K, V>(value, stringify!($container))?.into_iter().collect())
            }

            fn merge_value(&mut self, value: &Value) -> Result<bool> {
                if !value.is_map() {
                    return Ok(false);
                }
                self.extend(map_entries::<K, V>(value.clone(), stringify!($container))?);
                Ok(true)
            }

            fn describe_shape(keys: &mut Vec<TypeTag>, values: &mut Vec<TypeTag>) {
                keys.push(K::type_tag());
                values.push(V::type_tag());
                V::describe_shape(keys, values);
            }
        }
    )+};
}

map_value! {
    HashMap<K: Hash> => Map;
    BTreeMap<K: Ord> => SortedMap;
}

impl StorageValue for Value {
    fn type_tag() -> TypeTag {
        TypeTag::object()
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }

    fn merge_value(&mut self, value: &Value) -> Result<bool> {
        match (self, value) {
            (Value::List(items), Value::List(loaded)) => {
                items.extend(loaded.iter().cloned());
                Ok(true)
            }
            (Value::Map(entries), Value::Map(loaded)) => {
                for (key, value) in loaded {
                    match entries.iter_mut().find(|(existing, _)| existing == key) {
                        Some(entry) => entry.1 = value.clone(),
                        None => entries.push((key.clone(), value.clone())),
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Host types carried as [`Object`] values.
macro_rules! object_value {
    ($($ty:ty => $name:literal, |$text:ident| $parse:expr;)+) => {$(
        impl StorageValue for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::new::<$ty>($name, TypeKind::Class, &[])
            }

            fn to_value(&self) -> Value {
                Value::Object(Object::new(self.clone()))
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Object(object) => object
                        .downcast_ref::<$ty>()
                        .cloned()
                        .ok_or_else(|| StorageError::mismatch($name, object.type_tag().name())),
                    Value::String($text) => $parse,
                    other => Err(StorageError::mismatch($name, other.kind_name())),
                }
            }
        }
    )+};
}

object_value! {
    Uuid => "UUID", |text| Uuid::parse_str(&text)
        .map_err(|e| StorageError::Conversion(format!("Invalid UUID '{text}': {e}")));
    IgnoreCase => "IgnoreCase", |text| Ok(IgnoreCase::new(text));
    Location => "Location", |_text| Err(StorageError::mismatch("Location", "String"));
}
