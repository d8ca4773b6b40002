//! Translators every registry starts with

use super::{number, Translator, TranslatorRegistry, WorldLookup};
use crate::error::{Result, StorageError};
use crate::types::{Interface, Scalar, TypeTag};
use crate::value::{EnumConstant, StorageValue, Value};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::error;
use util::{IgnoreCase, Location};
use uuid::Uuid;

pub(crate) fn register_defaults(registry: &TranslatorRegistry) {
    registry.register(Translator::simple(
        Scalar::Bool.wrapper(),
        |value| Ok(value.clone()),
        |raw| match raw {
            Value::Bool(_) => Ok(raw),
            other => Err(StorageError::mismatch("Boolean", other.kind_name())),
        },
    ));
    registry.register(numeric(Scalar::Byte, |raw| Value::Byte(number::to_byte(raw))));
    registry.register(numeric(Scalar::Short, |raw| Value::Short(number::to_short(raw))));
    registry.register(numeric(Scalar::Int, |raw| Value::Int(number::to_int(raw))));
    registry.register(numeric(Scalar::Long, |raw| Value::Long(number::to_long(raw))));
    registry.register(numeric(Scalar::Float, |raw| Value::Float(number::to_float(raw))));
    registry.register(numeric(Scalar::Double, |raw| Value::Double(number::to_double(raw))));
    registry.register(Translator::simple(
        Scalar::Char.wrapper(),
        |value| Ok(value.clone()),
        |raw| char::from_value(raw).map(Value::Char),
    ));
    registry.register(Translator::simple(
        String::type_tag(),
        |value| Ok(value.clone()),
        |raw| match raw {
            Value::String(_) => Ok(raw),
            other => Ok(Value::String(other.to_string())),
        },
    ));
    registry.register(Translator::simple(
        IgnoreCase::type_tag(),
        |value| Ok(Value::String(value.to_string())),
        |raw| Ok(IgnoreCase::new(raw.to_string()).to_value()),
    ));
    registry.register(Translator::new(
        Location::type_tag(),
        |value, registry| {
            let location = Location::from_value(value.clone())?;
            Ok(location_to_map(&location, registry.worlds()))
        },
        |raw, _, registry| Ok(location_from_map(&raw, registry.worlds()).to_value()),
    ));
    registry.register(Translator::simple(
        Uuid::type_tag(),
        |value| Ok(Value::String(Uuid::from_value(value.clone())?.to_string())),
        |raw| match raw {
            Value::String(text) => Uuid::parse_str(&text)
                .map(|id| id.to_value())
                .map_err(|e| StorageError::Translate(format!("Invalid UUID string '{text}': {e}"))),
            other => Err(StorageError::mismatch("UUID", other.kind_name())),
        },
    ));
    registry.register(Translator::simple(
        TypeTag::object(),
        |value| Ok(value.clone()),
        |raw| Ok(raw),
    ));
    registry.register(Translator::new(
        TypeTag::any_enum(),
        |value, _| match value {
            Value::Enum(constant) => Ok(Value::String(constant.name().to_string())),
            other => Err(StorageError::mismatch("Enum", other.kind_name())),
        },
        deserialize_enum,
    ));
    registry.register(Translator::new(
        Interface::Collection.tag(),
        serialize_collection,
        |raw, _, _| match raw {
            Value::List(_) => Ok(raw),
            _ => Ok(Value::List(Vec::new())),
        },
    ));
    registry.register(Translator::new(
        Interface::Map.tag(),
        serialize_map,
        |raw, _, _| match raw {
            Value::Map(_) => Ok(raw),
            _ => Ok(Value::Map(Vec::new())),
        },
    ));
    registry.register(Translator::simple(
        Interface::Serializable.tag(),
        |value| Ok(encode_binary(value)),
        |raw| Ok(decode_binary(raw)),
    ));
}

fn numeric(scalar: Scalar, coerce: fn(&Value) -> Value) -> Translator {
    Translator::simple(scalar.wrapper(), |value| Ok(value.clone()), move |raw| Ok(coerce(&raw)))
}

/// Resolves a constant of the target enum by name, ignoring case.
fn deserialize_enum(raw: Value, tag: &TypeTag, _: &TranslatorRegistry) -> Result<Value> {
    let Some(constants) = tag.constants() else {
        return Ok(Value::Null);
    };
    let name = match raw {
        Value::Enum(constant) if constant.tag() == *tag => return Ok(Value::Enum(constant)),
        Value::String(name) => name,
        other => other.to_string(),
    };
    Ok(constants
        .iter()
        .enumerate()
        .find(|(_, constant)| constant.eq_ignore_ascii_case(&name))
        .map_or(Value::Null, |(ordinal, constant)| {
            Value::Enum(EnumConstant::new(*tag, ordinal, *constant))
        }))
}

fn serialize_collection(value: &Value, registry: &TranslatorRegistry) -> Result<Value> {
    let items = match value {
        Value::List(items) => items,
        other => return Err(StorageError::mismatch("Collection", other.kind_name())),
    };
    if items.is_empty() {
        return Ok(Value::List(Vec::new()));
    }
    let mut serialized = Vec::with_capacity(items.len());
    for item in items.iter().filter(|item| !item.is_null()) {
        serialized.push(registry.serialize(item, &item.runtime_type())?);
    }
    Ok(Value::List(serialized))
}

fn serialize_map(value: &Value, registry: &TranslatorRegistry) -> Result<Value> {
    let entries = match value {
        Value::Map(entries) => entries,
        other => return Err(StorageError::mismatch("Map", other.kind_name())),
    };
    if entries.is_empty() {
        return Ok(Value::Map(Vec::new()));
    }
    let mut serialized = Vec::with_capacity(entries.len());
    for (key, value) in entries.iter().filter(|(_, value)| !value.is_null()) {
        serialized.push((
            registry.serialize(key, &key.runtime_type())?,
            registry.serialize(value, &value.runtime_type())?,
        ));
    }
    Ok(Value::Map(serialized))
}

fn encode_binary(value: &Value) -> Value {
    match rmp_serde::to_vec(value) {
        Ok(bytes) => Value::Bytes(bytes),
        Err(e) => {
            error!(error = %e, "Failed to encode serializable value");
            Value::Null
        }
    }
}

/// Accepts raw bytes, or base64 text as written by text documents.
fn decode_binary(raw: Value) -> Value {
    let bytes = match raw {
        Value::Bytes(bytes) => bytes,
        Value::String(text) => match STANDARD.decode(text.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, "Failed to decode serialized value");
                return Value::Null;
            }
        },
        other => {
            error!(found = other.kind_name(), "Serialized value is not binary");
            return Value::Null;
        }
    };
    match rmp_serde::from_slice::<Value>(&bytes) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "Failed to decode serialized value");
            Value::Null
        }
    }
}

/// Flat map form of a location. The world is omitted when it is not loaded.
pub(crate) fn location_to_map(location: &Location, worlds: &dyn WorldLookup) -> Value {
    let mut entries = Vec::with_capacity(6);
    if let Some(world) = location.world_name().filter(|world| worlds.is_loaded(world)) {
        entries.push(("world", Value::from(world)));
    }
    entries.push(("x", Value::Double(location.x)));
    entries.push(("y", Value::Double(location.y)));
    entries.push(("z", Value::Double(location.z)));
    entries.push(("yaw", Value::Float(location.yaw)));
    entries.push(("pitch", Value::Float(location.pitch)));
    Value::map_of(entries)
}

/// Missing coordinates read as zero. An unloaded world is dropped.
pub(crate) fn location_from_map(raw: &Value, worlds: &dyn WorldLookup) -> Location {
    let world = raw
        .get("world")
        .map(Value::to_string)
        .filter(|world| worlds.is_loaded(world));
    let coordinate = |key: &str| raw.get(key).map_or(0.0, number::to_double);
    let angle = |key: &str| raw.get(key).map_or(0.0, number::to_float);

    Location::new(
        world,
        coordinate("x"),
        coordinate("y"),
        coordinate("z"),
        angle("yaw"),
        angle("pitch"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    crate::storage_enum! {
        enum Difficulty {
            Peaceful,
            Easy,
            Hard,
        }
    }

    fn round_trip<T: StorageValue>(registry: &TranslatorRegistry, value: &T) -> T {
        let serialized = registry.serialize(&value.to_value(), &T::type_tag()).unwrap();
        let deserialized = registry.deserialize(serialized, &T::type_tag()).unwrap();
        T::from_value(deserialized).unwrap()
    }

    #[test]
    fn test_numeric_coercion() {
        let registry = TranslatorRegistry::new();
        let value = registry.deserialize(Value::Long(5), &i32::type_tag()).unwrap();
        assert_eq!(value, Value::Int(5));

        let value = registry.deserialize(Value::from("2.5"), &f64::type_tag()).unwrap();
        assert_eq!(value, Value::Double(2.5));
    }

    #[test]
    fn test_boolean_requires_bool() {
        let registry = TranslatorRegistry::new();
        assert!(registry.deserialize(Value::Int(1), &bool::type_tag()).is_err());
    }

    #[test]
    fn test_string_uses_text_form() {
        let registry = TranslatorRegistry::new();
        let value = registry.deserialize(Value::Int(12), &String::type_tag()).unwrap();
        assert_eq!(value, Value::from("12"));
    }

    #[test]
    fn test_uuid_round_trip() {
        let registry = TranslatorRegistry::new();
        let id = Uuid::new_v4();

        let serialized = registry.serialize(&id.to_value(), &Uuid::type_tag()).unwrap();
        assert_eq!(serialized, Value::String(id.to_string()));
        assert_eq!(round_trip(&registry, &id), id);
    }

    #[test]
    fn test_malformed_uuid() {
        let registry = TranslatorRegistry::new();
        let result = registry.deserialize(Value::from("zzzz"), &Uuid::type_tag());
        assert!(matches!(result, Err(StorageError::Translate(_))));
    }

    #[test]
    fn test_ignore_case_round_trip() {
        let registry = TranslatorRegistry::new();
        let value = IgnoreCase::new("SomeName");

        let restored = round_trip(&registry, &value);
        assert_eq!(restored, IgnoreCase::new("somename"));
        assert_eq!(restored.as_str(), "SomeName");
    }

    #[test]
    fn test_enum_round_trip() {
        let registry = TranslatorRegistry::new();
        let serialized = registry
            .serialize(&Difficulty::Hard.to_value(), &Difficulty::type_tag())
            .unwrap();

        assert_eq!(serialized, Value::from("Hard"));
        assert_eq!(round_trip(&registry, &Difficulty::Easy), Difficulty::Easy);
    }

    #[test]
    fn test_unknown_enum_name_is_null() {
        let registry = TranslatorRegistry::new();
        let value = registry
            .deserialize(Value::from("nightmare"), &Difficulty::type_tag())
            .unwrap();
        assert!(value.is_null());

        let value = registry.deserialize(Value::from("PEACEFUL"), &Difficulty::type_tag()).unwrap();
        assert_eq!(value, Difficulty::Peaceful.to_value());
    }

    #[test]
    fn test_location_drops_unloaded_world() {
        let registry = TranslatorRegistry::with_worlds(Arc::new(|world: &str| world == "world"));

        let loaded = Location::new(Some("world".into()), 1.5, 64.0, -3.0, 90.0, 0.0);
        assert_eq!(round_trip(&registry, &loaded), loaded);

        let unloaded = Location::at("nether", 1.0, 2.0, 3.0);
        let serialized = registry.serialize(&unloaded.to_value(), &Location::type_tag()).unwrap();
        assert_eq!(serialized.get("world"), None);

        let raw = Value::map_of([("world", Value::from("nether")), ("x", Value::Int(4))]);
        let restored = Location::from_value(registry.deserialize(raw, &Location::type_tag()).unwrap()).unwrap();
        assert_eq!(restored, Location::new(None, 4.0, 0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_collection_serializes_elements_by_runtime_type() {
        let registry = TranslatorRegistry::new();
        let id = Uuid::new_v4();
        let list = Value::List(vec![id.to_value(), Value::Null, Difficulty::Easy.to_value()]);

        let serialized = registry.serialize(&list, &Vec::<Value>::type_tag()).unwrap();
        assert_eq!(
            serialized,
            Value::List(vec![Value::String(id.to_string()), Value::from("Easy")])
        );
    }

    #[test]
    fn test_collection_deserialize_non_list_is_empty() {
        let registry = TranslatorRegistry::new();
        let value = registry.deserialize(Value::from("x"), &Vec::<i32>::type_tag()).unwrap();
        assert_eq!(value, Value::List(Vec::new()));
    }

    #[test]
    fn test_map_skips_null_values() {
        let registry = TranslatorRegistry::new();
        let map = Value::map_of([("a", Value::Int(1)), ("b", Value::Null)]);

        let serialized = registry
            .serialize(&map, &HashMap::<String, i32>::type_tag())
            .unwrap();
        assert_eq!(serialized, Value::map_of([("a", Value::Int(1))]));
    }

    #[test]
    fn test_serializable_round_trip() {
        let registry = TranslatorRegistry::new();
        let tag = Interface::Serializable.tag();
        let value = Value::map_of([("scores", Value::List(vec![Value::Int(3), Value::Double(1.5)]))]);

        let encoded = registry.serialize(&value, &tag).unwrap();
        assert!(matches!(encoded, Value::Bytes(_)));
        assert_eq!(registry.deserialize(encoded, &tag).unwrap(), value);
    }

    #[test]
    fn test_serializable_accepts_base64_text() {
        let registry = TranslatorRegistry::new();
        let tag = Interface::Serializable.tag();
        let bytes = match registry.serialize(&Value::Long(9), &tag).unwrap() {
            Value::Bytes(bytes) => bytes,
            other => panic!("unexpected {other:?}"),
        };

        let decoded = registry.deserialize(Value::String(STANDARD.encode(bytes)), &tag).unwrap();
        assert_eq!(decoded, Value::Long(9));
        assert!(registry.deserialize(Value::from("%%%"), &tag).unwrap().is_null());
    }

    #[test]
    fn test_serializable_swallows_unencodable_values() {
        let registry = TranslatorRegistry::new();
        let encoded = registry
            .serialize(&Uuid::nil().to_value(), &Interface::Serializable.tag())
            .unwrap();
        assert!(encoded.is_null());
    }
}
