//! Integration tests for translator resolution and custom translators

use bedrock_storage::{
    FieldOptions, FieldScanner, Interface, Result, StorageContainer, StorageData, StorageError,
    StorageValue, Translator, TranslatorRegistry, TypeTag, Value,
};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use util::{IgnoreCase, Location};
use uuid::Uuid;

/// A list of player names stored as one comma separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Whitelist(Vec<String>);

impl StorageValue for Whitelist {
    fn type_tag() -> TypeTag {
        TypeTag::class::<Whitelist>(&[Interface::List])
    }

    fn to_value(&self) -> Value {
        Value::List(self.0.iter().cloned().map(Value::String).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        Vec::<String>::from_value(value).map(Whitelist)
    }
}

fn whitelist_translator() -> Translator {
    Translator::simple(
        Whitelist::type_tag(),
        |value| {
            let names = Whitelist::from_value(value.clone())?;
            Ok(Value::String(names.0.join(",")))
        },
        |raw| match raw {
            Value::String(text) => Ok(Value::List(
                text.split(',')
                    .filter(|name| !name.is_empty())
                    .map(Value::from)
                    .collect(),
            )),
            other => Err(StorageError::Translate(format!("Expected names, found {other}"))),
        },
    )
}

#[test]
fn test_exact_translator_beats_collection() {
    let registry = TranslatorRegistry::new();
    assert_eq!(
        registry.resolve(&Whitelist::type_tag()).unwrap().tag(),
        Interface::Collection.tag()
    );

    registry.register(whitelist_translator());
    assert_eq!(
        registry.resolve(&Whitelist::type_tag()).unwrap().tag(),
        Whitelist::type_tag()
    );
}

#[test]
fn test_category_fallbacks() {
    let registry = TranslatorRegistry::new();

    assert_eq!(
        registry.resolve(&VecDeque::<i32>::type_tag()).unwrap().tag(),
        Interface::Collection.tag()
    );
    assert_eq!(
        registry.resolve(&HashSet::<String>::type_tag()).unwrap().tag(),
        Interface::Collection.tag()
    );
    assert_eq!(
        registry.resolve(&BTreeMap::<String, i32>::type_tag()).unwrap().tag(),
        Interface::Map.tag()
    );
    assert_eq!(
        registry.resolve(&TypeTag::class::<Whitelist>(&[])).unwrap().tag(),
        TypeTag::object()
    );
}

#[test]
fn test_round_trips() {
    let registry = TranslatorRegistry::new();
    let id = Uuid::new_v4();
    let name = IgnoreCase::new("Notch");
    let location = Location::new(Some("nether".to_string()), 1.5, 2.0, 3.0, 45.0, -10.0);

    let back = |value: Value, tag: TypeTag| {
        let serialized = registry.serialize(&value, &tag).unwrap();
        registry.deserialize(serialized, &tag).unwrap()
    };

    assert_eq!(Uuid::from_value(back(id.to_value(), Uuid::type_tag())).unwrap(), id);
    assert_eq!(
        IgnoreCase::from_value(back(name.to_value(), IgnoreCase::type_tag())).unwrap(),
        IgnoreCase::new("NOTCH")
    );
    assert_eq!(
        Location::from_value(back(location.to_value(), Location::type_tag())).unwrap(),
        location
    );
    assert_eq!(back(Value::Int(42), i32::type_tag()), Value::Int(42));
}

#[test]
fn test_unloaded_world_is_dropped() {
    let registry = TranslatorRegistry::with_worlds(Arc::new(|world: &str| world == "world"));
    let spawn = Location::new(Some("world".to_string()), 0.0, 64.0, 0.0, 0.0, 0.0);
    let end = Location::new(Some("the_end".to_string()), 0.0, 64.0, 0.0, 0.0, 0.0);

    let stored = registry.serialize(&end.to_value(), &Location::type_tag()).unwrap();
    assert_eq!(stored.get("world"), None);

    let stored = registry.serialize(&spawn.to_value(), &Location::type_tag()).unwrap();
    let loaded = Location::from_value(registry.deserialize(stored, &Location::type_tag()).unwrap()).unwrap();
    assert_eq!(loaded.world_name(), Some("world"));
}

#[test]
fn test_malformed_uuid_is_a_translation_error() {
    let registry = TranslatorRegistry::new();
    let result = registry.deserialize(Value::from("not-a-uuid"), &Uuid::type_tag());
    assert!(matches!(result, Err(StorageError::Translate(_))));
}

#[derive(Debug, Default)]
struct Server {
    whitelist: Whitelist,
}

impl StorageData for Server {
    fn describe(fields: &mut FieldScanner<Self>) {
        fields.field(
            "whitelist",
            |s| &s.whitelist,
            |s| &mut s.whitelist,
            FieldOptions::new(),
        );
    }
}

#[test]
fn test_container_uses_isolated_registry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.toml");
    let registry = Arc::new(TranslatorRegistry::new());
    registry.register(whitelist_translator());

    let server = Server {
        whitelist: Whitelist(vec!["alice".to_string(), "bob".to_string()]),
    };
    let mut container =
        StorageContainer::with_translators(&path, 1, server, Arc::clone(&registry)).unwrap();
    container.default_load_process();

    assert!(fs::read_to_string(&path).unwrap().contains("whitelist = \"alice,bob\""));
    assert_eq!(container.data().whitelist.0, vec!["alice", "bob"]);

    let global = TranslatorRegistry::global();
    assert_eq!(
        global.resolve(&Whitelist::type_tag()).unwrap().tag(),
        Interface::Collection.tag()
    );
}
