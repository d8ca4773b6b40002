//! Data translators and their registry
//!
//! A [`Translator`] converts between the live value of an attribute and the
//! plain form written to a document. Translators are looked up by declared
//! type through a [`TranslatorRegistry`].

mod builtin;
pub mod number;
mod registry;

pub use registry::TranslatorRegistry;

pub(crate) use builtin::{location_from_map, location_to_map};

use crate::error::Result;
use crate::types::TypeTag;
use crate::value::{StorageValue, Value};
use std::fmt;
use std::sync::Arc;

type SerializeFn = dyn Fn(&Value, &TranslatorRegistry) -> Result<Value> + Send + Sync;
type DeserializeFn = dyn Fn(Value, &TypeTag, &TranslatorRegistry) -> Result<Value> + Send + Sync;

/// A serialize/deserialize pair registered for one type.
#[derive(Clone)]
pub struct Translator {
    tag: TypeTag,
    serialize: Arc<SerializeFn>,
    deserialize: Arc<DeserializeFn>,
}

impl Translator {
    /// Translator whose functions may consult the registry and the target type.
    pub fn new<S, D>(tag: TypeTag, serialize: S, deserialize: D) -> Self
    where
        S: Fn(&Value, &TranslatorRegistry) -> Result<Value> + Send + Sync + 'static,
        D: Fn(Value, &TypeTag, &TranslatorRegistry) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            tag,
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    pub fn simple<S, D>(tag: TypeTag, serialize: S, deserialize: D) -> Self
    where
        S: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
        D: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(
            tag,
            move |value, _| serialize(value),
            move |raw, _, _| deserialize(raw),
        )
    }

    /// Translator for a host type `T`, working on typed values.
    ///
    /// ```
    /// use bedrock_storage::{StorageValue, Translator, Value};
    /// use uuid::Uuid;
    ///
    /// let translator = Translator::typed::<Uuid, _, _>(
    ///     |id| Ok(Value::String(id.simple().to_string())),
    ///     |raw| Uuid::from_value(raw),
    /// );
    /// assert_eq!(translator.tag(), Uuid::type_tag());
    /// ```
    pub fn typed<T, S, D>(serialize: S, deserialize: D) -> Self
    where
        T: StorageValue,
        S: Fn(&T) -> Result<Value> + Send + Sync + 'static,
        D: Fn(Value) -> Result<T> + Send + Sync + 'static,
    {
        Self::simple(
            T::type_tag(),
            move |value| serialize(&T::from_value(value.clone())?),
            move |raw| deserialize(raw).map(|value| value.to_value()),
        )
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn serialize(&self, value: &Value, registry: &TranslatorRegistry) -> Result<Value> {
        (self.serialize)(value, registry)
    }

    pub fn deserialize(
        &self,
        raw: Value,
        tag: &TypeTag,
        registry: &TranslatorRegistry,
    ) -> Result<Value> {
        (self.deserialize)(raw, tag, registry)
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator").field("tag", &self.tag).finish()
    }
}

/// Resolves whether a world with the given name is currently loaded.
pub trait WorldLookup: Send + Sync {
    fn is_loaded(&self, world: &str) -> bool;
}

impl<F> WorldLookup for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_loaded(&self, world: &str) -> bool {
        self(world)
    }
}

/// Treats every world name as loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyWorld;

impl WorldLookup for AnyWorld {
    fn is_loaded(&self, _world: &str) -> bool {
        true
    }
}
