use super::{builtin, AnyWorld, Translator, WorldLookup};
use crate::error::{Result, StorageError};
use crate::types::{implements_interface, normalize, Interface, TypeTag};
use crate::value::Value;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref GLOBAL: Arc<TranslatorRegistry> = Arc::new(TranslatorRegistry::new());
}

/// Maps declared types to translators.
///
/// Translators are keyed by the normalized form of their type. Registration
/// may happen at any time and the last registration for a type wins.
pub struct TranslatorRegistry {
    translators: RwLock<HashMap<TypeId, Arc<Translator>>>,
    worlds: Arc<dyn WorldLookup>,
}

impl TranslatorRegistry {
    /// Registry holding the built-in translators.
    pub fn new() -> Self {
        Self::with_worlds(Arc::new(AnyWorld))
    }

    /// Built-in translators, resolving world names through `worlds`.
    pub fn with_worlds(worlds: Arc<dyn WorldLookup>) -> Self {
        let registry = Self {
            translators: RwLock::new(HashMap::new()),
            worlds,
        };
        builtin::register_defaults(&registry);
        registry
    }

    /// Registry without any translators.
    pub fn empty() -> Self {
        Self {
            translators: RwLock::new(HashMap::new()),
            worlds: Arc::new(AnyWorld),
        }
    }

    /// The process-wide registry shared by containers that do not bring their own.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    pub fn worlds(&self) -> &dyn WorldLookup {
        self.worlds.as_ref()
    }

    pub fn register(&self, translator: Translator) {
        let key = normalize(&translator.tag());
        debug!(target_type = %key, "Registering data translator");
        self.translators.write().insert(key.id(), Arc::new(translator));
    }

    /// Translator registered for exactly this type.
    pub fn get(&self, tag: &TypeTag) -> Option<Arc<Translator>> {
        self.translators.read().get(&normalize(tag).id()).cloned()
    }

    pub fn len(&self) -> usize {
        self.translators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.read().is_empty()
    }

    /// Finds the translator for a declared type.
    ///
    /// An exact match always wins. Otherwise enums use the enum translator,
    /// collections the collection translator, maps the map translator and
    /// everything else the object passthrough.
    pub fn resolve(&self, tag: &TypeTag) -> Result<Arc<Translator>> {
        let tag = normalize(tag);
        if let Some(translator) = self.get(&tag) {
            return Ok(translator);
        }

        let category = if tag.is_enum() {
            TypeTag::any_enum()
        } else if implements_interface(&tag, Interface::Collection) {
            Interface::Collection.tag()
        } else if implements_interface(&tag, Interface::Map) {
            Interface::Map.tag()
        } else {
            TypeTag::object()
        };

        self.get(&category)
            .ok_or_else(|| StorageError::MissingTranslator(tag.name().to_string()))
    }

    pub fn serialize(&self, value: &Value, tag: &TypeTag) -> Result<Value> {
        self.resolve(tag)?.serialize(value, self)
    }

    pub fn deserialize(&self, raw: Value, tag: &TypeTag) -> Result<Value> {
        self.resolve(tag)?.deserialize(raw, tag, self)
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorRegistry")
            .field("translators", &self.len())
            .finish()
    }
}
