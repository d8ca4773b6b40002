//! Persisted attribute descriptors
//!
//! A [`StorageField`] binds one attribute of a container to a path in the
//! document. It seeds missing paths with the attribute's initial value,
//! loads stored values back through the translator registry and writes
//! changed values on save.

use crate::document::{Document, PATH_SEPARATOR};
use crate::error::{Result, StorageError};
use crate::translator::TranslatorRegistry;
use crate::types::{implements_interface, normalize, zero_value, Interface, TypeTag};
use crate::value::{StorageValue, Value};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A path containing this marker stores the field directly at its sub path.
pub const SUB_PATH_MARKER: char = '#';

/// How null values are treated on load and save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Nullability {
    /// Nulls are loaded as the zero value of the type and saved as-is.
    #[default]
    Load,
    /// Nulls are skipped without notice.
    Ignore,
    /// Nulls are skipped and reported.
    Forbid,
}

/// When a field is written back to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaveSetting {
    Always,
    /// Only when the value differs from what was loaded.
    #[default]
    Changes,
    None,
}

/// Registration options of a field.
#[derive(Debug, Clone)]
pub struct FieldOptions {
    path: Option<String>,
    declared_type: Option<TypeTag>,
    key_types: Option<Vec<TypeTag>>,
    value_types: Option<Vec<TypeTag>>,
    initialize: bool,
    log: bool,
    debug: bool,
    nullability: Nullability,
    forbidden_null_message: Option<String>,
    save: SaveSetting,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            path: None,
            declared_type: None,
            key_types: None,
            value_types: None,
            initialize: true,
            log: false,
            debug: false,
            nullability: Nullability::default(),
            forbidden_null_message: None,
            save: SaveSetting::default(),
        }
    }
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path relative to the enclosing sub path. Defaults to the field name.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Type used to pick the translator instead of the attribute's own type.
    pub fn declared_type(mut self, tag: TypeTag) -> Self {
        self.declared_type = Some(tag);
        self
    }

    /// Map key types by nesting level. Inferred from the attribute when unset.
    pub fn key_types(mut self, tags: impl IntoIterator<Item = TypeTag>) -> Self {
        self.key_types = Some(tags.into_iter().collect());
        self
    }

    /// Element and map value types by nesting level. Inferred when unset.
    pub fn value_types(mut self, tags: impl IntoIterator<Item = TypeTag>) -> Self {
        self.value_types = Some(tags.into_iter().collect());
        self
    }

    /// Whether a missing path is seeded with the initial value.
    pub fn initialize(mut self, initialize: bool) -> Self {
        self.initialize = initialize;
        self
    }

    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn nullability(mut self, nullability: Nullability) -> Self {
        self.nullability = nullability;
        self
    }

    pub fn forbidden_null_message(mut self, message: impl Into<String>) -> Self {
        self.forbidden_null_message = Some(message.into());
        self
    }

    pub fn save(mut self, save: SaveSetting) -> Self {
        self.save = save;
        self
    }
}

/// What [`StorageField::load`] did with the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Assigned,
    /// Loaded entries were merged into the live collection or map.
    Merged,
    /// The value was null and the attribute was left untouched.
    Skipped,
}

/// What [`StorageField::save`] did with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    Unchanged,
    Skipped,
}

/// Reads and writes one attribute of a container.
pub trait FieldAccess<C>: Send + Sync {
    fn read(&self, container: &C) -> Value;

    fn write(&self, container: &mut C, value: Value) -> Result<()>;

    fn merge(&self, container: &mut C, value: &Value) -> Result<bool>;
}

struct Accessor<C, F> {
    get: Box<dyn Fn(&C) -> &F + Send + Sync>,
    get_mut: Box<dyn Fn(&mut C) -> &mut F + Send + Sync>,
}

impl<C, F: StorageValue> FieldAccess<C> for Accessor<C, F> {
    fn read(&self, container: &C) -> Value {
        (self.get)(container).to_value()
    }

    fn write(&self, container: &mut C, value: Value) -> Result<()> {
        *(self.get_mut)(container) = F::from_value(value)?;
        Ok(())
    }

    fn merge(&self, container: &mut C, value: &Value) -> Result<bool> {
        (self.get_mut)(container).merge_value(value)
    }
}

/// Access to a field of a nested container through its parent.
struct Projected<P, C> {
    get: Arc<dyn Fn(&P) -> &C + Send + Sync>,
    get_mut: Arc<dyn Fn(&mut P) -> &mut C + Send + Sync>,
    inner: Box<dyn FieldAccess<C>>,
}

impl<P, C> FieldAccess<P> for Projected<P, C> {
    fn read(&self, container: &P) -> Value {
        self.inner.read((self.get)(container))
    }

    fn write(&self, container: &mut P, value: Value) -> Result<()> {
        self.inner.write((self.get_mut)(container), value)
    }

    fn merge(&self, container: &mut P, value: &Value) -> Result<bool> {
        self.inner.merge((self.get_mut)(container), value)
    }
}

/// Joins a sub path and a relative path with the path separator.
pub(crate) fn join_path(sub_path: &str, path: &str) -> String {
    let sub_path = sub_path.trim_end_matches(PATH_SEPARATOR);
    match (sub_path.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => sub_path.to_string(),
        (false, false) => format!("{sub_path}{PATH_SEPARATOR}{path}"),
    }
}

fn final_path(sub_path: &str, name: &str, path: Option<&str>) -> Result<String> {
    let path = path.unwrap_or_default();
    let resolved = if path.contains(SUB_PATH_MARKER) {
        let sub_path = sub_path.trim_end_matches(PATH_SEPARATOR);
        if sub_path.is_empty() {
            return Err(StorageError::InvalidPath(format!(
                "Illegal character '{SUB_PATH_MARKER}' found in path of '{name}'"
            )));
        }
        sub_path.to_string()
    } else {
        join_path(sub_path, if path.is_empty() { name } else { path })
    };

    if resolved.is_empty() || resolved.split(PATH_SEPARATOR).any(str::is_empty) {
        return Err(StorageError::InvalidPath(format!(
            "'{resolved}' is not a valid path for '{name}'"
        )));
    }
    Ok(resolved)
}

/// Descriptor of one persisted attribute of a container `C`.
pub struct StorageField<C> {
    name: String,
    path: String,
    declared_type: TypeTag,
    key_types: Vec<TypeTag>,
    value_types: Vec<TypeTag>,
    initialize: bool,
    log: bool,
    debug: bool,
    nullability: Nullability,
    forbidden_null_message: String,
    save: SaveSetting,
    access: Box<dyn FieldAccess<C>>,
    initial_value: Option<Value>,
    loaded_hash: Option<u64>,
}

impl<C: 'static> StorageField<C> {
    /// Builds the descriptor of attribute `name` of type `F`.
    ///
    /// Fails when the path cannot be resolved, for example when it contains
    /// the sub path marker outside of a nested container.
    pub fn new<F, G, M>(
        name: &str,
        sub_path: &str,
        get: G,
        get_mut: M,
        options: FieldOptions,
    ) -> Result<Self>
    where
        F: StorageValue,
        G: Fn(&C) -> &F + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut F + Send + Sync + 'static,
    {
        let path = final_path(sub_path, name, options.path.as_deref())?;
        let declared_type = normalize(&options.declared_type.unwrap_or_else(F::type_tag));

        let (key_types, value_types) = match (options.key_types, options.value_types) {
            (Some(keys), Some(values)) => (keys, values),
            (keys, values) => {
                let mut inferred_keys = Vec::new();
                let mut inferred_values = Vec::new();
                F::describe_shape(&mut inferred_keys, &mut inferred_values);
                (
                    keys.unwrap_or(inferred_keys),
                    values.unwrap_or(inferred_values),
                )
            }
        };

        let forbidden_null_message = options
            .forbidden_null_message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Illegal null value at '{path}' was found"));

        Ok(Self {
            name: name.to_string(),
            path,
            declared_type,
            key_types,
            value_types,
            initialize: options.initialize,
            log: options.log,
            debug: options.debug,
            nullability: options.nullability,
            forbidden_null_message,
            save: options.save,
            access: Box::new(Accessor {
                get: Box::new(get),
                get_mut: Box::new(get_mut),
            }),
            initial_value: None,
            loaded_hash: None,
        })
    }

    /// Rebinds this field of a nested container to its parent `P`.
    pub(crate) fn project<P: 'static>(
        self,
        get: Arc<dyn Fn(&P) -> &C + Send + Sync>,
        get_mut: Arc<dyn Fn(&mut P) -> &mut C + Send + Sync>,
    ) -> StorageField<P> {
        StorageField {
            name: self.name,
            path: self.path,
            declared_type: self.declared_type,
            key_types: self.key_types,
            value_types: self.value_types,
            initialize: self.initialize,
            log: self.log,
            debug: self.debug,
            nullability: self.nullability,
            forbidden_null_message: self.forbidden_null_message,
            save: self.save,
            access: Box::new(Projected {
                get,
                get_mut,
                inner: self.access,
            }),
            initial_value: self.initial_value,
            loaded_hash: self.loaded_hash,
        }
    }
}

impl<C> StorageField<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn declared_type(&self) -> TypeTag {
        self.declared_type
    }

    pub fn key_types(&self) -> &[TypeTag] {
        &self.key_types
    }

    pub fn value_types(&self) -> &[TypeTag] {
        &self.value_types
    }

    pub fn initialize_on_missing(&self) -> bool {
        self.initialize
    }

    pub fn is_logged(&self) -> bool {
        self.log
    }

    pub fn is_debugged(&self) -> bool {
        self.debug
    }

    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    pub fn forbidden_null_message(&self) -> &str {
        &self.forbidden_null_message
    }

    pub fn save_setting(&self) -> SaveSetting {
        self.save
    }

    /// Value captured before the first load.
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial_value.as_ref()
    }

    /// Hash of the value last loaded or written.
    pub fn loaded_hash(&self) -> Option<u64> {
        self.loaded_hash
    }

    pub fn capture_initial_value(&mut self, container: &C) {
        self.initial_value = Some(self.access.read(container));
    }

    /// Writes the initial value at the path unless something is stored there.
    ///
    /// Returns whether the document was written.
    pub fn seed_if_missing(
        &self,
        document: &mut Document,
        registry: &TranslatorRegistry,
    ) -> Result<bool> {
        if !self.initialize {
            return Ok(false);
        }
        self.trace(|| format!("Initializing value '{}'...", self.path));

        let initial = self.initial_value.clone().unwrap_or_default();
        self.verbose(|| format!("Initializing value '{}' at '{}'...", initial, self.path));

        if document.contains(&self.path) {
            self.verbose(|| format!("Won't initialize value '{}': Already present", self.path));
            return Ok(false);
        }
        let serialized = self.serialize(&initial, registry)?;
        if serialized.is_null() {
            return Ok(false);
        }
        document.set(&self.path, serialized)?;
        Ok(true)
    }

    pub fn serialize(&self, value: &Value, registry: &TranslatorRegistry) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        registry.serialize(value, &self.declared_type)
    }

    /// Translates a raw value of type `tag`, descending into collections
    /// and maps with the key and value types of the matching nesting level.
    ///
    /// Map values advance both depths, so the key type of a map nested in a
    /// map value is read one level further. Levels beyond the declared types
    /// are handled as plain objects.
    pub fn deserialize(
        &self,
        raw: Value,
        tag: &TypeTag,
        key_depth: usize,
        value_depth: usize,
        registry: &TranslatorRegistry,
    ) -> Result<Value> {
        let deserialized = registry.deserialize(raw, tag)?;
        let value_type = self.nested_type(&self.value_types, value_depth);

        match deserialized {
            Value::List(items) if !items.is_empty() => items
                .into_iter()
                .map(|item| self.deserialize(item, &value_type, key_depth, value_depth + 1, registry))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(entries) if !entries.is_empty() => {
                let key_type = self.nested_type(&self.key_types, key_depth);
                entries
                    .into_iter()
                    .map(|(key, value)| {
                        Ok((
                            self.deserialize(key, &key_type, key_depth + 1, value_depth, registry)?,
                            self.deserialize(value, &value_type, key_depth + 1, value_depth + 1, registry)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Map)
            }
            other => Ok(other),
        }
    }

    fn nested_type(&self, tags: &[TypeTag], depth: usize) -> TypeTag {
        tags.get(depth).copied().unwrap_or_else(TypeTag::object)
    }

    /// Loads the stored value into the attribute.
    ///
    /// Translation failures are logged and handled like a null value.
    /// Failures to assign the attribute are returned.
    pub fn load(
        &mut self,
        container: &mut C,
        document: &Document,
        registry: &TranslatorRegistry,
    ) -> Result<LoadOutcome> {
        let raw = document.get(&self.path).cloned().unwrap_or_default();
        let mut value = if raw.is_null() {
            Value::Null
        } else {
            match self.deserialize(raw, &self.declared_type, 0, 0, registry) {
                Ok(value) => value,
                Err(StorageError::MissingTranslator(name)) => {
                    warn!(path = %self.path, "No data translator for {} found", name);
                    Value::Null
                }
                Err(e) => {
                    error!(path = %self.path, error = %e, "Failed to deserialize stored value");
                    Value::Null
                }
            }
        };

        if value.is_null() {
            match self.nullability {
                Nullability::Forbid => {
                    warn!(path = %self.path, "{}", self.forbidden_null_message);
                    self.verbose(|| format!("Won't load value '{}': Null value", self.path));
                    return Ok(LoadOutcome::Skipped);
                }
                Nullability::Ignore => {
                    self.verbose(|| format!("Won't load value '{}': Null value", self.path));
                    return Ok(LoadOutcome::Skipped);
                }
                Nullability::Load => {
                    value = zero_value(&self.declared_type).unwrap_or_default();
                }
            }
        }

        let hash = self.value_hash(&value);

        let live_container = self
            .initial_value
            .as_ref()
            .is_some_and(|initial| initial.same_container_kind(&value));
        if live_container && self.access.merge(container, &value)? {
            self.verbose(|| format!("Loading value '{}' from '{}'...", value, self.path));
            self.loaded_hash = Some(hash);
            return Ok(LoadOutcome::Merged);
        }

        self.trace(|| format!("Loading value '{}'...", self.path));
        self.verbose(|| format!("Loading value '{}' from '{}'...", value, self.path));
        self.access.write(container, value)?;
        self.loaded_hash = Some(hash);
        Ok(LoadOutcome::Assigned)
    }

    /// Writes the attribute back to the document according to the save setting.
    pub fn save(
        &mut self,
        container: &C,
        document: &mut Document,
        registry: &TranslatorRegistry,
    ) -> Result<SaveOutcome> {
        if self.save == SaveSetting::None {
            return Ok(SaveOutcome::Skipped);
        }
        let value = self.access.read(container);
        let hash = self.value_hash(&value);
        if self.save == SaveSetting::Changes && self.loaded_hash == Some(hash) {
            self.verbose(|| format!("Won't save value '{}': No changes found", self.path));
            return Ok(SaveOutcome::Unchanged);
        }
        if value.is_null()
            && matches!(self.nullability, Nullability::Ignore | Nullability::Forbid)
        {
            self.verbose(|| format!("Won't save value '{}': Null value", self.path));
            return Ok(SaveOutcome::Skipped);
        }

        let serialized = self.serialize(&value, registry)?;
        self.trace(|| format!("Saving value '{}'...", self.path));
        self.verbose(|| format!("Saving value '{}' at '{}'...", serialized, self.path));
        document.set(&self.path, serialized)?;
        self.loaded_hash = Some(hash);
        Ok(SaveOutcome::Written)
    }

    /// Hash of a value of this field. Elements of sets and entries of maps
    /// are hashed regardless of their order.
    pub fn value_hash(&self, value: &Value) -> u64 {
        self.shape_hash(value, &self.declared_type, 0)
    }

    fn shape_hash(&self, value: &Value, tag: &TypeTag, value_depth: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        let nested = self.nested_type(&self.value_types, value_depth);
        match value {
            Value::List(items) => {
                let hashes = items
                    .iter()
                    .map(|item| self.shape_hash(item, &nested, value_depth + 1));
                if implements_interface(tag, Interface::Set) {
                    ("set", items.len(), hashes.fold(0u64, u64::wrapping_add)).hash(&mut hasher);
                } else {
                    ("list", hashes.collect::<Vec<_>>()).hash(&mut hasher);
                }
            }
            Value::Map(entries) => {
                let sum = entries.iter().fold(0u64, |acc, (key, value)| {
                    let mut entry = DefaultHasher::new();
                    key.hash(&mut entry);
                    self.shape_hash(value, &nested, value_depth + 1).hash(&mut entry);
                    acc.wrapping_add(entry.finish())
                });
                ("map", entries.len(), sum).hash(&mut hasher);
            }
            other => other.hash(&mut hasher),
        }
        hasher.finish()
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.log {
            info!("{}", message());
        }
    }

    fn verbose(&self, message: impl FnOnce() -> String) {
        if self.debug {
            info!("{}", message());
        }
    }
}

impl<C> fmt::Debug for StorageField<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageField")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("declared_type", &self.declared_type)
            .field("nullability", &self.nullability)
            .field("save", &self.save)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scalar;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct Settings {
        retries: i32,
        motd: Option<String>,
        users: HashMap<String, i32>,
        groups: HashMap<String, Vec<i32>>,
        tags: Vec<String>,
        banned: HashSet<String>,
        scores: HashMap<String, HashMap<i32, String>>,
    }

    fn banned() -> StorageField<Settings> {
        StorageField::new(
            "banned",
            "",
            |s: &Settings| &s.banned,
            |s: &mut Settings| &mut s.banned,
            FieldOptions::new(),
        )
        .unwrap()
    }

    fn scores() -> StorageField<Settings> {
        StorageField::new(
            "scores",
            "",
            |s: &Settings| &s.scores,
            |s: &mut Settings| &mut s.scores,
            FieldOptions::new(),
        )
        .unwrap()
    }

    fn retries(options: FieldOptions) -> StorageField<Settings> {
        StorageField::new("retries", "", |s: &Settings| &s.retries, |s: &mut Settings| &mut s.retries, options)
            .unwrap()
    }

    #[test]
    fn test_path_defaults_to_name() {
        let field = retries(FieldOptions::new());
        assert_eq!(field.path(), "retries");
        assert_eq!(field.declared_type(), Scalar::Int.wrapper());
        assert_eq!(field.forbidden_null_message(), "Illegal null value at 'retries' was found");
    }

    #[test]
    fn test_final_path() {
        assert_eq!(final_path("", "retries", Some("net.retries")).unwrap(), "net.retries");
        assert_eq!(final_path("net", "retries", None).unwrap(), "net.retries");
        assert_eq!(final_path("net.", "retries", None).unwrap(), "net.retries");
        assert_eq!(final_path("net", "limits", Some("#")).unwrap(), "net");
        assert!(matches!(
            final_path("", "limits", Some("#")),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(final_path("", "x", Some("a..b")).is_err());
    }

    #[test]
    fn test_shape_is_inferred() {
        let field: StorageField<Settings> = StorageField::new(
            "groups",
            "",
            |s: &Settings| &s.groups,
            |s: &mut Settings| &mut s.groups,
            FieldOptions::new(),
        )
        .unwrap();

        assert_eq!(field.key_types(), &[String::type_tag()]);
        assert_eq!(field.value_types(), &[Vec::<i32>::type_tag(), i32::type_tag()]);
    }

    #[test]
    fn test_nested_deserialize_keeps_element_types() {
        let registry = TranslatorRegistry::new();
        let field: StorageField<Settings> = StorageField::new(
            "groups",
            "",
            |s: &Settings| &s.groups,
            |s: &mut Settings| &mut s.groups,
            FieldOptions::new(),
        )
        .unwrap();
        let raw = Value::map_of([
            ("a", Value::List(vec![Value::Long(1), Value::from("2")])),
            ("b", Value::List(Vec::new())),
        ]);

        let value = field
            .deserialize(raw, &field.declared_type(), 0, 0, &registry)
            .unwrap();
        assert_eq!(
            value,
            Value::map_of([
                ("a", Value::List(vec![Value::Int(1), Value::Int(2)])),
                ("b", Value::List(Vec::new())),
            ])
        );
    }

    #[test]
    fn test_nested_map_keys_use_their_own_type() {
        let registry = TranslatorRegistry::new();
        let field = scores();
        assert_eq!(field.key_types(), &[String::type_tag(), i32::type_tag()]);

        let raw = Value::map_of([("alice", Value::map_of([("1", Value::from("x"))]))]);
        let value = field
            .deserialize(raw, &field.declared_type(), 0, 0, &registry)
            .unwrap();
        assert_eq!(
            value,
            Value::map_of([("alice", Value::Map(vec![(Value::Int(1), Value::from("x"))]))])
        );
    }

    #[test]
    fn test_set_hash_ignores_order() {
        let field = banned();
        let a = Value::List(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        let b = Value::List(vec![Value::from("c"), Value::from("a"), Value::from("b")]);
        assert_eq!(field.value_hash(&a), field.value_hash(&b));

        let c = Value::List(vec![Value::from("a"), Value::from("b")]);
        assert_ne!(field.value_hash(&a), field.value_hash(&c));

        let tags: StorageField<Settings> = StorageField::new(
            "tags",
            "",
            |s: &Settings| &s.tags,
            |s: &mut Settings| &mut s.tags,
            FieldOptions::new(),
        )
        .unwrap();
        assert_ne!(tags.value_hash(&a), tags.value_hash(&b));
    }

    #[test]
    fn test_loaded_set_is_unchanged_on_save() {
        let registry = TranslatorRegistry::new();
        let mut document = Document::new();
        let names: Vec<Value> = ["a", "b", "c", "d", "e", "f"].into_iter().map(Value::from).collect();
        document.set("banned", Value::List(names)).unwrap();
        let mut settings = Settings::default();
        let mut field = banned();
        field.capture_initial_value(&settings);

        assert_eq!(
            field.load(&mut settings, &document, &registry).unwrap(),
            LoadOutcome::Merged
        );
        assert_eq!(
            field.save(&settings, &mut document, &registry).unwrap(),
            SaveOutcome::Unchanged
        );
    }

    #[test]
    fn test_failed_assignment_records_no_hash() {
        let registry = TranslatorRegistry::new();
        let mut document = Document::new();
        document
            .set("scores", Value::map_of([("alice", Value::from("not a map"))]))
            .unwrap();
        let mut settings = Settings::default();
        let mut field = scores();

        assert!(field.load(&mut settings, &document, &registry).is_err());
        assert_eq!(field.loaded_hash(), None);
    }

    #[test]
    fn test_seed_never_overwrites() {
        let registry = TranslatorRegistry::new();
        let mut document = Document::new();
        document.set("retries", Value::Int(9)).unwrap();

        let mut field = retries(FieldOptions::new());
        field.capture_initial_value(&Settings::default());

        assert!(!field.seed_if_missing(&mut document, &registry).unwrap());
        assert_eq!(document.get("retries"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_seed_disabled() {
        let registry = TranslatorRegistry::new();
        let mut document = Document::new();
        let mut field = retries(FieldOptions::new().initialize(false));
        field.capture_initial_value(&Settings::default());

        assert!(!field.seed_if_missing(&mut document, &registry).unwrap());
        assert!(!document.contains("retries"));
    }

    #[test]
    fn test_load_null_substitutes_zero() {
        let registry = TranslatorRegistry::new();
        let mut settings = Settings {
            retries: 5,
            ..Settings::default()
        };
        let mut field = retries(FieldOptions::new());

        let outcome = field.load(&mut settings, &Document::new(), &registry).unwrap();
        assert_eq!(outcome, LoadOutcome::Assigned);
        assert_eq!(settings.retries, 0);
    }

    #[test]
    fn test_load_ignore_keeps_attribute() {
        let registry = TranslatorRegistry::new();
        let mut settings = Settings {
            retries: 5,
            ..Settings::default()
        };
        let mut field = retries(FieldOptions::new().nullability(Nullability::Ignore));

        let outcome = field.load(&mut settings, &Document::new(), &registry).unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped);
        assert_eq!(settings.retries, 5);
        assert_eq!(field.loaded_hash(), None);
    }

    #[test]
    fn test_load_merges_into_live_collection() {
        let registry = TranslatorRegistry::new();
        let mut settings = Settings {
            tags: vec!["default".to_string()],
            ..Settings::default()
        };
        let mut document = Document::new();
        document
            .set("tags", Value::List(vec![Value::from("extra")]))
            .unwrap();
        let mut field: StorageField<Settings> = StorageField::new(
            "tags",
            "",
            |s: &Settings| &s.tags,
            |s: &mut Settings| &mut s.tags,
            FieldOptions::new(),
        )
        .unwrap();
        field.capture_initial_value(&settings);

        let outcome = field.load(&mut settings, &document, &registry).unwrap();
        assert_eq!(outcome, LoadOutcome::Merged);
        assert_eq!(settings.tags, vec!["default", "extra"]);
    }

    #[test]
    fn test_option_null_loads_none() {
        let registry = TranslatorRegistry::new();
        let mut settings = Settings {
            motd: Some("hi".to_string()),
            ..Settings::default()
        };
        let mut field: StorageField<Settings> = StorageField::new(
            "motd",
            "",
            |s: &Settings| &s.motd,
            |s: &mut Settings| &mut s.motd,
            FieldOptions::new(),
        )
        .unwrap();

        field.load(&mut settings, &Document::new(), &registry).unwrap();
        assert_eq!(settings.motd, None);
    }

    #[test]
    fn test_save_changes_only() {
        let registry = TranslatorRegistry::new();
        let mut document = Document::new();
        document
            .set("users", Value::map_of([("alice", Value::Int(1))]))
            .unwrap();
        let mut settings = Settings::default();
        let mut field: StorageField<Settings> = StorageField::new(
            "users",
            "",
            |s: &Settings| &s.users,
            |s: &mut Settings| &mut s.users,
            FieldOptions::new(),
        )
        .unwrap();
        field.load(&mut settings, &document, &registry).unwrap();

        let writes = document.write_count();
        let outcome = field.save(&settings, &mut document, &registry).unwrap();
        assert_eq!(outcome, SaveOutcome::Unchanged);
        assert_eq!(document.write_count(), writes);

        settings.users.insert("bob".to_string(), 2);
        let outcome = field.save(&settings, &mut document, &registry).unwrap();
        assert_eq!(outcome, SaveOutcome::Written);
        assert_eq!(document.get("users.bob"), Some(&Value::Int(2)));

        let outcome = field.save(&settings, &mut document, &registry).unwrap();
        assert_eq!(outcome, SaveOutcome::Unchanged);
    }

    #[test]
    fn test_save_none_and_null_policies() {
        let registry = TranslatorRegistry::new();
        let mut document = Document::new();
        let settings = Settings::default();

        let mut field = retries(FieldOptions::new().save(SaveSetting::None));
        assert_eq!(
            field.save(&settings, &mut document, &registry).unwrap(),
            SaveOutcome::Skipped
        );

        let mut motd: StorageField<Settings> = StorageField::new(
            "motd",
            "",
            |s: &Settings| &s.motd,
            |s: &mut Settings| &mut s.motd,
            FieldOptions::new()
                .save(SaveSetting::Always)
                .nullability(Nullability::Forbid),
        )
        .unwrap();
        assert_eq!(
            motd.save(&settings, &mut document, &registry).unwrap(),
            SaveOutcome::Skipped
        );
        assert_eq!(document.write_count(), 0);
    }
}
