//! Declarative persistence of plugin data in config files
//!
//! A plugin describes the attributes of a data type through
//! [`StorageData`] and wraps an instance in a [`StorageContainer`]. The
//! container seeds missing paths of its [`ConfigFile`] with the initial
//! values, loads stored values back through the [`TranslatorRegistry`] and
//! writes changed values when saved.

pub mod container;
pub mod document;
pub mod error;
pub mod field;
pub mod scanner;
pub mod translator;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use container::{ContainerState, StorageContainer};
pub use document::{ConfigFile, ConfigFormat, Document, FileOptions, PATH_SEPARATOR, VERSION_KEY};
pub use error::{DocumentError, Result, StorageError};
pub use field::{
    FieldAccess, FieldOptions, LoadOutcome, Nullability, SaveOutcome, SaveSetting, StorageField,
    SUB_PATH_MARKER,
};
pub use scanner::{scan, FieldScanner, StorageData};
pub use translator::{AnyWorld, Translator, TranslatorRegistry, WorldLookup};
pub use types::{implements, implements_interface, normalize, zero_value, Interface, Scalar, TypeKind, TypeTag};
pub use value::{
    enum_from_value, enum_to_value, enum_type_tag, EnumConstant, Object, ObjectValue, StorageEnum,
    StorageValue, Value,
};
