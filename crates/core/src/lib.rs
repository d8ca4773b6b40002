//! Plugin utilities for Minecraft: Bedrock Edition servers
//!
//! Re-exports the storage engine and host data types, and sets up logging
//! for plugins that do not bring their own subscriber.

pub mod logging;

pub use storage;
pub use util;

use anyhow::Context;
use std::path::PathBuf;
use storage::{StorageContainer, StorageData};

/// Commonly used types for declaring persisted plugin data.
pub mod prelude {
    pub use storage::{
        storage_enum, ConfigFile, Document, FieldOptions, FieldScanner, Nullability, SaveSetting,
        StorageContainer, StorageData, StorageValue, TranslatorRegistry, Value,
    };
    pub use util::{IgnoreCase, Location};
}

/// Opens `path` and runs the default load process on `data`.
pub fn load_container<C: StorageData>(
    path: impl Into<PathBuf>,
    version: i64,
    data: C,
) -> anyhow::Result<StorageContainer<C>> {
    let path = path.into();
    let mut container = StorageContainer::new(path.clone(), version, data)
        .with_context(|| format!("Failed to open storage file {}", path.display()))?;
    container.default_load_process();
    Ok(container)
}
