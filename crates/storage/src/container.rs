//! A container object persisted to a config file

use crate::document::{ConfigFile, Document};
use crate::error::{Result, StorageError};
use crate::field::StorageField;
use crate::scanner::{scan, StorageData};
use crate::translator::TranslatorRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Lifecycle of a [`StorageContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Uninitialized,
    Scanned,
    Seeded,
    Loaded,
}

/// Binds the fields of `C` to a [`ConfigFile`].
///
/// The usual lifecycle is [`default_load_process`](Self::default_load_process)
/// after construction and [`save_data`](Self::save_data) whenever the data
/// should be persisted.
pub struct StorageContainer<C: StorageData> {
    file: ConfigFile,
    data: C,
    fields: Vec<StorageField<C>>,
    translators: Arc<TranslatorRegistry>,
    state: ContainerState,
}

impl<C: StorageData> StorageContainer<C> {
    /// Opens `path` with the shared translator registry.
    pub fn new(path: impl Into<PathBuf>, version: i64, data: C) -> Result<Self> {
        Self::with_translators(path, version, data, TranslatorRegistry::global())
    }

    pub fn with_translators(
        path: impl Into<PathBuf>,
        version: i64,
        data: C,
        translators: Arc<TranslatorRegistry>,
    ) -> Result<Self> {
        let file = ConfigFile::open(path, version)?;
        Ok(Self::from_file(file, data, translators))
    }

    pub fn from_file(file: ConfigFile, data: C, translators: Arc<TranslatorRegistry>) -> Self {
        let mut container = Self {
            file,
            data,
            fields: Vec::new(),
            translators,
            state: ContainerState::Uninitialized,
        };
        container.fields = scan::<C>();
        container.state = ContainerState::Scanned;
        debug!(
            path = %container.file.path().display(),
            fields = container.fields.len(),
            "Scanned storage container"
        );
        container
    }

    /// Captures initial values, seeds missing paths and loads every field.
    pub fn default_load_process(&mut self) {
        self.capture_initial_values();
        self.initialize();
        self.load();
    }

    pub fn capture_initial_values(&mut self) {
        for field in &mut self.fields {
            field.capture_initial_value(&self.data);
        }
    }

    /// Seeds every missing path with its initial value and saves the file.
    pub fn initialize(&mut self) {
        for field in &self.fields {
            if let Err(e) = field.seed_if_missing(self.file.document_mut(), &self.translators) {
                report(field.path(), "initialize", &e);
            }
        }
        self.file.save();
        self.state = ContainerState::Seeded;
    }

    /// Loads every field. A failing field is logged and the others still load.
    pub fn load(&mut self) {
        for field in &mut self.fields {
            if let Err(e) = field.load(&mut self.data, self.file.document(), &self.translators) {
                report(field.path(), "load", &e);
            }
        }
        self.state = ContainerState::Loaded;
    }

    /// Re-reads the file and loads every field again.
    pub fn reload(&mut self) -> Result<()> {
        self.file.reload()?;
        self.load();
        Ok(())
    }

    /// Writes every field according to its save setting, then saves the file.
    pub fn save_data(&mut self) {
        for field in &mut self.fields {
            if let Err(e) = field.save(&self.data, self.file.document_mut(), &self.translators) {
                report(field.path(), "save", &e);
            }
        }
        self.file.save();
    }

    pub fn data(&self) -> &C {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut C {
        &mut self.data
    }

    pub fn into_data(self) -> C {
        self.data
    }

    pub fn fields(&self) -> &[StorageField<C>] {
        &self.fields
    }

    pub fn field(&self, path: &str) -> Option<&StorageField<C>> {
        self.fields.iter().find(|field| field.path() == path)
    }

    pub fn file(&self) -> &ConfigFile {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut ConfigFile {
        &mut self.file
    }

    pub fn document(&self) -> &Document {
        self.file.document()
    }

    pub fn translators(&self) -> &Arc<TranslatorRegistry> {
        &self.translators
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }
}

fn report(path: &str, stage: &str, e: &StorageError) {
    match e {
        StorageError::MissingTranslator(_) => warn!(path, stage, "{}", e),
        _ => error!(path, stage, error = %e, "Storage field failed"),
    }
}
