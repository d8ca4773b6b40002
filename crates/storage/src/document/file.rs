//! Versioned document backed by a file on disk

use super::{ConfigFormat, Document};
use crate::error::{DocumentError, Result};
use crate::value::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Top-level key holding the version stamp.
pub const VERSION_KEY: &str = "configVersion";

/// How a [`ConfigFile`] is opened.
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Format override. Detected from the extension when unset.
    pub format: Option<ConfigFormat>,
    /// Move an unparseable file aside instead of failing.
    pub backup_corrupt: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            format: None,
            backup_corrupt: true,
        }
    }
}

/// A [`Document`] loaded from and saved to one file, stamped with a version.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    format: ConfigFormat,
    version: i64,
    stored_version: i64,
    document: Document,
    initialize: bool,
    backup: Option<PathBuf>,
}

impl ConfigFile {
    pub fn open(path: impl Into<PathBuf>, version: i64) -> Result<Self> {
        Self::open_with(path, version, FileOptions::default())
    }

    /// Opens the file, creating it when missing.
    ///
    /// A file that cannot be parsed is renamed to `<path>_backup_<millis>`
    /// and replaced by an empty document. A version stamp that differs from
    /// `version` marks the file for initialization; existing values are kept.
    pub fn open_with(path: impl Into<PathBuf>, version: i64, options: FileOptions) -> Result<Self> {
        let path = path.into();
        let format = options
            .format
            .unwrap_or_else(|| ConfigFormat::from_extension(&path));
        let mut file = Self {
            path,
            format,
            version,
            stored_version: 0,
            document: Document::new(),
            initialize: false,
            backup: None,
        };

        if !file.path.exists() {
            if let Some(parent) = file.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| DocumentError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            info!(path = %file.path.display(), "Creating configuration file");
            file.document.set(VERSION_KEY, Value::Long(version))?;
            file.initialize = true;
            file.try_save()?;
            return Ok(file);
        }

        let content = fs::read_to_string(&file.path).map_err(|source| DocumentError::Io {
            path: file.path.clone(),
            source,
        })?;
        match format.parse(&content) {
            Ok(root) => file.document = Document::from_value(root),
            Err(reason) if options.backup_corrupt => {
                error!(path = %file.path.display(), %reason, "The configuration file seems to be erroneous");
                let backup = file.move_aside()?;
                error!(
                    path = %file.path.display(),
                    backup = %backup.display(),
                    "The file has been regenerated. A backup of the erroneous file has been saved"
                );
                file.backup = Some(backup);
                file.initialize = true;
            }
            Err(reason) => {
                return Err(DocumentError::Parse {
                    path: file.path.clone(),
                    reason,
                }
                .into())
            }
        }

        file.stored_version = file.document.get_i64(VERSION_KEY).unwrap_or(0);
        if file.stored_version != version && !file.initialize {
            warn!(
                path = %file.path.display(),
                found = file.stored_version,
                expected = version,
                "The configuration file seems to be outdated. Adding missing values"
            );
            file.initialize = true;
        }

        if file.initialize {
            file.document.set(VERSION_KEY, Value::Long(version))?;
            file.try_save()?;
        }
        Ok(file)
    }

    fn move_aside(&self) -> Result<PathBuf> {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut backup = self.path.clone().into_os_string();
        backup.push(format!("_backup_{millis}"));
        let backup = PathBuf::from(backup);
        fs::rename(&self.path, &backup).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(backup)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Version this file is expected to have.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Version stamp found in the file when it was opened.
    pub fn stored_version(&self) -> i64 {
        self.stored_version
    }

    /// Whether the file was created, regenerated or outdated when opened.
    pub fn needs_initialize(&self) -> bool {
        self.initialize
    }

    /// Where a corrupt file was moved, if it was.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Seeds `path` with `value` if it holds nothing yet.
    pub fn init_value(&mut self, path: &str, value: Value) -> Result<bool> {
        if self.document.contains(path) {
            return Ok(false);
        }
        self.document.set(path, value)?;
        Ok(true)
    }

    /// Stamps the current version and saves.
    pub fn initialize(&mut self) {
        if let Err(e) = self.document.set(VERSION_KEY, Value::Long(self.version)) {
            error!(error = %e, "Could not stamp the configuration version");
        }
        self.save();
    }

    /// Re-reads the document from disk, discarding unsaved changes.
    pub fn reload(&mut self) -> Result<()> {
        let content = fs::read_to_string(&self.path).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })?;
        let root = self.format.parse(&content).map_err(|reason| DocumentError::Parse {
            path: self.path.clone(),
            reason,
        })?;
        self.document = Document::from_value(root);
        Ok(())
    }

    /// Saves the document, logging instead of returning failures.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!(path = %self.path.display(), error = %e, "Could not save configuration file");
        }
    }

    pub fn try_save(&self) -> Result<()> {
        let content = self.format.render(&self.document.to_value())?;
        fs::write(&self.path, content).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}
