//! Error types for the storage engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the storage engine
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by the document backing store
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Value cannot be written to a document: {0}")]
    Unsupported(String),
}

/// Errors raised while describing, translating or assigning persisted fields
#[derive(Debug, Error)]
pub enum StorageError {
    /// A field was declared with a path that cannot be resolved.
    #[error("Illegal path: {0}")]
    InvalidPath(String),

    #[error("No data translator for {0} found")]
    MissingTranslator(String),

    #[error("Translation failed: {0}")]
    Translate(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A value could not be converted into the attribute it belongs to.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl StorageError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
