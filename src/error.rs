//! Error types for catalog decoding, snapshot caching and result emission.
//!
//! Every variant is fatal to the command that raised it, except snapshot
//! write failures, which the binary downgrades to a warning.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised while turning a source document into matched artifacts
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The source document could not be opened or read
    #[error("failed to read catalog {path}: {source}")]
    SourceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source document is not well-formed XML
    #[error("XML parsing error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Structural problem the tokenizer does not report on its own
    #[error("invalid catalog structure at byte {position}: {message}")]
    Structure { position: u64, message: String },

    /// A snapshot exists but cannot be read or deserialized
    #[error("failed to load snapshot {path}: {message}")]
    Cache { path: PathBuf, message: String },

    /// A snapshot or match artifact could not be persisted
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl CatalogError {
    pub(crate) fn structure(position: u64, message: impl Into<String>) -> Self {
        CatalogError::Structure {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn cache(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        CatalogError::Cache {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        CatalogError::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for every failure that originates from the source document
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CatalogError::SourceIo { .. } | CatalogError::Xml { .. } | CatalogError::Structure { .. }
        )
    }
}
