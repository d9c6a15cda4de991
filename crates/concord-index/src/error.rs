//! Error types for the concord-index crate.

use std::{io, path::PathBuf};

use concord_query::NormalizeError;
use tantivy::DocAddress;
use thiserror::Error;

/// Errors that can occur when opening, writing or reading the index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// Failed to read from the index.
    #[error("failed to read index: {0}")]
    Read(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),

    /// A term pattern could not be turned into an automaton.
    #[error("invalid term pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// The index settings file could not be read or written.
    #[error("invalid index settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }

    /// Creates a `Read` error from any displayable source.
    pub(crate) fn read(source: impl ToString) -> Self {
        Self::Read(source.to_string())
    }
}

/// Errors raised while producing concordance windows.
#[derive(Debug, Error)]
pub enum ConcordanceError {
    /// The query could not be rewritten into span form.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// A matching document has no stored value for the windowed field.
    #[error(
        "document {doc:?} has no stored value for field '{field}'; stored fields are: {}",
        .available.join(", ")
    )]
    MissingField {
        /// The document.
        doc: DocAddress,
        /// The windowed field.
        field: String,
        /// Fields the document does store.
        available: Vec<String>,
    },

    /// The document filter went backwards relative to the span stream.
    #[error("filter returned doc {filter_doc} below span doc {span_doc}")]
    MisorderedFilter {
        /// Document the filter is on.
        filter_doc: u32,
        /// Document the spans are on.
        span_doc: u32,
    },

    /// A target position has no resolved character offset.
    #[error("no offset for target position {position} in document {doc:?}")]
    TargetNotFound {
        /// The document.
        doc: DocAddress,
        /// The unresolved token position.
        position: u32,
    },

    /// The schema has no field with this name.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Underlying index failure.
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl From<tantivy::TantivyError> for ConcordanceError {
    fn from(source: tantivy::TantivyError) -> Self {
        Self::Index(IndexError::read(source))
    }
}

impl From<io::Error> for ConcordanceError {
    fn from(source: io::Error) -> Self {
        Self::Index(IndexError::Io(source))
    }
}
