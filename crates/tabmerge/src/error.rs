//! Error types for reading, archiving and the merge pipeline

use thiserror::Error;

pub use tabmerge_core::TransformError;

/// A file that could not be turned into a table.
///
/// Per-file: the batch it belongs to carries on without it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadError {
    /// The file name has no supported extension
    #[error("Unsupported file format: {name}")]
    UnsupportedFormat { name: String },

    /// The codec rejected the file contents
    #[error("Error reading {name}: {message}")]
    Decode { name: String, message: String },
}

impl ReadError {
    /// Name of the file this error is about
    pub fn file_name(&self) -> &str {
        match self {
            ReadError::UnsupportedFormat { name } | ReadError::Decode { name, .. } => name,
        }
    }
}

/// Errors building the output archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Two entries share a name
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop a merge run
#[derive(Debug, Error)]
pub enum MergeError {
    /// Projection or sort named a column the merged table lacks
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Rows per output file must be between 1 and the sheet limit
    #[error("Invalid max rows per file: {0} (must be 1..={max})", max = crate::MAX_ROWS_PER_FILE_LIMIT)]
    InvalidChunkSize(usize),

    /// Serializing an output part failed
    #[error("Export error: {0}")]
    Export(#[from] tabmerge_xlsx::XlsxError),

    /// Building the archive failed
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}
