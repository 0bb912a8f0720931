//! Error types for the SKU loader

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`LoadError`]
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Setup failures that stop a load before any row is inserted
#[derive(Debug, Error)]
pub enum LoadError {
    /// The scratch copy of the upload could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be decoded
    #[error("Workbook error: {0}")]
    Workbook(#[from] tabmerge_xlsx::XlsxError),

    /// The database could not be opened
    #[error("Cannot open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The insert could not be prepared, usually because the table is missing
    #[error("Cannot prepare insert into '{table}': {source}")]
    Prepare {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Starting or committing the transaction failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// One data row that could not be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based sheet row number; the first data row is row 2
    pub row: u32,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

impl std::error::Error for RowError {}
