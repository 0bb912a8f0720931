//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX reading/writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// A row is wider than a worksheet allows
    #[error("Row {row} has {columns} columns; a worksheet holds at most {max}", max = tabmerge_core::MAX_COLS)]
    TooManyColumns { row: u32, columns: usize },

    /// More rows than a worksheet allows
    #[error("A worksheet holds at most {max} rows", max = tabmerge_core::MAX_ROWS)]
    TooManyRows,

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] tabmerge_core::Error),
}
