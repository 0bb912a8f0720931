//! # tabmerge-csv
//!
//! CSV reader for tabmerge. Decodes comma-separated text into a
//! [`tabmerge_core::Table`], inferring one value type per column.

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, DEFAULT_NA_VALUES};
pub use reader::CsvReader;
