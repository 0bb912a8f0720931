//! # tabmerge-xlsx
//!
//! XLSX (Office Open XML) reader and writer for tabmerge.
//!
//! The reader decodes the cell values of a workbook's first sheet into
//! [`SheetRows`](tabmerge_core::SheetRows). The writer emits a single-sheet
//! workbook from a [`Table`](tabmerge_core::Table) or from raw rows.

pub mod error;
pub mod reader;
pub mod writer;

mod escape;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

/// MIME type of an `.xlsx` workbook
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
