//! # tabmerge-xls
//!
//! XLS (BIFF8) reader for tabmerge.
//!
//! This crate handles the legacy Excel binary format (.xls). Only cell
//! values of the first worksheet are decoded; formatting, formulas and
//! charts are skipped.

pub mod biff;
pub mod error;
pub mod reader;

pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
