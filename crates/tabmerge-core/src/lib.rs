//! # tabmerge-core
//!
//! Core data structures for the tabmerge workspace.
//!
//! This crate provides the fundamental types used throughout tabmerge:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, errors)
//! - [`CellAddress`] - A1-style cell addressing used by the spreadsheet codecs
//! - [`SheetRows`] - Raw positional rows of one sheet, as a codec decodes them
//! - [`Table`] - Named columns × rows, the unit every pipeline stage works on
//! - [`ops`] - The pure table operations: merge, transform and chunk
//!
//! ## Example
//!
//! ```rust
//! use tabmerge_core::{ops, CellValue, Table, TransformOptions};
//!
//! let mut a = Table::new(vec!["id".into(), "name".into()]).unwrap();
//! a.push_row(vec![2.0.into(), "b".into()]).unwrap();
//! a.push_row(vec![1.0.into(), "a".into()]).unwrap();
//!
//! let merged = ops::merge(vec![a]);
//! let sorted = ops::transform(
//!     merged,
//!     &TransformOptions {
//!         sort_by: Some("id".into()),
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(sorted.rows()[0][0], CellValue::Number(1.0));
//! ```

pub mod cell;
pub mod error;
pub mod ops;
pub mod sheet;
pub mod table;

// Re-exports for convenience
pub use cell::{CellAddress, CellError, CellValue, SharedString, StringPool};
pub use error::{Error, Result};
pub use ops::{chunk, merge, transform, TransformError, TransformOptions};
pub use sheet::SheetRows;
pub use table::{BlankRows, Table};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
