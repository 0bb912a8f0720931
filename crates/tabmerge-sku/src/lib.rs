//! # tabmerge-sku
//!
//! Loads the data rows of an SKU master workbook into a 62-column table,
//! one insert per row, committing once at the end. Rows that fail are
//! reported by sheet row number and do not stop the load.

mod columns;
mod error;
mod loader;
mod value;

pub use columns::{insert_sql, DEFAULT_TABLE, SKU_COLUMNS};
pub use error::{LoadError, LoadResult, RowError};
pub use loader::{load_sku_file, LoadReport, SkuLoadOptions};
