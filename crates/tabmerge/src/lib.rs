//! # tabmerge
//!
//! Merge CSV and spreadsheet files into one table, reshape it, and export it
//! as row-limited `.xlsx` parts bundled into a zip.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabmerge::prelude::*;
//!
//! let files = vec![
//!     UploadedFile::from_path("north.csv")?,
//!     UploadedFile::from_path("south.xlsx")?,
//! ];
//! let options = MergeOptions {
//!     transform: TransformOptions {
//!         dedupe: true,
//!         sort_by: Some("id".into()),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! let report = run_merge(&files, &options)?;
//! println!("{}", report.summary());
//! for part in report.outputs() {
//!     std::fs::write(&part.name, &part.bytes)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Supported Formats
//!
//! | Extension | Reader |
//! |-----------|--------|
//! | `.csv` | `tabmerge-csv` |
//! | `.xlsx`, `.xlsm` | `tabmerge-xlsx` |
//! | `.xls` | `tabmerge-xls` (BIFF8), or `tabmerge-xlsx` when the file is really a zip |
//! | `.xlsb` | `calamine` |

pub mod archive;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod prelude;
pub mod read;
mod xlsb;

pub use archive::archive;
pub use error::{ArchiveError, MergeError, ReadError, TransformError};
pub use export::{export, part_name, OutputUnit};
pub use pipeline::{
    run_merge, run_merge_with_progress, ArchiveUnit, FileSummary, MergeOptions, MergeOutcome,
    MergeReport, DEFAULT_ARCHIVE_NAME, DEFAULT_MAX_ROWS_PER_FILE, MAX_ROWS_PER_FILE_LIMIT,
};
pub use read::{read, Format, UploadedFile};

pub use tabmerge_core::{CellValue, Table, TransformOptions};
pub use tabmerge_xlsx::XLSX_MIME;

/// MIME type of the output archive
pub const ZIP_MIME: &str = "application/zip";
