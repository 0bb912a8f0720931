//! Common imports for tabmerge users
//!
//! ```rust
//! use tabmerge::prelude::*;
//! ```

pub use crate::error::{MergeError, ReadError};
pub use crate::pipeline::{run_merge, MergeOptions, MergeOutcome, MergeReport};
pub use crate::read::{read, UploadedFile};
pub use tabmerge_core::{CellValue, Table, TransformOptions};
