//! The merge pipeline: read, merge, transform, chunk, export, archive

use std::num::NonZeroUsize;

use tabmerge_core::{ops, Table, TransformOptions};

use crate::archive::archive;
use crate::error::{MergeError, ReadError};
use crate::export::{export, part_name, OutputUnit};
use crate::read::{read, UploadedFile};

/// Default row ceiling for one output file
pub const DEFAULT_MAX_ROWS_PER_FILE: usize = 1_000_000;

/// Largest accepted row ceiling: the sheet row limit minus the header row
pub const MAX_ROWS_PER_FILE_LIMIT: usize = tabmerge_core::MAX_ROWS as usize - 1;

/// Default name of the archive holding every part
pub const DEFAULT_ARCHIVE_NAME: &str = "merged_outputs.zip";

/// Options for a merge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Projection, de-duplication and sort applied to the merged table
    pub transform: TransformOptions,
    /// Maximum data rows per output file
    pub max_rows_per_file: usize,
    /// Archive file name; `None` skips building the archive
    pub archive_name: Option<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            transform: TransformOptions::default(),
            max_rows_per_file: DEFAULT_MAX_ROWS_PER_FILE,
            archive_name: Some(DEFAULT_ARCHIVE_NAME.to_string()),
        }
    }
}

impl MergeOptions {
    fn chunk_size(&self) -> Result<NonZeroUsize, MergeError> {
        match NonZeroUsize::new(self.max_rows_per_file) {
            Some(n) if n.get() <= MAX_ROWS_PER_FILE_LIMIT => Ok(n),
            _ => Err(MergeError::InvalidChunkSize(self.max_rows_per_file)),
        }
    }
}

/// A file that was read successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

/// The archive of all output parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUnit {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// How a merge run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Every input was rejected
    NoValidData,
    /// Inputs were read but no rows survived the transform
    Empty,
    /// One or more parts were written
    Exported {
        outputs: Vec<OutputUnit>,
        archive: Option<ArchiveUnit>,
    },
}

/// Everything a merge run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Files that were read, in input order
    pub merged: Vec<FileSummary>,
    /// Files that were skipped, in input order
    pub rejected: Vec<ReadError>,
    /// Rows and columns of the final table
    pub shape: (usize, usize),
    pub outcome: MergeOutcome,
}

impl MergeReport {
    /// "N files merged" line for display
    pub fn summary(&self) -> String {
        match self.merged.len() {
            1 => "1 file merged".to_string(),
            n => format!("{} files merged", n),
        }
    }

    /// Exported parts, empty unless the run exported
    pub fn outputs(&self) -> &[OutputUnit] {
        match &self.outcome {
            MergeOutcome::Exported { outputs, .. } => outputs,
            _ => &[],
        }
    }

    /// The archive, if one was built
    pub fn archive(&self) -> Option<&ArchiveUnit> {
        match &self.outcome {
            MergeOutcome::Exported { archive, .. } => archive.as_ref(),
            _ => None,
        }
    }
}

/// Run the whole pipeline over `files`
pub fn run_merge(files: &[UploadedFile], options: &MergeOptions) -> Result<MergeReport, MergeError> {
    run_merge_with_progress(files, options, |_, _| {})
}

/// Run the whole pipeline, calling `progress(done, total)` after each part
/// is exported
pub fn run_merge_with_progress<F>(
    files: &[UploadedFile],
    options: &MergeOptions,
    mut progress: F,
) -> Result<MergeReport, MergeError>
where
    F: FnMut(usize, usize),
{
    let chunk_size = options.chunk_size()?;

    let mut tables = Vec::with_capacity(files.len());
    let mut merged = Vec::new();
    let mut rejected = Vec::new();
    for file in files {
        match read(file) {
            Ok(table) => {
                let (rows, columns) = table.shape();
                merged.push(FileSummary {
                    name: file.name.clone(),
                    rows,
                    columns,
                });
                tables.push(table);
            }
            Err(err) => rejected.push(err),
        }
    }

    if tables.is_empty() {
        log::warn!("no valid data in {} uploaded files", files.len());
        return Ok(MergeReport {
            merged,
            rejected,
            shape: (0, 0),
            outcome: MergeOutcome::NoValidData,
        });
    }

    let table = ops::merge(tables);
    log::info!(
        "{} files merged into {} rows x {} columns",
        merged.len(),
        table.row_count(),
        table.column_count()
    );

    let table = ops::transform(table, &options.transform)?;
    let shape = table.shape();
    if table.row_count() == 0 {
        log::warn!("no rows left after transform");
        return Ok(MergeReport {
            merged,
            rejected,
            shape,
            outcome: MergeOutcome::Empty,
        });
    }

    let outputs = export_chunks(table, chunk_size, &mut progress)?;
    let archive = match &options.archive_name {
        Some(name) => {
            let bytes = archive(
                outputs
                    .iter()
                    .map(|unit| (unit.name.as_str(), unit.bytes.as_slice())),
            )?;
            log::info!("archived {} parts into {}", outputs.len(), name);
            Some(ArchiveUnit {
                name: name.clone(),
                bytes,
            })
        }
        None => None,
    };

    Ok(MergeReport {
        merged,
        rejected,
        shape,
        outcome: MergeOutcome::Exported { outputs, archive },
    })
}

fn export_chunks<F>(
    table: Table,
    chunk_size: NonZeroUsize,
    progress: &mut F,
) -> Result<Vec<OutputUnit>, MergeError>
where
    F: FnMut(usize, usize),
{
    let chunks = ops::chunk(table, chunk_size);
    let total = chunks.len();
    let mut outputs = Vec::with_capacity(total);
    for (idx, chunk) in chunks.iter().enumerate() {
        let name = part_name(idx + 1);
        let bytes = export(chunk)?;
        log::info!(
            "wrote {} ({} rows, part {}/{})",
            name,
            chunk.row_count(),
            idx + 1,
            total
        );
        outputs.push(OutputUnit {
            name,
            bytes,
            rows: chunk.row_count(),
        });
        progress(idx + 1, total);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_bounds() {
        let mut options = MergeOptions::default();
        assert_eq!(options.chunk_size().unwrap().get(), 1_000_000);

        options.max_rows_per_file = MAX_ROWS_PER_FILE_LIMIT;
        assert!(options.chunk_size().is_ok());

        for bad in [0, MAX_ROWS_PER_FILE_LIMIT + 1] {
            options.max_rows_per_file = bad;
            assert!(matches!(
                options.chunk_size(),
                Err(MergeError::InvalidChunkSize(n)) if n == bad
            ));
        }
    }

    #[test]
    fn test_summary_text() {
        let mut report = MergeReport {
            merged: Vec::new(),
            rejected: Vec::new(),
            shape: (0, 0),
            outcome: MergeOutcome::NoValidData,
        };
        assert_eq!(report.summary(), "0 files merged");
        report.merged.push(FileSummary {
            name: "a.csv".into(),
            rows: 1,
            columns: 1,
        });
        assert_eq!(report.summary(), "1 file merged");
        assert!(report.outputs().is_empty());
        assert!(report.archive().is_none());
    }
}
