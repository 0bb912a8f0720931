//! Workbook-to-table bulk insert

use std::io::Write;
use std::path::Path;

use rusqlite::{Connection, OpenFlags, Statement};
use tabmerge::UploadedFile;
use tabmerge_core::CellValue;
use tabmerge_xlsx::XlsxReader;

use crate::columns::{insert_sql, DEFAULT_TABLE, SKU_COLUMNS};
use crate::error::{LoadError, LoadResult, RowError};
use crate::value::SqlCell;

/// Options for [`load_sku_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuLoadOptions {
    /// Destination table
    pub table: String,
}

impl Default for SkuLoadOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Outcome of a load: rows inserted and rows that failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub success_count: usize,
    pub errors: Vec<RowError>,
}

impl LoadReport {
    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    /// Data rows an insert was attempted for
    pub fn rows_attempted(&self) -> usize {
        self.success_count + self.errors.len()
    }
}

/// Insert every data row of the uploaded workbook's first sheet into the
/// SQLite database at `db_path`.
///
/// Row 1 is the header and is never inserted. Each later row is bound
/// positionally to the [`SKU_COLUMNS`] insert; a failing row is recorded and
/// the load carries on. All successful rows are committed together.
///
/// A row's width is the extent of the cells the workbook stores for it, up
/// to its last stored cell. A row whose final columns were left blank (and
/// so never stored) is shorter than [`SKU_COLUMNS`] and is reported as a row
/// error rather than padded with NULLs. A blank final cell the workbook does
/// store still counts, so such a row binds NULL there and inserts.
///
/// The database must already exist with the destination table in it.
pub fn load_sku_file<P: AsRef<Path>>(
    file: &UploadedFile,
    db_path: P,
    options: &SkuLoadOptions,
) -> LoadResult<LoadReport> {
    let db_path = db_path.as_ref();

    // The reader works from a path; the scratch copy is removed on drop.
    let sheet = {
        let mut scratch = tempfile::Builder::new()
            .prefix("tabmerge-sku-")
            .suffix(".xlsx")
            .tempfile()?;
        scratch.write_all(&file.bytes)?;
        scratch.flush()?;
        XlsxReader::read_file(scratch.path())?
    };
    log::debug!(
        "read {} rows from sheet '{}' of {}",
        sheet.len(),
        sheet.name(),
        file.name
    );

    let mut conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| LoadError::Open {
        path: db_path.to_path_buf(),
        source,
    })?;

    let tx = conn.transaction()?;
    let report = {
        let mut stmt = tx
            .prepare(&insert_sql(&options.table))
            .map_err(|source| LoadError::Prepare {
                table: options.table.clone(),
                source,
            })?;

        sheet
            .data_rows()
            .filter(|(_, cells)| !cells.is_empty())
            .map(|(row, cells)| insert_row(&mut stmt, row, cells))
            .fold(LoadReport::default(), |mut report, result| {
                match result {
                    Ok(()) => report.success_count += 1,
                    Err(err) => {
                        log::debug!("{}", err);
                        report.errors.push(err);
                    }
                }
                report
            })
    };
    tx.commit()?;

    log::info!(
        "loaded {} rows into '{}' from {} ({} failed)",
        report.success_count,
        options.table,
        file.name,
        report.failed_count()
    );
    Ok(report)
}

fn insert_row(stmt: &mut Statement<'_>, row: u32, cells: &[CellValue]) -> Result<(), RowError> {
    if cells.len() != SKU_COLUMNS.len() {
        return Err(RowError {
            row,
            message: format!(
                "expected {} values, got {}",
                SKU_COLUMNS.len(),
                cells.len()
            ),
        });
    }
    stmt.execute(rusqlite::params_from_iter(cells.iter().map(SqlCell)))
        .map(|_| ())
        .map_err(|e| RowError {
            row,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = LoadReport {
            success_count: 3,
            errors: vec![RowError {
                row: 4,
                message: "bad".into(),
            }],
        };
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.rows_attempted(), 4);
        assert_eq!(report.errors[0].to_string(), "Row 4: bad");
    }

    #[test]
    fn test_default_table() {
        assert_eq!(SkuLoadOptions::default().table, "sku");
    }
}
