//! Serializing table chunks to workbook bytes

use tabmerge_core::Table;
use tabmerge_xlsx::{XlsxResult, XlsxWriter};

/// One exported part: its file name, workbook bytes and data row count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub name: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

/// File name for the `index`-th part, counting from 1
pub fn part_name(index: usize) -> String {
    format!("merged_output_part_{}.xlsx", index)
}

/// Serialize a table as a single-sheet workbook
pub fn export(table: &Table) -> XlsxResult<Vec<u8>> {
    XlsxWriter::table_to_bytes(table)
}
