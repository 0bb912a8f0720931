//! Raw positional sheet rows

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// The rows of one sheet exactly as a codec decoded them.
///
/// Row `i` holds the cells up to and including the last cell physically
/// present in that row of the file, so rows may differ in length. Rows that
/// are absent between present rows are kept as empty rows, which keeps
/// sheet row numbers stable (`row index + 1`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRows {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl SheetRows {
    /// Create an empty sheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a cell value, growing the sheet as needed.
    ///
    /// Setting [`CellValue::Empty`] still marks the cell as present.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }

        let row = row as usize;
        let col = col as usize;
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
        Ok(())
    }

    /// Append a whole row after the last one
    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        self.rows.push(cells);
    }

    /// All rows, header included
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows, header included
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the sheet has no rows at all
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row, if any
    pub fn header(&self) -> Option<&[CellValue]> {
        self.rows.first().map(|cells| cells.as_slice())
    }

    /// Iterate rows after the header, paired with their 1-based sheet row
    /// number (the first data row is row 2).
    pub fn data_rows(&self) -> impl Iterator<Item = (u32, &[CellValue])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, cells)| (idx as u32 + 1, cells.as_slice()))
    }

    /// Consume the sheet, returning its rows
    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_grows_ragged_rows() {
        let mut sheet = SheetRows::new("Sheet1");
        sheet.set(0, 2, "c".into()).unwrap();
        sheet.set(2, 0, 1.0.into()).unwrap();

        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.rows()[0].len(), 3);
        assert!(sheet.rows()[1].is_empty());
        assert_eq!(sheet.rows()[2], vec![CellValue::Number(1.0)]);
    }

    #[test]
    fn test_set_empty_marks_presence() {
        let mut sheet = SheetRows::new("Sheet1");
        sheet.set(0, 3, CellValue::Empty).unwrap();
        assert_eq!(sheet.rows()[0].len(), 4);
    }

    #[test]
    fn test_data_rows_are_numbered_from_two() {
        let mut sheet = SheetRows::new("Sheet1");
        sheet.push_row(vec!["h".into()]);
        sheet.push_row(vec![1.0.into()]);
        sheet.push_row(vec![2.0.into()]);

        let numbers: Vec<u32> = sheet.data_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut sheet = SheetRows::new("Sheet1");
        assert!(sheet.set(MAX_ROWS, 0, CellValue::Empty).is_err());
        assert!(sheet.set(0, MAX_COLS, CellValue::Empty).is_err());
    }
}
