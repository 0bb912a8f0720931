//! Named-column table

use ahash::AHashSet;

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::sheet::SheetRows;

/// What to do with rows whose cells are all empty when a sheet becomes a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankRows {
    /// Keep them as rows of `Empty`
    Keep,
    /// Drop them
    Skip,
}

/// Ordered named columns × ordered rows.
///
/// Every row holds exactly one cell per column; cells a source did not have
/// are [`CellValue::Empty`]. Column names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// A table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a table with the given columns and no rows
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = AHashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table from columns and rows, checking row widths
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from raw sheet rows, treating the first row with any
    /// value as the header. Blank rows above it are dropped.
    ///
    /// Header cells become column names by their display text. An empty
    /// header cell at position `i` is named `Unnamed: i`, and a repeated name
    /// gets a `.1`, `.2`, ... suffix. Data rows wider than the header add
    /// `Unnamed: i` columns; narrower rows are padded with `Empty`.
    pub fn from_sheet(sheet: SheetRows, blank_rows: BlankRows) -> Self {
        let mut rows = sheet.into_rows().into_iter();
        let header = match rows.find(|cells| !cells.iter().all(CellValue::is_empty)) {
            Some(header) => header,
            None => return Self::empty(),
        };

        let mut data: Vec<Vec<CellValue>> = match blank_rows {
            BlankRows::Keep => rows.collect(),
            BlankRows::Skip => rows
                .filter(|cells| !cells.iter().all(CellValue::is_empty))
                .collect(),
        };

        let width = data
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(header.len());

        let mut seen: AHashSet<String> = AHashSet::with_capacity(width);
        let mut columns = Vec::with_capacity(width);
        for idx in 0..width {
            let text = header.get(idx).map(CellValue::to_string).unwrap_or_default();
            let base = if text.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                text
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while seen.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            seen.insert(name.clone());
            columns.push(name);
        }

        for cells in &mut data {
            cells.resize(width, CellValue::Empty);
        }

        Self {
            columns,
            rows: data,
        }
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in order
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row; it must have one cell per column
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// The first `n` rows (fewer if the table is shorter)
    pub fn head(&self, n: usize) -> &[Vec<CellValue>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Iterate one column's values top to bottom
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Consume the table, returning `(columns, rows)`
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<CellValue>>) {
        (self.columns, self.rows)
    }
}
