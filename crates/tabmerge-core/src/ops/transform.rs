//! Projection, de-duplication and sorting

use std::hash::{Hash, Hasher};

use ahash::AHashSet;
use thiserror::Error;

use crate::cell::CellValue;
use crate::table::Table;

/// Sort-column value meaning "do not sort" (compared case-insensitively)
pub const NO_SORT: &str = "none";

/// Errors raised by [`transform`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// A requested column is not in the table
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

/// Options for [`transform`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Columns to keep, in output order. Empty keeps every column.
    pub columns: Vec<String>,
    /// Drop rows that repeat an earlier row
    pub dedupe: bool,
    /// Column to sort by; `None` or [`NO_SORT`] leaves row order alone
    pub sort_by: Option<String>,
}

impl TransformOptions {
    /// The effective sort column, with the [`NO_SORT`] sentinel filtered out
    pub fn sort_column(&self) -> Option<&str> {
        self.sort_by
            .as_deref()
            .filter(|name| !name.eq_ignore_ascii_case(NO_SORT))
    }
}

/// Apply projection, then de-duplication, then a stable ascending sort.
///
/// De-duplication looks only at the projected columns, so rows that differed
/// only in dropped columns collapse into one. Sorting uses
/// [`CellValue::sort_cmp`], which puts empty cells last.
pub fn transform(table: Table, options: &TransformOptions) -> Result<Table, TransformError> {
    let mut table = if options.columns.is_empty() {
        table
    } else {
        project(table, &options.columns)?
    };

    if options.dedupe {
        let before = table.rows.len();
        table.rows = dedupe(std::mem::take(&mut table.rows));
        log::debug!("dropped {} duplicate rows", before - table.rows.len());
    }

    if let Some(name) = options.sort_column() {
        let idx = table
            .column_index(name)
            .ok_or_else(|| TransformError::UnknownColumn(name.to_string()))?;
        // `sort_by` is stable: ties keep their prior order.
        table.rows.sort_by(|a, b| a[idx].sort_cmp(&b[idx]));
    }

    Ok(table)
}

fn project(table: Table, wanted: &[String]) -> Result<Table, TransformError> {
    let mut columns = Vec::with_capacity(wanted.len());
    let mut indices = Vec::with_capacity(wanted.len());
    for name in wanted {
        if columns.contains(name) {
            continue;
        }
        let idx = table
            .column_index(name)
            .ok_or_else(|| TransformError::UnknownColumn(name.clone()))?;
        columns.push(name.clone());
        indices.push(idx);
    }

    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            indices
                .iter()
                .map(|&idx| std::mem::take(&mut row[idx]))
                .collect()
        })
        .collect();

    Ok(Table { columns, rows })
}

/// Row identity for duplicate detection
struct RowKey<'a>(&'a [CellValue]);

impl PartialEq for RowKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0).all(|(a, b)| a.same_value(b))
    }
}

impl Eq for RowKey<'_> {}

impl Hash for RowKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for cell in self.0 {
            cell.hash_value(state);
        }
    }
}

fn dedupe(rows: Vec<Vec<CellValue>>) -> Vec<Vec<CellValue>> {
    let keep: Vec<bool> = {
        let mut seen = AHashSet::with_capacity(rows.len());
        rows.iter().map(|row| seen.insert(RowKey(row))).collect()
    };

    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::from_rows(
            vec!["id".into(), "city".into(), "qty".into()],
            vec![
                vec![3.0.into(), "Pune".into(), 10.0.into()],
                vec![1.0.into(), "Agra".into(), 20.0.into()],
                vec![3.0.into(), "Pune".into(), 30.0.into()],
                vec![CellValue::Empty, "Goa".into(), 40.0.into()],
                vec![2.0.into(), "Agra".into(), 20.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_projection_orders_columns_as_requested() {
        let out = transform(
            sample(),
            &TransformOptions {
                columns: vec!["qty".into(), "id".into()],
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(out.columns(), &["qty", "id"]);
        assert_eq!(out.rows()[0], vec![CellValue::Number(10.0), CellValue::Number(3.0)]);
    }

    #[test]
    fn test_dedupe_after_projection() {
        // Rows 0 and 2 differ only in the dropped `qty` column.
        let out = transform(
            sample(),
            &TransformOptions {
                columns: vec!["id".into(), "city".into()],
                dedupe: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(out.row_count(), 4);
        assert_eq!(out.rows()[0], vec![CellValue::Number(3.0), "Pune".into()]);
        assert_eq!(out.rows()[1], vec![CellValue::Number(1.0), "Agra".into()]);
    }

    #[test]
    fn test_dedupe_without_projection_keeps_distinct_rows() {
        let out = transform(
            sample(),
            &TransformOptions {
                dedupe: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out.row_count(), 5);
    }

    #[test]
    fn test_sort_is_stable_with_nulls_last() {
        let out = transform(
            sample(),
            &TransformOptions {
                sort_by: Some("id".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let qty: Vec<&CellValue> = out.column_values(2).collect();
        assert_eq!(
            qty,
            vec![
                &CellValue::Number(20.0),
                &CellValue::Number(20.0),
                &CellValue::Number(10.0),
                &CellValue::Number(30.0),
                &CellValue::Number(40.0),
            ]
        );
        assert_eq!(out.rows()[4][0], CellValue::Empty);
    }

    #[test]
    fn test_sort_text_lexicographic() {
        let out = transform(
            sample(),
            &TransformOptions {
                sort_by: Some("city".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let cities: Vec<String> = out.column_values(1).map(|v| v.to_string()).collect();
        assert_eq!(cities, vec!["Agra", "Agra", "Goa", "Pune", "Pune"]);
        // Agra rows keep their original relative order (id 1 before id 2).
        assert_eq!(out.rows()[0][0], CellValue::Number(1.0));
    }

    #[test]
    fn test_none_sentinel_skips_sort() {
        let options = TransformOptions {
            sort_by: Some("None".into()),
            ..Default::default()
        };
        assert_eq!(options.sort_column(), None);
        assert_eq!(transform(sample(), &options).unwrap(), sample());
    }

    #[test]
    fn test_unknown_columns() {
        let err = transform(
            sample(),
            &TransformOptions {
                columns: vec!["nope".into()],
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, TransformError::UnknownColumn("nope".into()));

        let err = transform(
            sample(),
            &TransformOptions {
                columns: vec!["id".into()],
                sort_by: Some("city".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, TransformError::UnknownColumn("city".into()));
    }

    #[test]
    fn test_dedupe_treats_nan_as_equal() {
        let table = Table::from_rows(
            vec!["x".into()],
            vec![
                vec![f64::NAN.into()],
                vec![f64::NAN.into()],
                vec![CellValue::Empty],
                vec![CellValue::Empty],
            ],
        )
        .unwrap();
        let out = transform(
            table,
            &TransformOptions {
                dedupe: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out.row_count(), 2);
    }
}
