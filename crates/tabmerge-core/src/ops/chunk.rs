//! Splitting a table into bounded row windows

use std::num::NonZeroUsize;

use crate::table::Table;

/// Split a table into consecutive windows of at most `max_rows` rows.
///
/// Row order is preserved and every window carries the full column list.
/// Only the last window may be shorter. An empty table yields no windows.
pub fn chunk(table: Table, max_rows: NonZeroUsize) -> Vec<Table> {
    let max_rows = max_rows.get();
    let (columns, rows) = table.into_parts();

    let count = (rows.len() + max_rows - 1) / max_rows;
    let mut chunks = Vec::with_capacity(count);
    let mut rows = rows.into_iter();

    loop {
        let window: Vec<_> = rows.by_ref().take(max_rows).collect();
        if window.is_empty() {
            break;
        }
        chunks.push(Table {
            columns: columns.clone(),
            rows: window,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn numbers(n: usize) -> Table {
        Table::from_rows(
            vec!["n".into()],
            (0..n).map(|i| vec![CellValue::Number(i as f64)]).collect(),
        )
        .unwrap()
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_chunk_sizes() {
        let chunks = chunk(numbers(10), nz(4));
        let sizes: Vec<usize> = chunks.iter().map(Table::row_count).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(chunks[2].rows()[1][0], CellValue::Number(9.0));
        assert!(chunks.iter().all(|c| c.columns() == ["n"]));
    }

    #[test]
    fn test_chunk_exact_multiple() {
        let sizes: Vec<usize> = chunk(numbers(8), nz(4)).iter().map(Table::row_count).collect();
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn test_chunk_empty_table() {
        assert!(chunk(numbers(0), nz(3)).is_empty());
    }

    #[test]
    fn test_chunk_larger_than_table() {
        let chunks = chunk(numbers(3), nz(1_000_000));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].row_count(), 3);
    }
}
