//! Concatenation of tables

use ahash::AHashMap;

use crate::cell::CellValue;
use crate::table::Table;

/// Concatenate tables in order.
///
/// The result's columns are the union of all input columns in first-seen
/// order. Rows keep their source order; a row gets `Empty` for every column
/// its source table did not have.
pub fn merge<I>(tables: I) -> Table
where
    I: IntoIterator<Item = Table>,
{
    let mut columns: Vec<String> = Vec::new();
    let mut positions: AHashMap<String, usize> = AHashMap::new();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    for table in tables {
        let (table_columns, table_rows) = table.into_parts();

        let targets: Vec<usize> = table_columns
            .into_iter()
            .map(|name| match positions.get(&name) {
                Some(&pos) => pos,
                None => {
                    let pos = columns.len();
                    positions.insert(name.clone(), pos);
                    columns.push(name);
                    pos
                }
            })
            .collect();

        let width = columns.len();
        rows.reserve(table_rows.len());
        for source in table_rows {
            let mut row = vec![CellValue::Empty; width];
            for (value, &target) in source.into_iter().zip(&targets) {
                row[target] = value;
            }
            rows.push(row);
        }
    }

    // Rows from earlier tables predate columns introduced later.
    let width = columns.len();
    for row in &mut rows {
        if row.len() < width {
            row.resize(width, CellValue::Empty);
        }
    }

    log::debug!("merged {} rows across {} columns", rows.len(), width);

    Table { columns, rows }
}
