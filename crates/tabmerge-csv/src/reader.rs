//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use tabmerge_core::{BlankRows, CellValue, SheetRows, StringPool, Table};

/// Value type inferred for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    Boolean,
    Text,
}

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a table
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Table> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a table
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.records() {
            records.push(result?);
        }

        let header: Vec<String> = if options.has_header {
            if records.is_empty() {
                return Err(CsvError::NoColumns);
            }
            let first = records.remove(0);
            first
                .iter()
                .enumerate()
                .map(|(idx, field)| {
                    if idx == 0 {
                        field.trim_start_matches('\u{feff}').to_string()
                    } else {
                        field.to_string()
                    }
                })
                .collect()
        } else {
            let width = records.iter().map(|r| r.len()).max().unwrap_or(0);
            if width == 0 {
                return Err(CsvError::NoColumns);
            }
            (0..width).map(|idx| idx.to_string()).collect()
        };

        let width = header.len();
        for (idx, record) in records.iter().enumerate() {
            if record.len() > width {
                // Header is line 1 when present.
                let line = idx + if options.has_header { 2 } else { 1 };
                return Err(CsvError::Parse {
                    row: line,
                    column: width + 1,
                    message: format!("Expected {} fields, saw {}", width, record.len()),
                });
            }
        }

        let kinds: Vec<ColumnKind> = (0..width)
            .map(|col| {
                if options.auto_detect_types {
                    Self::infer_column(&records, col, options)
                } else {
                    ColumnKind::Text
                }
            })
            .collect();

        let mut sheet = SheetRows::new("Sheet1");
        sheet.push_row(header.into_iter().map(|name| CellValue::string(name)).collect());

        let mut pool = StringPool::new();
        for record in &records {
            let cells = record
                .iter()
                .zip(&kinds)
                .map(|(field, kind)| Self::convert(field, *kind, options, &mut pool))
                .collect();
            sheet.push_row(cells);
        }

        log::debug!(
            "decoded {} CSV records across {} columns",
            records.len(),
            width
        );

        Ok(Table::from_sheet(sheet, BlankRows::Keep))
    }

    fn is_na(field: &str, options: &CsvReadOptions) -> bool {
        options.na_values.iter().any(|na| na == field)
    }

    fn parse_bool(field: &str) -> Option<bool> {
        if field.eq_ignore_ascii_case("true") {
            Some(true)
        } else if field.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    /// Pick the narrowest type every non-missing field in the column fits
    fn infer_column(
        records: &[csv::StringRecord],
        col: usize,
        options: &CsvReadOptions,
    ) -> ColumnKind {
        let mut numeric = true;
        let mut boolean = true;
        let mut seen_value = false;

        for field in records.iter().filter_map(|r| r.get(col)) {
            if Self::is_na(field, options) {
                continue;
            }
            seen_value = true;
            let trimmed = field.trim();
            numeric = numeric && trimmed.parse::<f64>().is_ok();
            boolean = boolean && Self::parse_bool(trimmed).is_some();
            if !numeric && !boolean {
                return ColumnKind::Text;
            }
        }

        match (seen_value, numeric, boolean) {
            (false, _, _) => ColumnKind::Text,
            (true, true, _) => ColumnKind::Number,
            (true, false, true) => ColumnKind::Boolean,
            _ => ColumnKind::Text,
        }
    }

    fn convert(
        field: &str,
        kind: ColumnKind,
        options: &CsvReadOptions,
        pool: &mut StringPool,
    ) -> CellValue {
        if !options.auto_detect_types {
            return CellValue::String(pool.intern(field));
        }
        if Self::is_na(field, options) {
            return CellValue::Empty;
        }

        match kind {
            ColumnKind::Number => field
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or(CellValue::Empty),
            ColumnKind::Boolean => Self::parse_bool(field.trim())
                .map(CellValue::Boolean)
                .unwrap_or(CellValue::Empty),
            ColumnKind::Text => CellValue::String(pool.intern(field)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(text: &str) -> CsvResult<Table> {
        CsvReader::read(text.as_bytes(), &CsvReadOptions::default())
    }

    #[test]
    fn test_infers_types_per_column() {
        let table = read("id,name,flag,code\n1,Ann,true,7\n2,Bob,FALSE,x\n").unwrap();

        assert_eq!(table.columns(), &["id", "name", "flag", "code"]);
        assert_eq!(
            table.rows()[0],
            vec![
                CellValue::Number(1.0),
                CellValue::string("Ann"),
                CellValue::Boolean(true),
                CellValue::string("7"),
            ]
        );
        assert_eq!(table.rows()[1][2], CellValue::Boolean(false));
    }

    #[test]
    fn test_missing_values_become_empty() {
        let table = read("a,b\n1,\nNA,x\n3,null\n").unwrap();
        assert_eq!(table.rows()[0][1], CellValue::Empty);
        assert_eq!(table.rows()[1][0], CellValue::Empty);
        assert_eq!(table.rows()[2][1], CellValue::Empty);
        assert_eq!(table.rows()[2][0], CellValue::Number(3.0));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = read("a,b,c\n1\n").unwrap();
        assert_eq!(
            table.rows()[0],
            vec![CellValue::Number(1.0), CellValue::Empty, CellValue::Empty]
        );
    }

    #[test]
    fn test_long_row_is_an_error() {
        let err = read("a,b\n1,2\n1,2,3\n").unwrap_err();
        match err {
            CsvError::Parse { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        assert!(matches!(read(""), Err(CsvError::NoColumns)));
    }

    #[test]
    fn test_header_only() {
        let table = read("a,b\n").unwrap();
        assert_eq!(table.shape(), (0, 2));
    }

    #[test]
    fn test_bom_and_quoted_fields() {
        let table = read("\u{feff}id,text\n1,\"hello, \"\"world\"\"\"\n").unwrap();
        assert_eq!(table.columns()[0], "id");
        assert_eq!(table.rows()[0][1], CellValue::string("hello, \"world\""));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = read("x,,x\n1,2,3\n").unwrap();
        assert_eq!(table.columns(), &["x", "Unnamed: 1", "x.1"]);
    }

    #[test]
    fn test_without_header() {
        let options = CsvReadOptions {
            has_header: false,
            ..Default::default()
        };
        let table = CsvReader::read("1,2\n3,4\n".as_bytes(), &options).unwrap();
        assert_eq!(table.columns(), &["0", "1"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_type_detection_off() {
        let options = CsvReadOptions {
            auto_detect_types: false,
            ..Default::default()
        };
        let table = CsvReader::read("a\n1\n\n".as_bytes(), &options).unwrap();
        assert_eq!(table.rows()[0][0], CellValue::string("1"));
    }
}
