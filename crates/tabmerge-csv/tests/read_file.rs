//! Reading CSV files from disk

use std::io::Write;

use pretty_assertions::assert_eq;
use tabmerge_core::CellValue;
use tabmerge_csv::{CsvError, CsvReadOptions, CsvReader};
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_read_file_with_crlf_and_semicolons() {
    let file = write_temp("sku;price;active\r\nA-1;9.5;true\r\nA-2;;false\r\n");
    let options = CsvReadOptions {
        delimiter: b';',
        ..Default::default()
    };

    let table = CsvReader::read_file(file.path(), &options).unwrap();

    assert_eq!(table.columns(), &["sku", "price", "active"]);
    assert_eq!(table.shape(), (2, 3));
    assert_eq!(
        table.rows()[0],
        vec![
            CellValue::string("A-1"),
            CellValue::Number(9.5),
            CellValue::Boolean(true),
        ]
    );
    assert_eq!(table.rows()[1][1], CellValue::Empty);
}

#[test]
fn test_read_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = CsvReader::read_file(dir.path().join("absent.csv"), &CsvReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, CsvError::Io(_)));
}

#[test]
fn test_read_file_keeps_blank_data_rows() {
    let file = write_temp("a,b\n1,2\n,\n3,4\n");
    let table = CsvReader::read_file(file.path(), &CsvReadOptions::default()).unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows()[1], vec![CellValue::Empty, CellValue::Empty]);
}
