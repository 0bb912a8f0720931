//! Format detection and decoding of uploaded files

use std::fs;
use std::io::{self, Cursor};
use std::path::Path;

use tabmerge_core::{BlankRows, SheetRows, Table};
use tabmerge_csv::{CsvReadOptions, CsvReader};
use tabmerge_xls::XlsReader;
use tabmerge_xlsx::XlsxReader;

use crate::error::ReadError;
use crate::xlsb;

/// Magic bytes at the start of every zip container
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A file as handed to the pipeline: its name and raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Load a file from disk, named by its final path component
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Input formats, picked by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    /// `.xlsx` and `.xlsm`
    Xlsx,
    Xls,
    Xlsb,
}

impl Format {
    /// Detect the format from a file name's extension, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Format::Csv),
            "xlsx" | "xlsm" => Some(Format::Xlsx),
            "xls" => Some(Format::Xls),
            "xlsb" => Some(Format::Xlsb),
            _ => None,
        }
    }
}

/// Decode one uploaded file into a table.
///
/// Spreadsheets are read from their first sheet, with the first row as the
/// header and all-empty rows dropped.
pub fn read(file: &UploadedFile) -> Result<Table, ReadError> {
    let result = decode(file);
    if let Err(err) = &result {
        log::warn!("{}", err);
    }
    result
}

fn decode(file: &UploadedFile) -> Result<Table, ReadError> {
    let format = Format::from_name(&file.name).ok_or_else(|| ReadError::UnsupportedFormat {
        name: file.name.clone(),
    })?;
    let decode_error = |message: String| ReadError::Decode {
        name: file.name.clone(),
        message,
    };

    let sheet: SheetRows = match format {
        Format::Csv => {
            let table = CsvReader::read(file.bytes.as_slice(), &CsvReadOptions::default())
                .map_err(|e| decode_error(e.to_string()))?;
            log_decoded(file, &table);
            return Ok(table);
        }
        Format::Xlsx => read_xlsx(&file.bytes).map_err(decode_error)?,
        Format::Xls if file.bytes.starts_with(ZIP_MAGIC) => {
            log::debug!("{} is a zip container, reading it as xlsx", file.name);
            read_xlsx(&file.bytes).map_err(decode_error)?
        }
        Format::Xls => XlsReader::read(Cursor::new(file.bytes.as_slice()))
            .map_err(|e| decode_error(e.to_string()))?,
        Format::Xlsb => {
            xlsb::read_first_sheet(&file.bytes).map_err(|e| decode_error(e.to_string()))?
        }
    };

    let table = Table::from_sheet(sheet, BlankRows::Skip);
    log_decoded(file, &table);
    Ok(table)
}

fn read_xlsx(bytes: &[u8]) -> Result<SheetRows, String> {
    XlsxReader::read(Cursor::new(bytes)).map_err(|e| e.to_string())
}

fn log_decoded(file: &UploadedFile, table: &Table) {
    let (rows, columns) = table.shape();
    log::debug!("read {}: {} rows x {} columns", file.name, rows, columns);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabmerge_core::CellValue;
    use tabmerge_xlsx::XlsxWriter;

    #[test]
    fn test_format_from_name() {
        assert_eq!(Format::from_name("a.csv"), Some(Format::Csv));
        assert_eq!(Format::from_name("A.XLSX"), Some(Format::Xlsx));
        assert_eq!(Format::from_name("macro.Xlsm"), Some(Format::Xlsx));
        assert_eq!(Format::from_name("old.xls"), Some(Format::Xls));
        assert_eq!(Format::from_name("bin.xlsb"), Some(Format::Xlsb));
        assert_eq!(Format::from_name("notes.txt"), None);
        assert_eq!(Format::from_name("csv"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read(&UploadedFile::new("notes.txt", b"a,b\n1,2\n".to_vec())).unwrap_err();
        assert_eq!(
            err,
            ReadError::UnsupportedFormat {
                name: "notes.txt".into()
            }
        );
        assert_eq!(err.to_string(), "Unsupported file format: notes.txt");
    }

    #[test]
    fn test_reads_csv() {
        let table = read(&UploadedFile::new("a.CSV", b"id,name\n1,x\n".to_vec())).unwrap();
        assert_eq!(table.columns(), &["id", "name"]);
        assert_eq!(
            table.rows()[0],
            vec![CellValue::Number(1.0), CellValue::string("x")]
        );
    }

    #[test]
    fn test_decode_error_names_the_file() {
        let err = read(&UploadedFile::new("broken.xlsx", b"not a zip".to_vec())).unwrap_err();
        match err {
            ReadError::Decode { name, message } => {
                assert_eq!(name, "broken.xlsx");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_xls_holding_a_zip_is_read_as_xlsx() {
        let table = Table::from_rows(
            vec!["id".into()],
            vec![vec![CellValue::Number(7.0)]],
        )
        .unwrap();
        let bytes = XlsxWriter::table_to_bytes(&table).unwrap();

        let read_back = read(&UploadedFile::new("mislabelled.xls", bytes)).unwrap();
        assert_eq!(read_back, table);
    }

    #[test]
    fn test_spreadsheet_blank_rows_are_dropped() {
        let mut sheet = SheetRows::new("Sheet1");
        sheet.push_row(vec!["a".into(), "b".into()]);
        sheet.push_row(vec![CellValue::Number(1.0), CellValue::Empty]);
        sheet.push_row(vec![CellValue::Empty, CellValue::Empty]);
        sheet.push_row(vec![CellValue::Number(2.0), "x".into()]);
        let mut bytes = Vec::new();
        XlsxWriter::write_sheet(&sheet, Cursor::new(&mut bytes)).unwrap();

        let table = read(&UploadedFile::new("gaps.xlsx", bytes)).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1], CellValue::string("x"));
    }

    #[test]
    fn test_header_below_blank_rows() {
        let mut sheet = SheetRows::new("Sheet1");
        sheet.set(2, 0, "id".into()).unwrap();
        sheet.set(2, 1, "name".into()).unwrap();
        sheet.set(3, 0, CellValue::Number(1.0)).unwrap();
        sheet.set(3, 1, "x".into()).unwrap();
        let mut bytes = Vec::new();
        XlsxWriter::write_sheet(&sheet, Cursor::new(&mut bytes)).unwrap();

        let table = read(&UploadedFile::new("offset.xlsx", bytes)).unwrap();
        assert_eq!(table.columns(), &["id", "name"]);
        assert_eq!(
            table.rows(),
            &[vec![CellValue::Number(1.0), CellValue::string("x")]]
        );
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("north.csv");
        std::fs::write(&path, b"region,units\nnorth,3\n").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "north.csv");
        assert_eq!(file.bytes, b"region,units\nnorth,3\n");

        let table = read(&file).unwrap();
        assert_eq!(table.columns(), &["region", "units"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UploadedFile::from_path(dir.path().join("gone.csv")).is_err());
    }
}
