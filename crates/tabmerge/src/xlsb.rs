//! Binary workbook (`.xlsb`) decoding through calamine

use std::io::Cursor;

use calamine::{CellErrorType, Data, Reader, Xlsb};
use tabmerge_core::{CellError, CellValue, SheetRows};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum XlsbReadError {
    #[error(transparent)]
    Xlsb(#[from] calamine::XlsbError),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error(transparent)]
    Core(#[from] tabmerge_core::Error),
}

/// Read the first sheet of a binary workbook
pub(crate) fn read_first_sheet(bytes: &[u8]) -> Result<SheetRows, XlsbReadError> {
    let mut workbook: Xlsb<_> = Xlsb::new(Cursor::new(bytes))?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(XlsbReadError::NoSheets)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(XlsbReadError::NoSheets)??;

    let mut sheet = SheetRows::new(name);
    let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
    for (row, col, data) in range.used_cells() {
        let value = convert(data);
        if value.is_empty() {
            continue;
        }
        let col = u16::try_from(col as u32 + col_offset).unwrap_or(u16::MAX);
        sheet.set(row as u32 + row_offset, col, value)?;
    }

    log::debug!("decoded {} xlsb rows from '{}'", sheet.len(), sheet.name());
    Ok(sheet)
}

fn convert(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::string(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::string(s.as_str()),
        Data::Error(e) => CellValue::Error(cell_error(e)),
    }
}

fn cell_error(e: &CellErrorType) -> CellError {
    match e {
        CellErrorType::Div0 => CellError::Div0,
        CellErrorType::NA => CellError::Na,
        CellErrorType::Name => CellError::Name,
        CellErrorType::Null => CellError::Null,
        CellErrorType::Num => CellError::Num,
        CellErrorType::Ref => CellError::Ref,
        CellErrorType::Value => CellError::Value,
        CellErrorType::GettingData => CellError::GettingData,
    }
}
