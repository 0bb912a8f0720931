//! XLS (BIFF8) reader.
//!
//! Opens a Compound File Binary (CFB/OLE2) container, reads the `Workbook`
//! stream, parses BIFF8 records, and collects the cell values of the first
//! worksheet into [`SheetRows`].

use std::io::{Read, Seek};
use std::path::Path;

use tabmerge_core::{CellError, CellValue, SheetRows, StringPool};

use crate::biff::parser::RecordReader;
use crate::biff::records;
use crate::biff::strings::{parse_sst, read_short_string, read_unicode_string};
use crate::biff::{self, BiffRecord};
use crate::error::{XlsError, XlsResult};

/// XLS file reader.
pub struct XlsReader;

/// Metadata for a sheet parsed from the BOUNDSHEET record.
#[derive(Debug)]
struct SheetInfo {
    /// Absolute byte offset of the sheet's BOF in the Workbook stream.
    offset: u32,
    /// Sheet type: 0 = worksheet, 2 = chart, 6 = macro/VBA.
    sheet_type: u8,
    name: String,
}

/// What the workbook globals substream tells us
#[derive(Debug, Default)]
struct Globals {
    sst: Vec<String>,
    sheets: Vec<SheetInfo>,
    /// Index of the globals EOF record
    end: usize,
}

impl XlsReader {
    /// Read the first worksheet of an XLS file from a filesystem path.
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<SheetRows> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file)
    }

    /// Read the first worksheet of an XLS file from any `Read + Seek` source.
    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<SheetRows> {
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // BIFF5 and earlier store a "Book" stream instead.
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            return Err(XlsError::UnsupportedVersion(
                "BIFF5 workbook (Book stream)".into(),
            ));
        } else {
            return Err(XlsError::InvalidFormat(
                "no Workbook stream found in CFB".into(),
            ));
        };

        let mut stream_data = Vec::new();
        {
            let mut stream = cfb.open_stream(stream_path)?;
            stream.read_to_end(&mut stream_data)?;
        }

        let all_records = biff::read_all_records(&stream_data)?;
        let globals = Self::parse_globals(&all_records)?;

        let info = globals
            .sheets
            .iter()
            .find(|info| info.sheet_type == records::SHEET_TYPE_WORKSHEET)
            .ok_or_else(|| XlsError::InvalidFormat("workbook has no worksheets".into()))?;

        let sheet_records = Self::sheet_substream(&all_records, &globals, info)?;

        let mut sheet = SheetRows::new(info.name.clone());
        Self::parse_sheet_records(sheet_records, &mut sheet, &globals.sst)?;

        log::debug!(
            "read XLS sheet '{}': {} rows, {} shared strings",
            sheet.name(),
            sheet.len(),
            globals.sst.len()
        );
        Ok(sheet)
    }

    /// Walk the workbook globals substream up to its EOF
    fn parse_globals(all_records: &[BiffRecord]) -> XlsResult<Globals> {
        let first = all_records
            .first()
            .ok_or_else(|| XlsError::InvalidFormat("empty Workbook stream".into()))?;
        if first.record_type != records::BOF {
            return Err(XlsError::InvalidFormat(
                "Workbook stream does not start with BOF".into(),
            ));
        }
        let (version, dt) = biff::parse_bof(&first.data)?;
        if version != records::BIFF8_VERSION {
            return Err(XlsError::UnsupportedVersion(format!(
                "expected BIFF8 (0x0600), got 0x{version:04X}"
            )));
        }
        if dt != records::BOF_WORKBOOK_GLOBALS {
            return Err(XlsError::InvalidFormat(format!(
                "first substream is 0x{dt:04X}, not workbook globals"
            )));
        }

        let mut globals = Globals::default();
        for (idx, rec) in all_records.iter().enumerate().skip(1) {
            match rec.record_type {
                records::EOF => {
                    globals.end = idx;
                    return Ok(globals);
                }
                records::SST => {
                    globals.sst = parse_sst(&rec.data, &rec.continue_offsets)?;
                }
                records::BOUNDSHEET => {
                    globals.sheets.push(Self::parse_boundsheet(&rec.data)?);
                }
                _ => {}
            }
        }

        Err(XlsError::InvalidFormat(
            "workbook globals have no EOF".into(),
        ))
    }

    /// Parse a BOUNDSHEET record body.
    fn parse_boundsheet(data: &[u8]) -> XlsResult<SheetInfo> {
        let mut reader = RecordReader::new(data);
        let offset = reader.u32()?;
        let _visibility = reader.u8()?;
        let sheet_type = reader.u8()?;
        let name = read_short_string(&mut reader)?;

        Ok(SheetInfo {
            offset,
            sheet_type,
            name,
        })
    }

    /// The records between a worksheet's BOF and its matching EOF.
    ///
    /// The BOF is located by the stream offset BOUNDSHEET recorded. When no
    /// record sits at that offset, the n-th substream after the globals is
    /// used, n being the sheet's position in the BOUNDSHEET list.
    fn sheet_substream<'r>(
        all_records: &'r [BiffRecord],
        globals: &Globals,
        info: &SheetInfo,
    ) -> XlsResult<&'r [BiffRecord]> {
        let by_offset = all_records
            .iter()
            .position(|r| r.record_type == records::BOF && r.stream_offset == info.offset as u64);

        let start = match by_offset {
            Some(idx) => idx,
            None => {
                let ordinal = globals
                    .sheets
                    .iter()
                    .position(|s| std::ptr::eq(s, info))
                    .unwrap_or(0);
                Self::nth_substream_start(all_records, globals.end + 1, ordinal).ok_or_else(
                    || XlsError::InvalidFormat(format!("no substream for sheet '{}'", info.name)),
                )?
            }
        };

        let (version, dt) = biff::parse_bof(&all_records[start].data)?;
        if version != records::BIFF8_VERSION || dt != records::BOF_WORKSHEET {
            return Err(XlsError::InvalidFormat(format!(
                "sheet '{}' substream is not a BIFF8 worksheet",
                info.name
            )));
        }

        // Charts embedded in a sheet nest their own BOF..EOF.
        let mut depth = 0usize;
        for (idx, rec) in all_records.iter().enumerate().skip(start) {
            match rec.record_type {
                records::BOF => depth += 1,
                records::EOF => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&all_records[start + 1..idx]);
                    }
                }
                _ => {}
            }
        }

        Err(XlsError::InvalidFormat(format!(
            "sheet '{}' substream has no EOF",
            info.name
        )))
    }

    fn nth_substream_start(all_records: &[BiffRecord], from: usize, n: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut seen = 0usize;
        for (idx, rec) in all_records.iter().enumerate().skip(from) {
            match rec.record_type {
                records::BOF => {
                    if depth == 0 {
                        if seen == n {
                            return Some(idx);
                        }
                        seen += 1;
                    }
                    depth += 1;
                }
                records::EOF => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        None
    }

    /// Collect cell values from a sheet's records.
    fn parse_sheet_records(
        records: &[BiffRecord],
        sheet: &mut SheetRows,
        sst: &[String],
    ) -> XlsResult<()> {
        let mut pool = StringPool::new();
        // The last FORMULA whose cached result is a string in a STRING record
        let mut pending_formula_cell: Option<(u32, u16)> = None;

        for rec in records {
            let mut reader = RecordReader::new(&rec.data);
            match rec.record_type {
                records::LABELSST => {
                    let (row, col) = Self::cell_header(&mut reader)?;
                    let idx = reader.u32()? as usize;
                    let text = sst.get(idx).ok_or_else(|| {
                        XlsError::Parse(format!("SST index {idx} out of bounds ({})", sst.len()))
                    })?;
                    sheet.set(row, col, CellValue::String(pool.intern(text)))?;
                    pending_formula_cell = None;
                }
                records::LABEL => {
                    let (row, col) = Self::cell_header(&mut reader)?;
                    let text = read_unicode_string(&mut reader)?;
                    sheet.set(row, col, CellValue::String(pool.intern(text)))?;
                    pending_formula_cell = None;
                }
                records::NUMBER => {
                    let (row, col) = Self::cell_header(&mut reader)?;
                    sheet.set(row, col, CellValue::Number(reader.f64()?))?;
                    pending_formula_cell = None;
                }
                records::RK => {
                    let (row, col) = Self::cell_header(&mut reader)?;
                    sheet.set(row, col, CellValue::Number(reader.rk()?))?;
                    pending_formula_cell = None;
                }
                records::MULRK => {
                    Self::parse_mulrk(&rec.data, sheet)?;
                    pending_formula_cell = None;
                }
                records::BLANK => {
                    let (row, col) = Self::cell_header(&mut reader)?;
                    sheet.set(row, col, CellValue::Empty)?;
                    pending_formula_cell = None;
                }
                records::MULBLANK => {
                    Self::parse_mulblank(&rec.data, sheet)?;
                    pending_formula_cell = None;
                }
                records::BOOLERR => {
                    let (row, col) = Self::cell_header(&mut reader)?;
                    let value = reader.u8()?;
                    let is_error = reader.u8()? != 0;
                    let cell = if is_error {
                        CellValue::Error(CellError::from_code(value))
                    } else {
                        CellValue::Boolean(value != 0)
                    };
                    sheet.set(row, col, cell)?;
                    pending_formula_cell = None;
                }
                records::FORMULA => {
                    pending_formula_cell = Self::parse_formula(&rec.data, sheet)?;
                }
                records::STRING => {
                    if let Some((row, col)) = pending_formula_cell.take() {
                        let text = read_unicode_string(&mut reader)?;
                        sheet.set(row, col, CellValue::String(pool.intern(text)))?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// row(2) + col(2) + xf(2), common to every single-cell record
    fn cell_header(reader: &mut RecordReader<'_>) -> XlsResult<(u32, u16)> {
        let row = reader.u16()? as u32;
        let col = reader.u16()?;
        let _xf = reader.u16()?;
        Ok((row, col))
    }

    /// MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
    fn parse_mulrk(data: &[u8], sheet: &mut SheetRows) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULRK record too short".into()));
        }
        let mut reader = RecordReader::new(&data[..data.len() - 2]);
        let row = reader.u16()? as u32;
        let first_col = reader.u16()?;
        let last_col = u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]]);

        let mut col = first_col;
        while reader.remaining() >= 6 && col <= last_col {
            let _xf = reader.u16()?;
            sheet.set(row, col, CellValue::Number(reader.rk()?))?;
            col += 1;
        }
        Ok(())
    }

    /// MULBLANK: row(2) + first_col(2) + [xf(2)]* + last_col(2)
    fn parse_mulblank(data: &[u8], sheet: &mut SheetRows) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULBLANK record too short".into()));
        }
        let mut reader = RecordReader::new(&data[..data.len() - 2]);
        let row = reader.u16()? as u32;
        let first_col = reader.u16()?;
        let last_col = u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]]);

        let mut col = first_col;
        while reader.remaining() >= 2 && col <= last_col {
            let _xf = reader.u16()?;
            sheet.set(row, col, CellValue::Empty)?;
            col += 1;
        }
        Ok(())
    }

    /// FORMULA: row(2) + col(2) + xf(2) + result(8) + options(2) + reserved(4) + formula_data(...)
    ///
    /// Stores the cached result. Returns the cell position when the result
    /// is a string, which arrives in the STRING record that follows.
    fn parse_formula(data: &[u8], sheet: &mut SheetRows) -> XlsResult<Option<(u32, u16)>> {
        if data.len() < 20 {
            return Err(XlsError::Parse("FORMULA record too short".into()));
        }

        let mut reader = RecordReader::new(data);
        let (row, col) = Self::cell_header(&mut reader)?;
        let result = reader.bytes(8)?;

        // Bytes 6-7 of 0xFFFF mark a non-numeric result.
        if result[6] != 0xFF || result[7] != 0xFF {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(result);
            sheet.set(row, col, CellValue::Number(f64::from_le_bytes(raw)))?;
            return Ok(None);
        }

        match result[0] {
            0x00 => {
                // Mark the cell present until the STRING record fills it.
                sheet.set(row, col, CellValue::Empty)?;
                Ok(Some((row, col)))
            }
            0x01 => {
                sheet.set(row, col, CellValue::Boolean(result[2] != 0))?;
                Ok(None)
            }
            0x02 => {
                sheet.set(row, col, CellValue::Error(CellError::from_code(result[2])))?;
                Ok(None)
            }
            // 0x03 is an empty-string result
            _ => {
                sheet.set(row, col, CellValue::Empty)?;
                Ok(None)
            }
        }
    }
}
