//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use tabmerge_core::{CellAddress, CellError, CellValue, SharedString, SheetRows, StringPool};

/// A sheet entry from `xl/workbook.xml`
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    r_id: String,
}

/// Attributes of the `<c>` element being read
#[derive(Debug, Default)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    value: String,
    has_value: bool,
    inline_text: String,
}

/// XLSX file reader.
///
/// Only cell values are decoded. Styles, formulas, comments and the other
/// workbook parts are skipped.
pub struct XlsxReader;

impl XlsxReader {
    /// Read the first sheet of a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<SheetRows> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read the first sheet of a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<SheetRows> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let sheets = Self::read_workbook_xml(&mut archive)?;
        let first = sheets
            .into_iter()
            .next()
            .ok_or_else(|| XlsxError::InvalidFormat("Workbook has no sheets".into()))?;

        let sheet_paths = Self::read_workbook_rels(&mut archive)?;
        let path = sheet_paths
            .get(&first.r_id)
            .cloned()
            .ok_or_else(|| XlsxError::MissingPart(format!("worksheet for {}", first.r_id)))?;

        let shared_strings = Self::read_shared_strings(&mut archive)?;

        let mut sheet = SheetRows::new(first.name);
        Self::read_worksheet(&mut archive, &path, &mut sheet, &shared_strings)?;

        log::debug!(
            "read sheet '{}' from {}: {} rows",
            sheet.name(),
            path,
            sheet.len()
        );
        Ok(sheet)
    }

    /// Names of every sheet, in workbook order
    pub fn sheet_names<R: Read + Seek>(reader: R) -> XlsxResult<Vec<String>> {
        let mut archive = zip::ZipArchive::new(reader)?;
        Ok(Self::read_workbook_xml(&mut archive)?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SharedString>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut pool = StringPool::new();
        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs (`rPh`) repeat the text in another script.
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(pool.intern(""));
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(pool.intern(decode_excel_escapes(&current)));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::CData(e)) if in_t => {
                    current.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetEntry>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = attr
                                    .decode_and_unescape_value(&xml_reader)
                                    .ok()
                                    .map(|s| s.to_string());
                            }
                            b"r:id" => {
                                r_id = attr
                                    .decode_and_unescape_value(&xml_reader)
                                    .ok()
                                    .map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push(SheetEntry { name, r_id });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to map rIds to worksheet part paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .decode_and_unescape_value(&xml_reader)
                            .ok()
                            .map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            b"Type" => rel_type = value,
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            rels.insert(id, Self::resolve_target(&target));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Relationship targets are relative to `xl/` unless absolute
    fn resolve_target(target: &str) -> String {
        match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target.trim_start_matches("./")),
        }
    }

    /// Read the cell values of one worksheet part
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        sheet: &mut SheetRows,
        shared_strings: &[SharedString],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut pool = StringPool::new();

        // Positions used when `r` attributes are absent.
        let mut next_row: u32 = 0;
        let mut next_col: u16 = 0;

        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        let row = Self::row_number(&e, &xml_reader)?.unwrap_or(next_row);
                        next_row = row;
                        next_col = 0;
                    }
                    b"c" => {
                        let (row, col, cell_type) = Self::cell_position(&e, &xml_reader, next_row, next_col)?;
                        next_col = col.saturating_add(1);
                        cell = Some(PendingCell {
                            row,
                            col,
                            cell_type,
                            ..Default::default()
                        });
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"is" if cell.is_some() => in_inline_str = true,
                    b"rPh" if in_inline_str => in_phonetic = true,
                    b"t" if in_inline_str && !in_phonetic => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        let row = Self::row_number(&e, &xml_reader)?.unwrap_or(next_row);
                        next_row = row.saturating_add(1);
                        next_col = 0;
                    }
                    b"c" => {
                        // `<c r="B2"/>`: present, no value.
                        let (row, col, _) = Self::cell_position(&e, &xml_reader, next_row, next_col)?;
                        next_col = col.saturating_add(1);
                        sheet.set(row, col, CellValue::Empty)?;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"row" => {
                        next_row = next_row.saturating_add(1);
                        next_col = 0;
                    }
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            let value = Self::cell_value(&pending, shared_strings, &mut pool)?;
                            sheet.set(pending.row, pending.col, value)?;
                        }
                        in_value = false;
                        in_inline_str = false;
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"rPh" => in_phonetic = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Some(pending) = cell.as_mut() {
                        let text = e.unescape()?;
                        if in_value {
                            pending.value.push_str(&text);
                            pending.has_value = true;
                        } else {
                            pending.inline_text.push_str(&text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    /// The 0-based row index from a `<row r="...">` element
    fn row_number<B>(e: &BytesStart<'_>, xml_reader: &Reader<B>) -> XlsxResult<Option<u32>> {
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"r" {
                let text = attr.decode_and_unescape_value(xml_reader)?;
                let r: u32 = text
                    .parse()
                    .map_err(|_| XlsxError::Parse(format!("Invalid row number '{}'", text)))?;
                if r == 0 {
                    return Err(XlsxError::Parse("Row number 0".into()));
                }
                return Ok(Some(r - 1));
            }
        }
        Ok(None)
    }

    /// Position and type of a `<c>` element, falling back to the next
    /// sequential position when `r` is absent
    fn cell_position<B>(
        e: &BytesStart<'_>,
        xml_reader: &Reader<B>,
        next_row: u32,
        next_col: u16,
    ) -> XlsxResult<(u32, u16, Option<String>)> {
        let mut row = next_row;
        let mut col = next_col;
        let mut cell_type = None;

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    let text = attr.decode_and_unescape_value(xml_reader)?;
                    let addr = CellAddress::parse(&text).map_err(|err| {
                        XlsxError::Parse(format!("Invalid cell reference '{}': {}", text, err))
                    })?;
                    row = addr.row;
                    col = addr.col;
                }
                b"t" => {
                    cell_type = Some(attr.decode_and_unescape_value(xml_reader)?.to_string());
                }
                _ => {}
            }
        }

        Ok((row, col, cell_type))
    }

    fn cell_value(
        cell: &PendingCell,
        shared_strings: &[SharedString],
        pool: &mut StringPool,
    ) -> XlsxResult<CellValue> {
        if cell.cell_type.as_deref() == Some("inlineStr") {
            return Ok(CellValue::String(
                pool.intern(decode_excel_escapes(&cell.inline_text)),
            ));
        }
        if !cell.has_value {
            return Ok(CellValue::Empty);
        }

        let value = cell.value.as_str();
        let cell_value = match cell.cell_type.as_deref() {
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::String(s.clone())
            }

            Some("b") => CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),

            Some("e") => CellError::parse(value)
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::String(pool.intern(value))),

            // Formula string result
            Some("str") => CellValue::String(pool.intern(decode_excel_escapes(value))),

            None | Some("n") => match value.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(pool.intern(value)),
            },

            // ISO 8601 dates (`t="d"`) and anything unknown stay text
            Some(_) => CellValue::String(pool.intern(value)),
        };

        Ok(cell_value)
    }
}
