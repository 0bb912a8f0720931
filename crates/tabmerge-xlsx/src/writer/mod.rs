//! XLSX writer

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{XlsxError, XlsxResult};
use crate::escape::escape_xml;
use tabmerge_core::{CellAddress, CellValue, SheetRows, Table, MAX_COLS, MAX_ROWS};

/// Name of the sheet holding an exported table
pub const TABLE_SHEET_NAME: &str = "Sheet1";

/// XLSX file writer.
///
/// Output is a minimal single-sheet workbook with inline strings and no
/// shared string table. Every zip entry carries the same fixed timestamp,
/// so identical input produces identical bytes.
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a table to a file path
    pub fn write_file<P: AsRef<Path>>(table: &Table, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write_table(table, file)
    }

    /// Serialize a table into an in-memory workbook
    pub fn table_to_bytes(table: &Table) -> XlsxResult<Vec<u8>> {
        let mut buf = Vec::new();
        Self::write_table(table, Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Write a table as sheet `Sheet1`: one header row of column names, then
    /// one row per table row
    pub fn write_table<W: Write + Seek>(table: &Table, writer: W) -> XlsxResult<()> {
        let header: Vec<CellValue> = table
            .columns()
            .iter()
            .map(|name| CellValue::string(name.as_str()))
            .collect();
        let rows = std::iter::once(header.as_slice()).chain(table.rows().iter().map(Vec::as_slice));
        Self::write_parts(TABLE_SHEET_NAME, rows, writer)
    }

    /// Write raw sheet rows exactly as given, without adding a header
    pub fn write_sheet<W: Write + Seek>(sheet: &SheetRows, writer: W) -> XlsxResult<()> {
        let name = if sheet.name().is_empty() {
            TABLE_SHEET_NAME
        } else {
            sheet.name()
        };
        Self::write_parts(name, sheet.rows().iter().map(Vec::as_slice), writer)
    }

    fn file_options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
    }

    fn write_parts<'a, W, I>(sheet_name: &str, rows: I, writer: W) -> XlsxResult<()>
    where
        W: Write + Seek,
        I: Iterator<Item = &'a [CellValue]>,
    {
        let mut zip = zip::ZipWriter::new(writer);

        Self::write_content_types(&mut zip)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, sheet_name)?;
        Self::write_workbook_rels(&mut zip)?;
        Self::write_styles_xml(&mut zip)?;
        let written = Self::write_worksheet(&mut zip, rows)?;

        zip.finish()?;
        log::debug!("wrote sheet '{}' with {} rows", sheet_name, written);
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        zip.start_file("[Content_Types].xml", Self::file_options())?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        zip.start_file("_rels/.rels", Self::file_options())?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet_name: &str,
    ) -> XlsxResult<()> {
        zip.start_file("xl/workbook.xml", Self::file_options())?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>
        <sheet name="{}" sheetId="1" r:id="rId1"/>
    </sheets>
</workbook>"#,
            escape_xml(sheet_name)
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        zip.start_file("xl/_rels/workbook.xml.rels", Self::file_options())?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// The single default style every cell uses
    fn write_styles_xml<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        zip.start_file("xl/styles.xml", Self::file_options())?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Stream the sheet part one row at a time; returns the number of rows
    fn write_worksheet<'a, W, I>(zip: &mut zip::ZipWriter<W>, rows: I) -> XlsxResult<usize>
    where
        W: Write + Seek,
        I: Iterator<Item = &'a [CellValue]>,
    {
        zip.start_file("xl/worksheets/sheet1.xml", Self::file_options())?;

        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <sheetData>"#,
        )?;

        let mut line = String::new();
        let mut count = 0;
        for (row_idx, cells) in rows.enumerate() {
            let row = u32::try_from(row_idx)
                .ok()
                .filter(|r| *r < MAX_ROWS)
                .ok_or(XlsxError::TooManyRows)?;
            if cells.len() > MAX_COLS as usize {
                return Err(XlsxError::TooManyColumns {
                    row: row + 1,
                    columns: cells.len(),
                });
            }
            count += 1;
            line.clear();
            for (col_idx, cell) in cells.iter().enumerate() {
                let cell_ref = CellAddress::new(row, col_idx as u16).to_a1_string();
                Self::push_cell(&mut line, &cell_ref, cell);
            }
            if line.is_empty() {
                continue;
            }
            zip.write_all(format!("\n        <row r=\"{}\">", row + 1).as_bytes())?;
            zip.write_all(line.as_bytes())?;
            zip.write_all(b"</row>")?;
        }

        zip.write_all(b"\n    </sheetData>\n</worksheet>")?;
        Ok(count)
    }

    fn push_cell(out: &mut String, cell_ref: &str, value: &CellValue) {
        match value {
            CellValue::Number(n) if n.is_finite() => {
                out.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", cell_ref, n));
            }
            CellValue::String(s) => {
                out.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    cell_ref,
                    escape_xml(s.as_str())
                ));
            }
            CellValue::Boolean(b) => {
                out.push_str(&format!(
                    "<c r=\"{}\" t=\"b\"><v>{}</v></c>",
                    cell_ref,
                    if *b { 1 } else { 0 }
                ));
            }
            CellValue::Error(e) => {
                out.push_str(&format!(
                    "<c r=\"{}\" t=\"e\"><v>{}</v></c>",
                    cell_ref,
                    escape_xml(e.as_str())
                ));
            }
            // Empty cells and non-finite numbers have no representation
            CellValue::Number(_) | CellValue::Empty => {}
        }
    }
}
