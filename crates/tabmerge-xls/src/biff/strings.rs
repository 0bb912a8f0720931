//! BIFF8 Unicode string decoding.
//!
//! BIFF8 strings have a complex encoding:
//! - Header: char_count (2 bytes) + flags (1 byte)
//! - Flags bit 0 (`fHighByte`): 0 = compressed Latin-1, 1 = uncompressed UTF-16LE
//! - Flags bit 2 (`fExtSt`): extended string data follows (Asian phonetic)
//! - Flags bit 3 (`fRichSt`): rich text run array follows
//! - If fRichSt: 2-byte run count follows the flags
//! - If fExtSt: 4-byte extended data size follows
//! - Then the character data
//! - Then the rich text runs (4 bytes each) if fRichSt
//! - Then the extended data if fExtSt
//!
//! In SST records, the character data of one string can span a CONTINUE
//! boundary. The continuation then starts with a fresh flags byte that may
//! switch between compressed and uncompressed characters.

use super::parser::RecordReader;
use crate::error::{XlsError, XlsResult};

const HIGH_BYTE: u8 = 0x01;
const EXT_ST: u8 = 0x04;
const RICH_ST: u8 = 0x08;

/// Read a BIFF8 "short" string (1-byte length prefix, used in BOUNDSHEET).
pub fn read_short_string(reader: &mut RecordReader<'_>) -> XlsResult<String> {
    let char_count = reader.u8()? as usize;
    let flags = reader.u8()?;
    let mut units = Vec::with_capacity(char_count);
    read_units(reader, char_count, flags & HIGH_BYTE != 0, &mut units)?;
    utf16(&units)
}

/// Read a BIFF8 Unicode string with a 2-byte length prefix (LABEL, STRING).
///
/// The string must lie entirely within one record body.
pub fn read_unicode_string(reader: &mut RecordReader<'_>) -> XlsResult<String> {
    let char_count = reader.u16()? as usize;
    let flags = reader.u8()?;
    let run_count = if flags & RICH_ST != 0 { reader.u16()? } else { 0 };
    let ext_size = if flags & EXT_ST != 0 { reader.u32()? } else { 0 };

    let mut units = Vec::with_capacity(char_count);
    read_units(reader, char_count, flags & HIGH_BYTE != 0, &mut units)?;

    reader.skip(run_count as usize * 4 + ext_size as usize);
    utf16(&units)
}

/// Append `count` characters as UTF-16 code units
fn read_units(
    reader: &mut RecordReader<'_>,
    count: usize,
    wide: bool,
    units: &mut Vec<u16>,
) -> XlsResult<()> {
    if wide {
        let bytes = reader.bytes(count * 2)?;
        units.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
        );
    } else {
        // Compressed: the high byte of each UTF-16 unit is zero
        units.extend(reader.bytes(count)?.iter().map(|&b| b as u16));
    }
    Ok(())
}

fn utf16(units: &[u16]) -> XlsResult<String> {
    String::from_utf16(units).map_err(|e| XlsError::Parse(format!("invalid UTF-16 string: {e}")))
}

/// Parse the SST (Shared String Table) body, with CONTINUE bodies merged in
/// and `continue_offsets` marking where each one starts.
///
/// The SST body starts with:
/// - `total_strings` (4 bytes, u32) - total string refs in workbook
/// - `unique_strings` (4 bytes, u32) - number of unique strings in this table
/// - Then `unique_strings` Unicode string entries
pub fn parse_sst(data: &[u8], continue_offsets: &[usize]) -> XlsResult<Vec<String>> {
    let mut reader = RecordReader::new(data);

    let _total_strings = reader.u32()?;
    let unique_count = reader.u32()? as usize;

    // Cap the pre-allocation; the count comes from the file.
    let mut strings = Vec::with_capacity(unique_count.min(1 << 16));

    for i in 0..unique_count {
        match read_sst_string(&mut reader, continue_offsets) {
            Ok(s) => strings.push(s),
            Err(e) => {
                // Some writers pad or truncate the table; keep what decoded.
                log::warn!("SST parse error at string {i}/{unique_count}: {e}");
                break;
            }
        }
    }

    Ok(strings)
}

/// Read one SST entry, switching encoding at CONTINUE boundaries
fn read_sst_string(reader: &mut RecordReader<'_>, breaks: &[usize]) -> XlsResult<String> {
    let char_count = reader.u16()? as usize;
    let flags = reader.u8()?;
    let run_count = if flags & RICH_ST != 0 { reader.u16()? } else { 0 };
    let ext_size = if flags & EXT_ST != 0 { reader.u32()? } else { 0 };

    let mut wide = flags & HIGH_BYTE != 0;
    let mut units = Vec::with_capacity(char_count);
    let mut remaining = char_count;

    while remaining > 0 {
        let pos = reader.position();
        if breaks.binary_search(&pos).is_ok() {
            wide = reader.u8()? & HIGH_BYTE != 0;
        }

        let pos = reader.position();
        let segment_end = breaks
            .iter()
            .copied()
            .find(|&b| b > pos)
            .unwrap_or(pos + reader.remaining());
        let width = if wide { 2 } else { 1 };
        let take = remaining.min((segment_end - pos) / width);
        if take == 0 {
            return Err(XlsError::Parse(format!(
                "string character data truncated at offset {pos}"
            )));
        }

        read_units(reader, take, wide, &mut units)?;
        remaining -= take;
    }

    reader.skip(run_count as usize * 4 + ext_size as usize);
    utf16(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_compressed_string() {
        let data = [0x03, 0x00, 0x00, b'A', b'B', b'C'];
        let mut reader = RecordReader::new(&data);
        assert_eq!(read_unicode_string(&mut reader).unwrap(), "ABC");
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn test_read_wide_string() {
        let data = [0x02, 0x00, 0x01, b'H', 0x00, b'i', 0x00];
        let mut reader = RecordReader::new(&data);
        assert_eq!(read_unicode_string(&mut reader).unwrap(), "Hi");
        assert_eq!(reader.position(), 7);
    }

    #[test]
    fn test_read_rich_string_skips_runs() {
        // "Ab" with one formatting run, followed by a trailing byte
        let data = [0x02, 0x00, 0x08, 0x01, 0x00, b'A', b'b', 0, 0, 1, 0, 0xEE];
        let mut reader = RecordReader::new(&data);
        assert_eq!(read_unicode_string(&mut reader).unwrap(), "Ab");
        assert_eq!(reader.u8().unwrap(), 0xEE);
    }

    #[test]
    fn test_read_short_string() {
        let data = [0x02, 0x00, b'O', b'K'];
        let mut reader = RecordReader::new(&data);
        assert_eq!(read_short_string(&mut reader).unwrap(), "OK");
    }

    #[test]
    fn test_parse_sst() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        buf.extend_from_slice(&[0x02, 0x00, 0x00, b'B', b'C']);

        assert_eq!(parse_sst(&buf, &[]).unwrap(), vec!["A", "BC"]);
    }

    #[test]
    fn test_parse_sst_across_continue() {
        // "Hello" split after "He"; the continuation switches to UTF-16.
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&[0x05, 0x00, 0x00, b'H', b'e']);
        let split = buf.len();
        buf.push(0x01);
        for ch in "llö".encode_utf16() {
            buf.extend_from_slice(&ch.to_le_bytes());
        }

        assert_eq!(parse_sst(&buf, &[split]).unwrap(), vec!["Hellö"]);
    }

    #[test]
    fn test_parse_sst_string_starting_at_continue() {
        // A new string at a boundary has no extra flags byte.
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        let split = buf.len();
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'B']);

        assert_eq!(parse_sst(&buf, &[split]).unwrap(), vec!["A", "B"]);
    }
}
