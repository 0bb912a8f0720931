//! BIFF8 (Binary Interchange File Format) handling.
//!
//! A BIFF8 stream is a sequence of records, each with a 4-byte header
//! (2 bytes record type + 2 bytes body length) followed by the body.
//!
//! CONTINUE records (type 0x003C) extend the body of the preceding record
//! beyond the 8224-byte per-record limit. Their bodies are merged into the
//! parent, but the merge points are kept: strings in the shared string table
//! restart their encoding flags at each one.

pub mod parser;
pub mod records;
pub mod strings;

use crate::error::{XlsError, XlsResult};

/// A single BIFF8 record (with CONTINUE bodies already merged).
#[derive(Debug)]
pub struct BiffRecord {
    /// Record type ID (e.g. `records::SST`, `records::NUMBER`).
    pub record_type: u16,
    /// Record body bytes (CONTINUE records have been concatenated).
    pub data: Vec<u8>,
    /// Offsets into `data` where a CONTINUE body starts.
    pub continue_offsets: Vec<usize>,
    /// Byte offset of this record's header in the stream.
    pub stream_offset: u64,
}

/// Split a workbook stream into records, merging CONTINUE records into
/// their parent.
pub fn read_all_records(stream: &[u8]) -> XlsResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut pos = 0usize;

    while pos + 4 <= stream.len() {
        let record_type = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
        let body_len = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
        let start = pos + 4;
        let end = start + body_len;
        if end > stream.len() {
            return Err(XlsError::Parse(format!(
                "record 0x{record_type:04X} at offset {pos} runs past the end of the stream"
            )));
        }
        let body = &stream[start..end];

        if record_type == records::CONTINUE {
            // An orphaned CONTINUE has nothing to extend.
            if let Some(prev) = records.last_mut() {
                prev.continue_offsets.push(prev.data.len());
                prev.data.extend_from_slice(body);
            }
        } else {
            records.push(BiffRecord {
                record_type,
                data: body.to_vec(),
                continue_offsets: Vec::new(),
                stream_offset: pos as u64,
            });
        }
        pos = end;
    }

    Ok(records)
}

/// Extract the BOF record fields from a record body.
///
/// Returns `(version, substream_type)`.
/// - `version` should be `0x0600` for BIFF8
/// - `substream_type`: 0x0005 = workbook globals, 0x0010 = worksheet, etc.
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    if data.len() < 4 {
        return Err(XlsError::InvalidFormat("BOF record too short".into()));
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Ok((version, dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_type: u16, body: &[u8]) -> Vec<u8> {
        let mut out = record_type.to_le_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_continue_records_are_merged() {
        let mut stream = record(records::SST, &[1, 2, 3]);
        stream.extend(record(records::CONTINUE, &[4, 5]));
        stream.extend(record(records::CONTINUE, &[6]));
        stream.extend(record(records::EOF, &[]));

        let records = read_all_records(&stream).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(records[0].continue_offsets, vec![3, 5]);
        assert_eq!(records[1].record_type, records::EOF);
        assert_eq!(records[1].stream_offset, 18);
    }

    #[test]
    fn test_truncated_record() {
        let mut stream = record(records::NUMBER, &[0; 14]);
        stream.truncate(10);
        assert!(matches!(read_all_records(&stream), Err(XlsError::Parse(_))));
    }
}
