//! Packing output parts into one zip

use std::io::{Cursor, Write};

use ahash::AHashSet;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

/// Zip the given `(name, bytes)` entries, in order, into one buffer.
///
/// Entries are deflated and stamped with the zip epoch so the same input
/// always produces the same archive.
pub fn archive<'a, I>(entries: I) -> Result<Vec<u8>, ArchiveError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut seen = AHashSet::new();
    for (name, bytes) in entries {
        if !seen.insert(name) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    log::debug!("archived {} entries", seen.len());
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn extract(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_round_trip_preserves_names_and_bytes() {
        let entries = vec![
            ("merged_output_part_1.xlsx", b"first".to_vec()),
            ("merged_output_part_2.xlsx", vec![0u8, 1, 2, 255]),
        ];
        let bytes = archive(entries.iter().map(|(n, b)| (*n, b.as_slice()))).unwrap();

        let expected: Vec<(String, Vec<u8>)> = entries
            .iter()
            .map(|(n, b)| (n.to_string(), b.clone()))
            .collect();
        assert_eq!(extract(bytes), expected);
    }

    #[test]
    fn test_deterministic() {
        let entries = [("a.xlsx", &b"payload"[..])];
        assert_eq!(archive(entries).unwrap(), archive(entries).unwrap());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let entries = [("a.xlsx", &b"1"[..]), ("a.xlsx", &b"2"[..])];
        match archive(entries) {
            Err(ArchiveError::DuplicateEntry(name)) => assert_eq!(name, "a.xlsx"),
            other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = archive(std::iter::empty()).unwrap();
        assert!(extract(bytes).is_empty());
    }
}
