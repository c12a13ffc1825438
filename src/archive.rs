//! In-memory ZIP bundling of processed images.
//!
//! One deflated entry per successfully processed image, named by its
//! processed name. A batch with no successes produces no archive at all.

use std::io::{Cursor, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A named file to place in the archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveEntry<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// Build a deflate ZIP from `entries`. Returns `Ok(None)` for an empty batch.
pub fn build_archive(entries: &[ArchiveEntry<'_>]) -> Result<Option<Vec<u8>>, ZipError> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(entry.name, options)?;
        writer.write_all(entry.bytes)?;
    }

    let cursor = writer.finish()?;
    Ok(Some(cursor.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn empty_batch_has_no_archive() {
        assert!(build_archive(&[]).unwrap().is_none());
    }

    #[test]
    fn archive_holds_one_entry_per_image() {
        let entries = [
            ArchiveEntry {
                name: "a_1080x1080.png",
                bytes: b"first",
            },
            ArchiveEntry {
                name: "b_1080x1080.png",
                bytes: b"second payload",
            },
        ];
        let zip = build_archive(&entries).unwrap().unwrap();

        let mut archive = ZipArchive::new(Cursor::new(zip)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut file = archive.by_name("b_1080x1080.png").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"second payload");
    }

    #[test]
    fn entries_keep_batch_order() {
        let entries = [
            ArchiveEntry {
                name: "z.png",
                bytes: b"1",
            },
            ArchiveEntry {
                name: "a.png",
                bytes: b"2",
            },
        ];
        let zip = build_archive(&entries).unwrap().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(zip)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "z.png");
        assert_eq!(archive.by_index(1).unwrap().name(), "a.png");
    }
}
