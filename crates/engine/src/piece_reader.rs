use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use swarmd_descriptor::FileEntry;

use crate::error::{Error, Result};

/// Reconstructs the bytes of a single piece from the concrete on-disk files
/// under a working directory, given the descriptor's file list and
/// `piece_length`. Grounded in the walking/seeking style of
/// `file_checking.rs::update_hash_from_file`, generalized from "hash a
/// known-length run" to "assemble a byte range that may span files".
pub struct PieceReader<'a> {
    files: &'a [FileEntry],
    piece_length: u32,
    root: &'a Path,
}

impl<'a> PieceReader<'a> {
    pub fn new(files: &'a [FileEntry], piece_length: u32, root: &'a Path) -> Self {
        Self {
            files,
            piece_length,
            root,
        }
    }

    pub fn read_piece(&self, piece_id: u32) -> Result<Vec<u8>> {
        let start = piece_id as u64 * self.piece_length as u64;
        let end = start + self.piece_length as u64;

        let mut out = Vec::with_capacity(self.piece_length as usize);
        let mut cursor: u64 = 0;

        for entry in self.files {
            if entry.is_dir {
                continue;
            }
            let file_start = cursor;
            let file_end = cursor + entry.length;
            cursor = file_end;

            if file_end <= start || file_start >= end {
                continue;
            }

            let read_from = start.max(file_start) - file_start;
            let remaining_needed = self.piece_length as u64 - out.len() as u64;
            let available_in_file = entry.length - read_from;
            let to_read = remaining_needed.min(available_in_file);

            let mut file = File::open(self.root.join(&entry.name))?;
            file.seek(SeekFrom::Start(read_from))?;
            let mut chunk = vec![0u8; to_read as usize];
            file.read_exact(&mut chunk)?;
            out.extend_from_slice(&chunk);

            if out.len() as u64 == self.piece_length as u64 {
                break;
            }
        }

        if out.is_empty() {
            return Err(Error::NoData);
        }
        if (out.len() as u64) < self.piece_length as u64 {
            return Err(Error::InvalidData(format!(
                "piece {piece_id} truncated: got {} of {} bytes",
                out.len(),
                self.piece_length
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_files(dir: &Path, files: &[(&str, &[u8])]) {
        for (name, contents) in files {
            let mut f = File::create(dir.join(name)).unwrap();
            f.write_all(contents).unwrap();
        }
    }

    fn descriptor_files(lengths: &[u64]) -> Vec<FileEntry> {
        let names = ["a", "b", "c"];
        names
            .iter()
            .zip(lengths)
            .map(|(n, l)| FileEntry::file(*n, *l, swarmd_core::hash::Id20::default()))
            .collect()
    }

    #[test]
    fn piece_spanning_three_files() {
        // Scenario 1: a/b/c each 10 bytes, piece_length=30, piece 0 spans all three.
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[
                ("a", b"AAAAAAAAAA"),
                ("b", b"BBBBBBBBBB"),
                ("c", b"CCCCCCCCCC"),
            ],
        );
        let files = descriptor_files(&[10, 10, 10]);
        let reader = PieceReader::new(&files, 30, dir.path());
        let piece = reader.read_piece(0).unwrap();
        assert_eq!(piece, b"AAAAAAAAAABBBBBBBBBBCCCCCCCCCC");
    }

    #[test]
    fn small_pieces_cross_boundary() {
        // Scenario 2: piece_length=3, piece 3 = "AAB" (last 2 A's + first B).
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[
                ("a", b"AAAAAAAAAA"),
                ("b", b"BBBBBBBBBB"),
                ("c", b"CCCCCCCCCC"),
            ],
        );
        let files = descriptor_files(&[10, 10, 10]);
        let reader = PieceReader::new(&files, 3, dir.path());
        let piece = reader.read_piece(3).unwrap();
        assert_eq!(piece, b"AAB");
    }

    #[test]
    fn out_of_range_piece_is_no_data() {
        // Scenario 3: piece_length=10, total 30 bytes, piece_id=4 is out of range.
        let dir = tempfile::tempdir().unwrap();
        write_files(
            dir.path(),
            &[
                ("a", b"AAAAAAAAAA"),
                ("b", b"BBBBBBBBBB"),
                ("c", b"CCCCCCCCCC"),
            ],
        );
        let files = descriptor_files(&[10, 10, 10]);
        let reader = PieceReader::new(&files, 10, dir.path());
        assert!(matches!(reader.read_piece(4), Err(Error::NoData)));
    }

    #[test]
    fn directory_entries_never_advance_cursor() {
        let dir = tempfile::tempdir().unwrap();
        write_files(dir.path(), &[("a", b"AAAA"), ("b", b"BBBB")]);
        let files = vec![
            FileEntry::dir("sub"),
            FileEntry::file("a", 4, swarmd_core::hash::Id20::default()),
            FileEntry::file("b", 4, swarmd_core::hash::Id20::default()),
        ];
        let reader = PieceReader::new(&files, 8, dir.path());
        let piece = reader.read_piece(0).unwrap();
        assert_eq!(piece, b"AAAABBBB");
    }
}
