use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use time::OffsetDateTime;
use walkdir::WalkDir;

use swarmd_core::hash::Sha1Incremental;
use swarmd_descriptor::{Descriptor, FileEntry};
use swarmd_engine::piece_buffer::PieceBuffer;

/// Walks `input` and builds a `Descriptor`, streaming every non-directory
/// file's bytes through both the shared piece buffer (content pieces) and a
/// per-file hasher (the file's own `FileEntry.hash`), so each byte is read
/// exactly once.
pub fn build_descriptor(input: &Path, announce: String, piece_length: u32) -> anyhow::Result<Descriptor> {
    let mut entries: Vec<walkdir::DirEntry> = WalkDir::new(input)
        .min_depth(1)
        .into_iter()
        .collect::<Result<_, _>>()
        .context("walking input directory")?;
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let mut files = Vec::new();
    let mut piece_buffer = PieceBuffer::new(piece_length)?;
    let mut pieces = Vec::new();

    for entry in entries {
        let rel = entry
            .path()
            .strip_prefix(input)
            .expect("walkdir entries are always under input")
            .to_string_lossy()
            .replace('\\', "/");

        if entry.file_type().is_dir() {
            files.push(FileEntry::dir(rel));
            continue;
        }

        let mut file = File::open(entry.path())
            .with_context(|| format!("opening {}", entry.path().display()))?;
        let mut file_hasher = Sha1Incremental::new();
        let mut buf = [0u8; 64 * 1024];
        let mut length = 0u64;
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file_hasher.update(&buf[..n]);
            pieces.extend(piece_buffer.create_pieces(&mut std::io::Cursor::new(&buf[..n]))?);
            length += n as u64;
        }
        files.push(FileEntry::file(rel, length, file_hasher.finish()));
    }

    if !piece_buffer.empty() {
        pieces.push(piece_buffer.flush());
    }

    Ok(Descriptor {
        files,
        announce,
        creation_date: OffsetDateTime::now_utc(),
        piece_length,
        pieces,
    })
}
