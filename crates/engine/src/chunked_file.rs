use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use swarmd_core::hash::Id20;

use crate::error::Result;

/// The fixed-size, offset-addressed scratch file backing an in-progress
/// download, named `<info_hash_hex>.dat` under `tmp_path` (spec.md §6).
/// Opened fresh for each operation rather than held open across state
/// transitions, per spec.md §5's resource-scoping rule.
pub struct ChunkedFile {
    path: PathBuf,
    piece_length: u32,
}

impl ChunkedFile {
    pub fn scratch_path(tmp_path: &Path, info_hash: &Id20) -> PathBuf {
        tmp_path.join(format!("{}.dat", info_hash.hex()))
    }

    /// Creates (or truncates) the scratch file to exactly `total_len` bytes.
    pub fn create(tmp_path: &Path, info_hash: &Id20, total_len: u64, piece_length: u32) -> Result<Self> {
        let path = Self::scratch_path(tmp_path, info_hash);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(total_len)?;
        Ok(Self { path, piece_length })
    }

    pub fn open(tmp_path: &Path, info_hash: &Id20, piece_length: u32) -> Self {
        Self {
            path: Self::scratch_path(tmp_path, info_hash),
            piece_length,
        }
    }

    pub fn write_chunk(&self, chunk_id: u32, bytes: &[u8]) -> Result<()> {
        let offset = chunk_id as u64 * self.piece_length as u64;
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(bytes)?;
        Ok(())
    }

    pub fn read(&self, size: u64, offset: u64) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
