use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use swarmd_core::hash::Id20;
use swarmd_core::lengths::Lengths;

/// One file (or directory marker) within a descriptor's logical tree.
/// `hash` is the all-zero `Id20` when `is_dir` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub length: u64,
    pub is_dir: bool,
    pub hash: Id20,
}

impl FileEntry {
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: 0,
            is_dir: true,
            hash: Id20::default(),
        }
    }

    pub fn file(name: impl Into<String>, length: u64, hash: Id20) -> Self {
        Self {
            name: name.into(),
            length,
            is_dir: false,
            hash,
        }
    }
}

/// The immutable content bundle: file list, piece hashes, and the tracker
/// endpoint to announce against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub files: Vec<FileEntry>,
    pub announce: String,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_date: OffsetDateTime,
    pub piece_length: u32,
    pub pieces: Vec<Id20>,
}

impl Descriptor {
    /// Sum of the lengths of non-directory files — the scratch file's size.
    pub fn total_file_size(&self) -> u64 {
        self.files
            .iter()
            .filter(|f| !f.is_dir)
            .map(|f| f.length)
            .sum()
    }

    /// Hashes every entry including directories (their zero-value hash),
    /// matching `original_source/gorrent/hasher.go`'s unconditional loop
    /// over `g.Files`.
    pub fn info_hash(&self) -> Id20 {
        let hashes: Vec<Id20> = self.files.iter().map(|f| f.hash).collect();
        swarmd_core::info_hash::derive(&hashes, self.creation_date)
    }

    pub fn piece_lengths(&self) -> Lengths {
        Lengths::new(self.total_file_size(), self.piece_length)
            .expect("piece_length is validated non-zero at decode time")
    }
}
