use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use swarmd_core::hash::Id20;
use swarmd_core::peer::PeerAddr;
use swarmd_descriptor::Descriptor;

/// Lifecycle states of a peer's per-descriptor record, per spec.md §3/§4.7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Status {
    New,
    Ready,
    Downloading,
    Checking,
    Completed,
    Corrupted,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::New => "New",
            Status::Ready => "Ready",
            Status::Downloading => "Downloading",
            Status::Checking => "Checking",
            Status::Completed => "Completed",
            Status::Corrupted => "Corrupted",
        };
        f.write_str(s)
    }
}

/// A peer's per-descriptor record. Exactly one driver task (keyed by
/// info-hash) writes it; the announce loop writes only `peers` and
/// `last_announce` (spec.md §5).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub descriptor: Descriptor,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub out_path: PathBuf,
    pub uploaded: u64,
    pub downloaded: u64,
    pub status: Status,
    pub peers: Vec<PeerAddr>,
    /// Kept sorted by construction (a `BTreeSet`) rather than relying on
    /// insertion order, resolving spec.md §9's open question about
    /// `completed_chunks` sortedness.
    pub completed_chunks: BTreeSet<u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_announce: OffsetDateTime,
}

impl Entry {
    pub fn new(name: String, descriptor: Descriptor, out_path: PathBuf, now: OffsetDateTime) -> Self {
        Self {
            name,
            descriptor,
            created_at: now,
            out_path,
            uploaded: 0,
            downloaded: 0,
            status: Status::New,
            peers: Vec::new(),
            completed_chunks: BTreeSet::new(),
            last_announce: now,
        }
    }

    pub fn info_hash(&self) -> Id20 {
        self.descriptor.info_hash()
    }

    /// The first piece index not yet present, per spec.md §4.7's
    /// "next missing chunk" rule — computed via set difference against
    /// `0..piece_count` rather than "max(completed) + 1", so a gap left by
    /// an out-of-order completion is never skipped.
    pub fn next_missing_chunk(&self) -> Option<u32> {
        let total = self.descriptor.piece_lengths().piece_count();
        (0..total).find(|i| !self.completed_chunks.contains(i))
    }

    pub fn is_fully_downloaded(&self) -> bool {
        self.next_missing_chunk().is_none()
    }
}

/// Keyed by `(info_hash, peer_id)` on the tracker side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAnnounce {
    pub peer_addr: PeerAddr,
    pub peer_id: Id20,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmd_descriptor::FileEntry;
    use time::macros::datetime;

    fn descriptor(piece_length: u32) -> Descriptor {
        Descriptor {
            files: vec![FileEntry::file(
                "f",
                24,
                swarmd_core::hash::sha1(b"AAAABBBBCCCCDDDDEEEEFFFF"),
            )],
            announce: "udp://t:4444".into(),
            creation_date: datetime!(2024-01-01 00:00:00 UTC),
            piece_length,
            pieces: vec![Id20::default(); 6],
        }
    }

    #[test]
    fn next_missing_chunk_skips_gaps_not_just_max_plus_one() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        let mut e = Entry::new("x".into(), descriptor(4), "/tmp/x".into(), now);
        e.completed_chunks.insert(0);
        e.completed_chunks.insert(1);
        e.completed_chunks.insert(3);
        // chunk 2 is missing even though max(completed) + 1 == 4
        assert_eq!(e.next_missing_chunk(), Some(2));
    }

    #[test]
    fn fully_downloaded_when_all_chunks_present() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        let mut e = Entry::new("x".into(), descriptor(4), "/tmp/x".into(), now);
        for i in 0..6 {
            e.completed_chunks.insert(i);
        }
        assert!(e.is_fully_downloaded());
        assert_eq!(e.next_missing_chunk(), None);
    }
}
