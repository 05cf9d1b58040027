use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use swarmd_core::hash::{sha1, Id20};
use swarmd_store::{Entry, EntryStore, Status};

use crate::chunk_client;
use crate::chunked_file::ChunkedFile;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub tmp_path: PathBuf,
    pub chunk_read_deadline: Duration,
    pub empty_peers_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tmp_path: PathBuf::from("."),
            chunk_read_deadline: Duration::from_secs(2),
            empty_peers_backoff: Duration::from_millis(500),
        }
    }
}

/// One long-running task per admitted entry, the single writer for that
/// entry's `status`, `downloaded`, and `completed_chunks` (spec.md §4.7/§5).
pub struct Driver {
    store: Arc<EntryStore>,
    info_hash: Id20,
    config: DriverConfig,
}

impl Driver {
    pub fn new(store: Arc<EntryStore>, info_hash: Id20, config: DriverConfig) -> Self {
        Self {
            store,
            info_hash,
            config,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let Some(entry) = self.store.get(&self.info_hash)? else {
                debug!(info_hash = %self.info_hash, "entry removed, driver exiting");
                return Ok(());
            };
            match entry.status {
                Status::New => self.process_new(&entry)?,
                Status::Ready => self.process_ready(&entry)?,
                Status::Downloading => self.process_downloading(&entry).await?,
                Status::Checking => self.process_check(&entry)?,
                Status::Completed => {
                    let scratch = ChunkedFile::open(
                        &self.config.tmp_path,
                        &self.info_hash,
                        entry.descriptor.piece_length,
                    );
                    scratch.remove()?;
                    info!(info_hash = %self.info_hash, "entry completed, driver exiting");
                    return Ok(());
                }
                Status::Corrupted => {
                    error!(info_hash = %self.info_hash, "entry corrupted, no recovery");
                    return Ok(());
                }
            }
        }
    }

    /// All non-directory files present and hash-verified → Completed.
    /// Any missing → Ready. Any mismatch → Corrupted.
    fn process_new(&self, entry: &Entry) -> Result<()> {
        std::fs::create_dir_all(&entry.out_path)?;

        let mut all_present = true;
        for file in entry.descriptor.files.iter().filter(|f| !f.is_dir) {
            if std::fs::metadata(entry.out_path.join(&file.name)).is_err() {
                all_present = false;
                break;
            }
        }

        if !all_present {
            self.store.update(&self.info_hash, |e| e.status = Status::Ready)?;
            return Ok(());
        }

        for file in entry.descriptor.files.iter().filter(|f| !f.is_dir) {
            let bytes = std::fs::read(entry.out_path.join(&file.name))?;
            if sha1(&bytes) != file.hash {
                warn!(info_hash = %self.info_hash, file = %file.name, "pre-existing file fails hash check");
                self.store.update(&self.info_hash, |e| e.status = Status::Corrupted)?;
                return Ok(());
            }
        }

        let total_size = entry.descriptor.total_file_size();
        self.store.update(&self.info_hash, |e| {
            e.downloaded = total_size;
            e.status = Status::Completed;
        })?;
        Ok(())
    }

    fn process_ready(&self, entry: &Entry) -> Result<()> {
        ChunkedFile::create(
            &self.config.tmp_path,
            &self.info_hash,
            entry.descriptor.total_file_size(),
            entry.descriptor.piece_length,
        )?;
        // Zeroing last_announce makes the entry immediately due in
        // AnnounceLoop::tick's next poll, regardless of phase.
        self.store.update(&self.info_hash, |e| {
            e.status = Status::Downloading;
            e.last_announce = OffsetDateTime::UNIX_EPOCH;
        })?;
        Ok(())
    }

    async fn process_downloading(&self, entry: &Entry) -> Result<()> {
        if entry.peers.is_empty() {
            tokio::time::sleep(self.config.empty_peers_backoff).await;
            return Ok(());
        }

        let Some(chunk_id) = entry.next_missing_chunk() else {
            self.store.update(&self.info_hash, |e| e.status = Status::Checking)?;
            return Ok(());
        };

        let scratch = ChunkedFile::open(
            &self.config.tmp_path,
            &self.info_hash,
            entry.descriptor.piece_length,
        );

        for peer in entry.peers.clone() {
            let result = chunk_client::request_chunk(
                peer.socket_addr().into(),
                self.info_hash,
                chunk_id as i64,
                entry.descriptor.piece_length,
                self.config.chunk_read_deadline,
            )
            .await;

            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(%peer, error = %e, "chunk request failed, trying next peer");
                    continue;
                }
            };

            if sha1(&bytes) != entry.descriptor.pieces[chunk_id as usize] {
                debug!(%peer, chunk_id, "chunk failed integrity check, trying next peer");
                continue;
            }

            scratch.write_chunk(chunk_id, &bytes)?;
            let len = bytes.len() as u64;
            self.store.update(&self.info_hash, |e| {
                e.completed_chunks.insert(chunk_id);
                e.downloaded += len;
            })?;
            return Ok(());
        }

        warn!(info_hash = %self.info_hash, chunk_id, "no peer served this chunk this round");
        Ok(())
    }

    /// Whole-file verification against the scratch file. A mismatch is a
    /// terminal transition to Corrupted, per spec.md §7's propagation policy.
    fn process_check(&self, entry: &Entry) -> Result<()> {
        let scratch = ChunkedFile::open(
            &self.config.tmp_path,
            &self.info_hash,
            entry.descriptor.piece_length,
        );

        let mut offset = 0u64;
        let mut verified = Vec::new();
        for file in entry.descriptor.files.iter().filter(|f| !f.is_dir) {
            let bytes = scratch.read(file.length, offset)?;
            if sha1(&bytes) != file.hash {
                warn!(info_hash = %self.info_hash, file = %file.name, "integrity check failed");
                self.store.update(&self.info_hash, |e| e.status = Status::Corrupted)?;
                return Ok(());
            }
            verified.push((file.name.clone(), bytes));
            offset += file.length;
        }

        for (name, bytes) in verified {
            let dest = entry.out_path.join(&name);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(dest, bytes)?;
        }

        self.store.update(&self.info_hash, |e| e.status = Status::Completed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmd_descriptor::{Descriptor, FileEntry};
    use time::macros::datetime;

    fn descriptor() -> Descriptor {
        // Scenario 6: 6 chunks, piece_length=4, total 24 bytes.
        let body = b"AAAABBBBCCCCDDDDEEEEFFFF";
        let pieces = body.chunks(4).map(sha1).collect();
        Descriptor {
            files: vec![FileEntry::file("out.bin", 24, sha1(body))],
            announce: "udp://127.0.0.1:4444".into(),
            creation_date: datetime!(2024-01-01 00:00:00 UTC),
            piece_length: 4,
            pieces,
        }
    }

    fn driver_for(
        store: Arc<EntryStore>,
        info_hash: Id20,
        tmp_path: PathBuf,
    ) -> Driver {
        Driver::new(
            store,
            info_hash,
            DriverConfig {
                tmp_path,
                chunk_read_deadline: Duration::from_millis(200),
                empty_peers_backoff: Duration::from_millis(10),
            },
        )
    }

    #[tokio::test]
    async fn new_with_no_existing_files_goes_ready() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let store = Arc::new(EntryStore::open(tmp.path().join("db")).unwrap());
        let descriptor = descriptor();
        let info_hash = descriptor.info_hash();
        let entry = Entry::new(
            "x".into(),
            descriptor,
            out.path().to_path_buf(),
            OffsetDateTime::now_utc(),
        );
        store.save(&entry).unwrap();

        let driver = driver_for(store.clone(), info_hash, tmp.path().to_path_buf());
        driver.process_new(&entry).unwrap();

        assert_eq!(store.get(&info_hash).unwrap().unwrap().status, Status::Ready);
    }

    #[tokio::test]
    async fn new_with_all_files_matching_goes_completed() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let store = Arc::new(EntryStore::open(tmp.path().join("db")).unwrap());
        let descriptor = descriptor();
        let info_hash = descriptor.info_hash();
        std::fs::write(out.path().join("out.bin"), b"AAAABBBBCCCCDDDDEEEEFFFF").unwrap();
        let entry = Entry::new(
            "x".into(),
            descriptor,
            out.path().to_path_buf(),
            OffsetDateTime::now_utc(),
        );
        store.save(&entry).unwrap();

        let driver = driver_for(store.clone(), info_hash, tmp.path().to_path_buf());
        driver.process_new(&entry).unwrap();

        let updated = store.get(&info_hash).unwrap().unwrap();
        assert_eq!(updated.status, Status::Completed);
        assert_eq!(updated.downloaded, 24);
    }

    #[tokio::test]
    async fn new_with_corrupted_existing_file_goes_corrupted() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let store = Arc::new(EntryStore::open(tmp.path().join("db")).unwrap());
        let descriptor = descriptor();
        let info_hash = descriptor.info_hash();
        std::fs::write(out.path().join("out.bin"), b"not the right bytes!!!!!").unwrap();
        let entry = Entry::new(
            "x".into(),
            descriptor,
            out.path().to_path_buf(),
            OffsetDateTime::now_utc(),
        );
        store.save(&entry).unwrap();

        let driver = driver_for(store.clone(), info_hash, tmp.path().to_path_buf());
        driver.process_new(&entry).unwrap();

        assert_eq!(store.get(&info_hash).unwrap().unwrap().status, Status::Corrupted);
    }

    #[tokio::test]
    async fn end_to_end_verify_and_complete() {
        // Scenario 6, second half: once all chunks are in the scratch file,
        // process_check verifies and writes the final file, reaching Completed.
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let store = Arc::new(EntryStore::open(tmp.path().join("db")).unwrap());
        let descriptor = descriptor();
        let info_hash = descriptor.info_hash();
        let mut entry = Entry::new(
            "x".into(),
            descriptor.clone(),
            out.path().to_path_buf(),
            OffsetDateTime::now_utc(),
        );
        entry.status = Status::Checking;
        store.save(&entry).unwrap();

        let scratch = ChunkedFile::create(tmp.path(), &info_hash, 24, 4).unwrap();
        let body = b"AAAABBBBCCCCDDDDEEEEFFFF";
        for (i, chunk) in body.chunks(4).enumerate() {
            scratch.write_chunk(i as u32, chunk).unwrap();
        }

        let driver = driver_for(store.clone(), info_hash, tmp.path().to_path_buf());
        driver.process_check(&entry).unwrap();

        let updated = store.get(&info_hash).unwrap().unwrap();
        assert_eq!(updated.status, Status::Completed);
        let written = std::fs::read(out.path().join("out.bin")).unwrap();
        assert_eq!(written, body);
    }

    #[tokio::test]
    async fn process_downloading_backs_off_when_no_peers() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let store = Arc::new(EntryStore::open(tmp.path().join("db")).unwrap());
        let descriptor = descriptor();
        let info_hash = descriptor.info_hash();
        let mut entry = Entry::new(
            "x".into(),
            descriptor,
            out.path().to_path_buf(),
            OffsetDateTime::now_utc(),
        );
        entry.status = Status::Downloading;
        store.save(&entry).unwrap();

        let driver = driver_for(store.clone(), info_hash, tmp.path().to_path_buf());
        let start = std::time::Instant::now();
        driver.process_downloading(&entry).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}

