use parking_lot::Mutex;
use tracing::debug;

use swarmd_core::hash::Id20;

use crate::entry::Entry;
use crate::error::{Error, Result};

/// A durable keyed store of `Entry` records, one per info-hash.
///
/// `sled` gives us the transactional, single-writer-per-key semantics
/// spec.md §4.3/§5 ask for directly; the `Mutex` around the handle only
/// serializes our own read-modify-write helper, not `sled`'s internal
/// concurrency (which already tolerates concurrent readers and writers).
pub struct EntryStore {
    db: Mutex<sled::Db>,
}

impl EntryStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db: Mutex::new(db) })
    }

    pub fn save(&self, entry: &Entry) -> Result<()> {
        let key = entry.info_hash();
        let cfg = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(entry, cfg)
            .map_err(|e| Error::InvalidData(format!("encode failed: {e}")))?;
        let db = self.db.lock();
        db.insert(key.bytes(), bytes)?;
        debug!(info_hash = %key, status = %entry.status, "saved entry");
        Ok(())
    }

    pub fn get(&self, info_hash: &Id20) -> Result<Option<Entry>> {
        let db = self.db.lock();
        match db.get(info_hash.bytes())? {
            None => Ok(None),
            Some(ivec) => Ok(Some(Self::decode(&ivec)?)),
        }
    }

    pub fn all(&self) -> Result<Vec<Entry>> {
        let db = self.db.lock();
        db.iter()
            .values()
            .map(|res| {
                let ivec = res?;
                Self::decode(&ivec)
            })
            .collect()
    }

    /// Read-modify-write a single entry under the store's lock, so the
    /// announce loop's field updates and the driver's field updates never
    /// interleave (spec.md §5).
    pub fn update<F>(&self, info_hash: &Id20, f: F) -> Result<Option<Entry>>
    where
        F: FnOnce(&mut Entry),
    {
        let db = self.db.lock();
        let Some(ivec) = db.get(info_hash.bytes())? else {
            return Ok(None);
        };
        let mut entry = Self::decode(&ivec)?;
        f(&mut entry);
        let cfg = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(&entry, cfg)
            .map_err(|e| Error::InvalidData(format!("encode failed: {e}")))?;
        db.insert(info_hash.bytes(), bytes)?;
        Ok(Some(entry))
    }

    pub fn close(&self) -> Result<()> {
        self.db.lock().flush()?;
        Ok(())
    }

    fn decode(ivec: &sled::IVec) -> Result<Entry> {
        let cfg = bincode::config::standard();
        let (entry, _) = bincode::serde::decode_from_slice(ivec, cfg)
            .map_err(|e| Error::InvalidData(format!("decode failed: {e}")))?;
        Ok(entry)
    }
}
