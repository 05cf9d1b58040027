use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use swarmd_core::peer::PeerAddr;
use swarmd_store::{EntryStore, Status};
use swarmd_wire::tracker::Event;

use crate::announce_client::AnnounceClient;
use crate::error::Result;

/// How often `run` polls entries to check whether their announce is due.
/// Kept well under any reasonable `interval` so a driver that zeroes
/// `last_announce` (spec.md §9: Ready→Downloading forces an immediate
/// announce) is picked up promptly rather than waiting out a full interval.
const POLL_GRANULARITY: Duration = Duration::from_millis(200);

/// The sole owner of `entry.peers` and `entry.last_announce` (spec.md §9's
/// open question: the driver never calls the tracker directly, it only
/// reads back what this loop wrote). Each entry is announced when its own
/// `last_announce` falls more than `interval` behind, not on one shared
/// fixed-phase tick — so a fresh entry isn't stuck behind a stale one.
pub struct AnnounceLoop {
    store: Arc<EntryStore>,
    client: Arc<AnnounceClient>,
    public_addr: PeerAddr,
    interval: Duration,
}

impl AnnounceLoop {
    pub fn new(
        store: Arc<EntryStore>,
        client: Arc<AnnounceClient>,
        public_addr: PeerAddr,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            client,
            public_addr,
            interval,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let poll = self.interval.min(POLL_GRANULARITY).max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(poll);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => self.tick().await?,
            }
        }
    }

    async fn tick(&self) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let due_after = time::Duration::try_from(self.interval).unwrap_or(time::Duration::MAX);
        for entry in self.store.all()? {
            if entry.status == Status::New {
                continue;
            }
            if now - entry.last_announce < due_after {
                continue;
            }
            let info_hash = entry.info_hash();
            let result = self
                .client
                .announce(
                    &entry.descriptor,
                    self.public_addr,
                    Event::Started,
                    entry.downloaded,
                    entry.uploaded,
                )
                .await;
            match result {
                Ok(peers) => {
                    self.save_peers(&info_hash, peers)?;
                }
                Err(e) => {
                    warn!(%info_hash, error = %e, "announce failed, keeping stale peer list");
                }
            }
        }
        Ok(())
    }

    fn save_peers(&self, info_hash: &swarmd_core::hash::Id20, peers: Vec<PeerAddr>) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let updated = self.store.update(info_hash, |entry| {
            entry.peers = peers;
            entry.last_announce = now;
        })?;
        if let Some(entry) = updated {
            debug!(%info_hash, peers = entry.peers.len(), "refreshed peer list");
        }
        Ok(())
    }
}
