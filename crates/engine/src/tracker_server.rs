use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use parking_lot::RwLock;
use time::OffsetDateTime;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use swarmd_core::hash::Id20;
use swarmd_core::peer::PeerAddr;
use swarmd_wire::tracker::{self, AnnounceRequest, MAX_DATAGRAM_SIZE};
use swarmd_wire::Error as WireError;

use crate::error::Result;

#[derive(Clone, Debug)]
struct StoredAnnounce {
    peer_addr: PeerAddr,
    last_updated: OffsetDateTime,
}

/// In-memory announce table, keyed by `(info_hash, peer_id)`, aged out by
/// `max_peer_age` on every lookup (spec.md §4.4/§3's `StoredAnnounce`).
#[derive(Default)]
struct AnnounceTable {
    by_info_hash: RwLock<HashMap<Id20, HashMap<Id20, StoredAnnounce>>>,
}

impl AnnounceTable {
    fn upsert(&self, info_hash: Id20, peer_id: Id20, peer_addr: PeerAddr, now: OffsetDateTime) {
        let mut table = self.by_info_hash.write();
        table
            .entry(info_hash)
            .or_default()
            .insert(peer_id, StoredAnnounce { peer_addr, last_updated: now });
    }

    /// All peers for `info_hash` still within `max_age`, excluding `exclude`.
    fn live_peers(
        &self,
        info_hash: &Id20,
        exclude: &Id20,
        max_age: Duration,
        now: OffsetDateTime,
    ) -> Vec<PeerAddr> {
        let table = self.by_info_hash.read();
        let Some(peers) = table.get(info_hash) else {
            return Vec::new();
        };
        let max_age = time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX);
        peers
            .iter()
            .filter(|(peer_id, stored)| *peer_id != exclude && now - stored.last_updated <= max_age)
            .map(|(_, stored)| stored.peer_addr)
            .collect()
    }
}

/// The tracker's datagram server: one receive loop, dispatched per request,
/// per spec.md §4.4's failure semantics (malformed/unknown datagrams are
/// dropped silently, handler errors are logged and drop the reply).
pub struct TrackerServer {
    socket: UdpSocket,
    table: AnnounceTable,
    max_peer_age: Duration,
    read_timeout: Duration,
}

impl TrackerServer {
    pub async fn bind(addr: SocketAddr, max_peer_age: Duration) -> Result<Self> {
        Self::bind_with_read_timeout(addr, max_peer_age, Duration::from_secs(2)).await
    }

    /// `read_timeout` bounds each `recv_from` (spec.md's `--read-timeout`); a
    /// timed-out read is not an error, the loop just goes back to waiting.
    /// There is no write-side deadline (`--write-timeout` is accepted by the
    /// CLI for symmetry with the flag table but never gates `send_to`).
    pub async fn bind_with_read_timeout(
        addr: SocketAddr,
        max_peer_age: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(addr).await?,
            table: AnnounceTable::default(),
            max_peer_age,
            read_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let recv = tokio::time::timeout(self.read_timeout, self.socket.recv_from(&mut buf));
            let (n, from) = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                r = recv => match r {
                    Ok(r) => r?,
                    Err(_) => continue,
                },
            };
            if let Err(e) = self.handle_datagram(&buf[..n], from).await {
                warn!(%from, error = %e, "dropping malformed tracker datagram");
            }
        }
    }

    async fn handle_datagram(&self, bytes: &[u8], from: SocketAddr) -> Result<()> {
        let request = match AnnounceRequest::decode(bytes) {
            Ok(r) => r,
            Err(WireError::UnknownAction(action)) => {
                debug!(action, "unknown tracker action, dropping");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let now = OffsetDateTime::now_utc();
        self.table
            .upsert(request.info_hash, request.peer_id, request.peer_addr, now);

        let peers = self.table.live_peers(
            &request.info_hash,
            &request.peer_id,
            self.max_peer_age,
            now,
        );
        let reply = tracker::encode_announce_response(&peers);
        self.socket.send_to(&reply, from).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmd_wire::tracker::Event;

    fn request(info_hash: Id20, peer_id: Id20, port: u16) -> AnnounceRequest {
        AnnounceRequest {
            info_hash,
            peer_addr: PeerAddr::new(std::net::Ipv4Addr::new(127, 0, 0, 1), port),
            peer_id,
            downloaded: 0,
            uploaded: 0,
            event: Event::Started,
        }
    }

    #[tokio::test]
    async fn announce_excludes_self_and_returns_others() {
        // Scenario 5: three peers announce, a request from P1 gets exactly P2+P3.
        let server = TrackerServer::bind("127.0.0.1:0".parse().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let server_cancel = cancel.clone();
        let handle = tokio::spawn(async move { server.run(server_cancel).await });

        let info_hash = swarmd_core::hash::sha1(b"descriptor");
        let p1 = swarmd_core::hash::sha1(b"p1");
        let p2 = swarmd_core::hash::sha1(b"p2");
        let p3 = swarmd_core::hash::sha1(b"p3");

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.connect(addr).await.unwrap();

        for (peer_id, port) in [(p2, 2), (p3, 3), (p1, 1)] {
            client
                .send(&request(info_hash, peer_id, port).encode())
                .await
                .unwrap();
            let mut buf = [0u8; 64];
            let _ = client.recv(&mut buf).await.unwrap();
        }

        client
            .send(&request(info_hash, p1, 1).encode())
            .await
            .unwrap();
        let mut buf = [0u8; 64];
        let n = client.recv(&mut buf).await.unwrap();
        assert_eq!(n, 12);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unknown_action_gets_no_reply() {
        let server = TrackerServer::bind("127.0.0.1:0".parse().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let server_cancel = cancel.clone();
        let handle = tokio::spawn(async move { server.run(server_cancel).await });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.connect(addr).await.unwrap();
        client.send(&[0xFFu8; 10]).await.unwrap();

        let mut buf = [0u8; 64];
        let result = tokio::time::timeout(Duration::from_millis(100), client.recv(&mut buf)).await;
        assert!(result.is_err(), "expected no reply for an unknown action");

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
