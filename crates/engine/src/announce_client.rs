use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use swarmd_core::hash::Id20;
use swarmd_core::peer::PeerAddr;
use swarmd_descriptor::Descriptor;
use swarmd_wire::tracker::{self, AnnounceRequest, Event, MAX_DATAGRAM_SIZE};

use crate::error::{Error, Result};

/// Strips an optional `udp://` scheme and parses the remainder as a socket
/// address, matching spec.md §3's `announce: string` field.
pub fn parse_announce_endpoint(s: &str) -> Result<SocketAddr> {
    let stripped = s.strip_prefix("udp://").unwrap_or(s);
    stripped
        .parse()
        .map_err(|e| Error::Core(swarmd_core::Error::InvalidArgument(format!(
            "invalid announce endpoint {s:?}: {e}"
        ))))
}

/// Issues Announce requests against a descriptor's tracker. Grounded in
/// `tracker_comms_udp.rs`'s dial-send-recv shape, simplified to spec.md
/// §4.5's single request/response exchange (no connect handshake).
pub struct AnnounceClient {
    pub peer_id: Id20,
    pub read_timeout: Duration,
}

impl AnnounceClient {
    pub fn new(peer_id: Id20, read_timeout: Duration) -> Self {
        Self {
            peer_id,
            read_timeout,
        }
    }

    pub async fn announce(
        &self,
        descriptor: &Descriptor,
        peer_addr: PeerAddr,
        event: Event,
        downloaded: u64,
        uploaded: u64,
    ) -> Result<Vec<PeerAddr>> {
        let tracker_addr = parse_announce_endpoint(&descriptor.announce)?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(tracker_addr).await?;

        let request = AnnounceRequest {
            info_hash: descriptor.info_hash(),
            peer_addr,
            peer_id: self.peer_id,
            downloaded,
            uploaded,
            event,
        };
        socket.send(&request.encode()).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let n = tokio::time::timeout(self.read_timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| Error::Wire(swarmd_wire::Error::Timeout))??;
        Ok(tracker::decode_announce_response(&buf[..n])?)
    }
}
