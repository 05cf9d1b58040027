use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use swarmd_core::hash::Id20;
use swarmd_wire::chunk::{self, ChunkRequest};

use crate::error::Result;

/// Client side of the chunk protocol (spec.md §4.6): dial a peer, send one
/// request, reassemble the reply under a per-read deadline. Any read error
/// or deadline expiry during reassembly fails the whole transfer — the
/// entry state machine is responsible for trying the next peer.
pub async fn request_chunk(
    peer_addr: SocketAddr,
    info_hash: Id20,
    chunk_id: i64,
    piece_length: u32,
    read_deadline: Duration,
) -> Result<Vec<u8>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(peer_addr).await?;

    let request = ChunkRequest { info_hash, chunk_id };
    chunk::send_request(&socket, peer_addr, &request).await?;

    let bytes = chunk::recv_reply(&socket, piece_length as usize, read_deadline).await?;
    Ok(bytes)
}
