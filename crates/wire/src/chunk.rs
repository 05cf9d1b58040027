use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use swarmd_core::hash::Id20;

use crate::error::{Error, Result};
use crate::tracker::MAX_DATAGRAM_SIZE;

pub const CHUNK_REQUEST_LEN: usize = 28;

/// `{info_hash: 20 bytes, chunk_id: i64 big-endian}`, per spec.md §4.6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRequest {
    pub info_hash: Id20,
    pub chunk_id: i64,
}

impl ChunkRequest {
    pub fn encode(&self) -> [u8; CHUNK_REQUEST_LEN] {
        let mut buf = [0u8; CHUNK_REQUEST_LEN];
        buf[..20].copy_from_slice(self.info_hash.bytes());
        buf[20..28].copy_from_slice(&self.chunk_id.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != CHUNK_REQUEST_LEN {
            return Err(Error::InvalidResponse(format!(
                "expected a {CHUNK_REQUEST_LEN}-byte chunk request, got {}",
                buf.len()
            )));
        }
        Ok(Self {
            info_hash: Id20::from_slice(&buf[..20])?,
            chunk_id: i64::from_be_bytes(buf[20..28].try_into().unwrap()),
        })
    }
}

pub async fn send_request(socket: &UdpSocket, target: SocketAddr, req: &ChunkRequest) -> Result<()> {
    socket.send_to(&req.encode(), target).await?;
    Ok(())
}

pub async fn recv_request(socket: &UdpSocket) -> Result<(ChunkRequest, SocketAddr)> {
    let mut buf = [0u8; CHUNK_REQUEST_LEN];
    let (n, from) = socket.recv_from(&mut buf).await?;
    Ok((ChunkRequest::decode(&buf[..n])?, from))
}

/// Writes `data` to `target` as a sequence of in-order datagrams, each at
/// most `MAX_DATAGRAM_SIZE` bytes (spec.md §4.6's reply framing).
pub async fn send_reply(socket: &UdpSocket, target: SocketAddr, data: &[u8]) -> Result<()> {
    for packet in data.chunks(MAX_DATAGRAM_SIZE) {
        socket.send_to(packet, target).await?;
    }
    Ok(())
}

/// Reassembles a reply by reading datagrams until `expected_len` bytes have
/// arrived, applying `per_read_deadline` to each individual read. Per
/// spec.md §9's open question, any deadline expiry or read error fails the
/// whole transfer rather than waiting indefinitely.
pub async fn recv_reply(
    socket: &UdpSocket,
    expected_len: usize,
    per_read_deadline: Duration,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    while out.len() < expected_len {
        let n = tokio::time::timeout(per_read_deadline, socket.recv(&mut buf))
            .await
            .map_err(|_| Error::Timeout)??;
        if n == 0 {
            return Err(Error::InvalidResponse("empty datagram mid-reassembly".into()));
        }
        out.extend_from_slice(&buf[..n]);
    }
    out.truncate(expected_len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trip() {
        let req = ChunkRequest {
            info_hash: swarmd_core::hash::sha1(b"descriptor"),
            chunk_id: 42,
        };
        let encoded = req.encode();
        assert_eq!(encoded.len(), CHUNK_REQUEST_LEN);
        assert_eq!(ChunkRequest::decode(&encoded).unwrap(), req);
    }

    #[test]
    fn request_rejects_wrong_length() {
        assert!(ChunkRequest::decode(&[0u8; 27]).is_err());
    }

    #[tokio::test]
    async fn reply_round_trips_over_loopback() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        client.connect(server_addr).await.unwrap();
        let client_addr = client.local_addr().unwrap();

        let payload = vec![7u8; 4096];
        let payload_clone = payload.clone();
        let send_task = tokio::spawn(async move {
            send_reply(&server, client_addr, &payload_clone).await.unwrap();
        });

        let received = recv_reply(&client, payload.len(), Duration::from_secs(2))
            .await
            .unwrap();
        send_task.await.unwrap();
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn reply_times_out_on_short_transfer() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        client.connect(server_addr).await.unwrap();
        let client_addr = client.local_addr().unwrap();

        // Only send half the expected bytes; the client should time out
        // waiting for the rest rather than block forever.
        server.send_to(&[1u8; 4], client_addr).await.unwrap();

        let result = recv_reply(&client, 8, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }
}
