use swarmd_core::hash::Id20;
use swarmd_core::peer::{parse_peer_addrs, PeerAddr, PEER_ADDR_WIRE_LEN};

use crate::error::{Error, Result};

pub const MAX_DATAGRAM_SIZE: usize = 1024;

const ACTION_ANNOUNCE: u8 = 0x01;

/// Lifecycle event carried on an Announce request, per spec.md §4.4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Started = 0x01,
    Stopped = 0x02,
    Completed = 0x03,
}

impl Event {
    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0x01 => Ok(Event::Started),
            0x02 => Ok(Event::Stopped),
            0x03 => Ok(Event::Completed),
            other => Err(Error::InvalidResponse(format!(
                "unknown announce event byte {other:#x}"
            ))),
        }
    }
}

/// The Announce request body, big-endian, no padding (spec.md §4.4's table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub info_hash: Id20,
    pub peer_addr: PeerAddr,
    pub peer_id: Id20,
    pub downloaded: u64,
    pub uploaded: u64,
    pub event: Event,
}

fn split(buf: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if buf.len() < len {
        return Err(Error::InvalidResponse(format!(
            "expected at least {len} bytes, got {}",
            buf.len()
        )));
    }
    Ok(buf.split_at(len))
}

impl AnnounceRequest {
    /// Encodes the full datagram, including the leading action byte.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 20 + PEER_ADDR_WIRE_LEN + 20 + 8 + 8 + 1);
        buf.push(ACTION_ANNOUNCE);
        buf.extend_from_slice(self.info_hash.bytes());
        buf.extend_from_slice(&self.peer_addr.to_bytes());
        buf.extend_from_slice(self.peer_id.bytes());
        buf.extend_from_slice(&self.downloaded.to_be_bytes());
        buf.extend_from_slice(&self.uploaded.to_be_bytes());
        buf.push(self.event as u8);
        buf
    }

    /// Decodes a full datagram, including the leading action byte.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let (action, buf) = split(buf, 1)?;
        if action[0] != ACTION_ANNOUNCE {
            return Err(Error::UnknownAction(action[0]));
        }
        let (info_hash, buf) = split(buf, 20)?;
        let (peer_addr, buf) = split(buf, PEER_ADDR_WIRE_LEN)?;
        let (peer_id, buf) = split(buf, 20)?;
        let (downloaded, buf) = split(buf, 8)?;
        let (uploaded, buf) = split(buf, 8)?;
        let (event, _buf) = split(buf, 1)?;
        Ok(Self {
            info_hash: Id20::from_slice(info_hash)?,
            peer_addr: PeerAddr::from_bytes(peer_addr)?,
            peer_id: Id20::from_slice(peer_id)?,
            downloaded: u64::from_be_bytes(downloaded.try_into().unwrap()),
            uploaded: u64::from_be_bytes(uploaded.try_into().unwrap()),
            event: Event::from_byte(event[0])?,
        })
    }
}

/// Encodes the peer list reply, omitting trailing records that would push
/// the datagram past `MAX_DATAGRAM_SIZE` (spec.md §4.4's known limitation).
pub fn encode_announce_response(peers: &[PeerAddr]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(peers.len() * PEER_ADDR_WIRE_LEN);
    for peer in peers {
        if buf.len() + PEER_ADDR_WIRE_LEN > MAX_DATAGRAM_SIZE {
            break;
        }
        buf.extend_from_slice(&peer.to_bytes());
    }
    buf
}

pub fn decode_announce_response(buf: &[u8]) -> Result<Vec<PeerAddr>> {
    Ok(parse_peer_addrs(buf)?)
}
