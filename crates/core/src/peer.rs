use std::fmt;
use std::net::Ipv4Addr;

use crate::error::Error;
use crate::hash::Id20;

/// A 20-byte peer identifier, built from a short human-readable string
/// zero-padded to 20 bytes, per `original_source/gorrent/peer.go`'s
/// `PeerID.SetString`.
pub fn peer_id_from_str(id: &str) -> Result<Id20, Error> {
    let bytes = id.as_bytes();
    if bytes.len() > 20 {
        return Err(Error::InvalidArgument(format!(
            "peer id {id:?} is {} bytes, max is 20",
            bytes.len()
        )));
    }
    let mut out = [0u8; 20];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(Id20::new(out))
}

/// `{ipv4, port}`, with the canonical 6-byte big-endian wire form from
/// spec.md §3 (4 bytes IP + 2 bytes port).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    pub ip: Ipv4Addr,
    pub port: u16,
}

pub const PEER_ADDR_WIRE_LEN: usize = 6;

impl PeerAddr {
    pub const fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn to_bytes(&self) -> [u8; PEER_ADDR_WIRE_LEN] {
        let mut out = [0u8; PEER_ADDR_WIRE_LEN];
        out[..4].copy_from_slice(&self.ip.octets());
        out[4..6].copy_from_slice(&self.port.to_be_bytes());
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self, Error> {
        if b.len() != PEER_ADDR_WIRE_LEN {
            return Err(Error::InvalidArgument(format!(
                "expected {PEER_ADDR_WIRE_LEN} bytes for a PeerAddr, got {}",
                b.len()
            )));
        }
        let ip = Ipv4Addr::new(b[0], b[1], b[2], b[3]);
        let port = u16::from_be_bytes([b[4], b[5]]);
        Ok(Self { ip, port })
    }

    pub fn socket_addr(&self) -> std::net::SocketAddrV4 {
        std::net::SocketAddrV4::new(self.ip, self.port)
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl fmt::Debug for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Parses a sequence of concatenated 6-byte `PeerAddr` records, as returned
/// by an Announce reply (spec.md §4.4) or the tracker client (§4.5).
pub fn parse_peer_addrs(b: &[u8]) -> Result<Vec<PeerAddr>, Error> {
    if b.len() % PEER_ADDR_WIRE_LEN != 0 {
        return Err(Error::InvalidResponse(format!(
            "response length {} is not a multiple of {PEER_ADDR_WIRE_LEN}",
            b.len()
        )));
    }
    b.chunks_exact(PEER_ADDR_WIRE_LEN)
        .map(PeerAddr::from_bytes)
        .collect()
}

/// `PeerAddr` + `PeerID`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Peer {
    pub addr: PeerAddr,
    pub id: Id20,
}
