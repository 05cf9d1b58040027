pub mod error;
pub mod hash;
pub mod info_hash;
pub mod lengths;
pub mod peer;
pub mod spawn_utils;

pub use error::Error;
pub use hash::{sha1, Id, Id20, Sha1Incremental};
pub use lengths::Lengths;
pub use peer::{parse_peer_addrs, peer_id_from_str, Peer, PeerAddr};
