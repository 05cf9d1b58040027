pub mod chunk;
pub mod error;
pub mod tracker;

pub use chunk::{ChunkRequest, CHUNK_REQUEST_LEN};
pub use error::Error;
pub use tracker::{AnnounceRequest, Event, MAX_DATAGRAM_SIZE};
