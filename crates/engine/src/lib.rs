pub mod announce_client;
pub mod announce_loop;
pub mod chunk_client;
pub mod chunked_file;
pub mod error;
pub mod peer_server;
pub mod piece_buffer;
pub mod piece_reader;
pub mod state;
pub mod tracker_server;

pub use announce_client::AnnounceClient;
pub use announce_loop::AnnounceLoop;
pub use chunked_file::ChunkedFile;
pub use error::Error;
pub use peer_server::PeerServer;
pub use piece_buffer::PieceBuffer;
pub use piece_reader::PieceReader;
pub use state::{Driver, DriverConfig};
pub use tracker_server::TrackerServer;
