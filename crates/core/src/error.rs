use thiserror::Error;

/// Errors shared across the whole workspace, at the seams where crates meet:
/// hashing/identifiers, wire parsing, and store access.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unknown action: {0}")]
    UnknownAction(u8),

    #[error("no data available")]
    NoData,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("integrity check failed for piece {piece_index}")]
    IntegrityCheckFailed { piece_index: u32 },

    #[error("no more chunks")]
    NoMoreChunk,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
