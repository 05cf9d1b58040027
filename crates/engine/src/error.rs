use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no data available")]
    NoData,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("integrity check failed for piece {piece_index}")]
    IntegrityCheckFailed { piece_index: u32 },

    #[error("no more chunks")]
    NoMoreChunk,

    #[error(transparent)]
    Core(#[from] swarmd_core::Error),

    #[error(transparent)]
    Wire(#[from] swarmd_wire::Error),

    #[error(transparent)]
    Store(#[from] swarmd_store::Error),

    #[error(transparent)]
    Descriptor(#[from] swarmd_descriptor::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
