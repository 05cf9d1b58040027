use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sled(#[from] sled::Error),

    #[error("corrupt entry record: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Core(#[from] swarmd_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
