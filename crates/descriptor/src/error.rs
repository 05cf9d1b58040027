use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid descriptor: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Core(#[from] swarmd_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
