use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unknown action: {0}")]
    UnknownAction(u8),

    #[error(transparent)]
    Core(#[from] swarmd_core::Error),

    #[error("read timed out")]
    Timeout,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
