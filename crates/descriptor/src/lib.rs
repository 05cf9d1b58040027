pub mod codec;
pub mod error;
pub mod types;

pub use codec::{decode, encode, GZIP_MAGIC};
pub use error::Error;
pub use types::{Descriptor, FileEntry};
