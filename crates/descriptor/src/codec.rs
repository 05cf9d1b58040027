use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::types::Descriptor;

/// The gzip magic, per spec.md §6: a descriptor file always starts with this.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Encodes a descriptor into its self-describing binary form, then
/// gzip-compresses it.
pub fn encode(d: &Descriptor) -> Result<Vec<u8>> {
    let cfg = bincode::config::standard();
    let body = bincode::serde::encode_to_vec(d, cfg)
        .map_err(|e| Error::InvalidData(format!("encode failed: {e}")))?;
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&body)?;
    Ok(gz.finish()?)
}

/// Decompresses and decodes a descriptor file's bytes.
pub fn decode(bytes: &[u8]) -> Result<Descriptor> {
    if bytes.len() < 2 || bytes[..2] != GZIP_MAGIC {
        return Err(Error::InvalidData("missing gzip magic".into()));
    }
    let mut gz = GzDecoder::new(bytes);
    let mut body = Vec::new();
    gz.read_to_end(&mut body)?;
    let cfg = bincode::config::standard();
    let (descriptor, _) = bincode::serde::decode_from_slice(&body, cfg)
        .map_err(|e| Error::InvalidData(format!("decode failed: {e}")))?;
    Ok(descriptor)
}
