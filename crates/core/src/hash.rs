use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A fixed-width byte identifier, used for both content hashes and peer ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id<const N: usize>(pub [u8; N]);

impl<const N: usize> Id<N> {
    pub const fn new(bytes: [u8; N]) -> Self {
        Id(bytes)
    }

    pub fn from_slice(b: &[u8]) -> Result<Self, Error> {
        if b.len() != N {
            return Err(Error::InvalidArgument(format!(
                "expected {N} bytes, got {}",
                b.len()
            )));
        }
        let mut v = [0u8; N];
        v.copy_from_slice(b);
        Ok(Id(v))
    }

    pub const fn bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl<const N: usize> fmt::Debug for Id<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl<const N: usize> fmt::Display for Id<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl<const N: usize> FromStr for Id<N> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != N * 2 {
            return Err(Error::InvalidArgument(format!(
                "expected a {}-char hex string, got {}",
                N * 2,
                s.len()
            )));
        }
        let mut out = [0u8; N];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| Error::InvalidArgument(format!("invalid hex: {e}")))?;
        Ok(Id(out))
    }
}

impl<const N: usize> Serialize for Id<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de, const N: usize> Deserialize<'de> for Id<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V<const N: usize>;
        impl<'de, const N: usize> serde::de::Visitor<'de> for V<N> {
            type Value = Id<N>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a byte array of length {N}")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                if v.len() != N {
                    return Err(E::invalid_length(v.len(), &self));
                }
                let mut buf = [0u8; N];
                buf.copy_from_slice(v);
                Ok(Id(buf))
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                self.visit_bytes(&v)
            }
        }
        deserializer.deserialize_bytes(V::<N>)
    }
}

/// 20-byte hash, used both for content hashes (SHA-1) and peer ids.
pub type Id20 = Id<20>;

/// SHA-1 over a single buffer.
pub fn sha1(data: &[u8]) -> Id20 {
    use sha1::Digest;
    let mut hasher = sha1::Sha1::new();
    hasher.update(data);
    let out: [u8; 20] = hasher.finalize().into();
    Id20::new(out)
}

/// Incremental SHA-1 hasher, used when the input arrives in chunks
/// (the piece buffer, the file-integrity checker).
#[derive(Default)]
pub struct Sha1Incremental(sha1::Sha1);

impl Sha1Incremental {
    pub fn new() -> Self {
        use sha1::Digest;
        Self(sha1::Sha1::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        use sha1::Digest;
        self.0.update(data);
    }

    pub fn finish(self) -> Id20 {
        use sha1::Digest;
        let out: [u8; 20] = self.0.finalize().into();
        Id20::new(out)
    }
}
