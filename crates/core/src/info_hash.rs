use time::OffsetDateTime;

use crate::hash::{sha1, Id20, Sha1Incremental};

/// Derives the `InfoHash` for a descriptor: SHA-1 over the concatenation of
/// the per-file hashes followed by the creation timestamp's canonical string
/// form, matching the shape of `original_source/gorrent/hasher.go` (which
/// hashes `time.Time.String()` after the file hashes).
pub fn derive(file_hashes: &[Id20], creation_date: OffsetDateTime) -> Id20 {
    let mut hasher = Sha1Incremental::new();
    for h in file_hashes {
        hasher.update(h.bytes());
    }
    let ts = creation_date
        .format(&time::format_description::well_known::Rfc3339)
        .expect("OffsetDateTime always formats as RFC 3339");
    hasher.update(ts.as_bytes());
    hasher.finish()
}

/// Convenience used by tests and the creator CLI path, mirroring `sha1()`'s
/// one-shot shape.
pub fn derive_from_bytes(file_bytes: &[&[u8]], creation_date: OffsetDateTime) -> Id20 {
    let hashes: Vec<Id20> = file_bytes.iter().map(|b| sha1(b)).collect();
    derive(&hashes, creation_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn deterministic_for_same_inputs() {
        let ts = datetime!(2024-01-01 00:00:00 UTC);
        let a = derive_from_bytes(&[b"hello", b"world"], ts);
        let b = derive_from_bytes(&[b"hello", b"world"], ts);
        assert_eq!(a, b);
    }

    #[test]
    fn differs_when_timestamp_differs() {
        let a = derive_from_bytes(&[b"hello"], datetime!(2024-01-01 00:00:00 UTC));
        let b = derive_from_bytes(&[b"hello"], datetime!(2024-01-02 00:00:00 UTC));
        assert_ne!(a, b);
    }

    #[test]
    fn differs_when_file_contents_differ() {
        let ts = datetime!(2024-01-01 00:00:00 UTC);
        let a = derive_from_bytes(&[b"hello"], ts);
        let b = derive_from_bytes(&[b"world"], ts);
        assert_ne!(a, b);
    }
}
