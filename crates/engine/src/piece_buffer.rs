use std::io::Read;

use swarmd_core::hash::{sha1, Id20};

use crate::error::{Error, Result};

/// Streams an arbitrary byte source into fixed-length pieces, each hashed
/// independently. Grounded in `original_source/buffer/piece.go`'s
/// `MemoryPieceBuffer`, translated from Go's `io.Reader` into
/// `std::io::Read` — `Ok(0)` already means EOF, so no extra `Option<Err>`
/// wrapper is needed around reads (spec.md §9).
pub struct PieceBuffer {
    piece_length: u32,
    buf: Vec<u8>,
}

impl PieceBuffer {
    pub fn new(piece_length: u32) -> Result<Self> {
        if piece_length == 0 {
            return Err(Error::InvalidData("piece_length must be > 0".into()));
        }
        Ok(Self {
            piece_length,
            buf: Vec::with_capacity(piece_length as usize),
        })
    }

    pub const fn piece_length(&self) -> u32 {
        self.piece_length
    }

    pub fn empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reads from `reader` until EOF, emitting the hash of every piece
    /// filled during this call. A partial trailing buffer survives for the
    /// next call (or `flush`).
    pub fn create_pieces(&mut self, reader: &mut impl Read) -> Result<Vec<Id20>> {
        let mut pieces = Vec::new();
        let mut scratch = vec![0u8; self.piece_length as usize];
        loop {
            let want = self.piece_length as usize - self.buf.len();
            if want == 0 {
                pieces.push(sha1(&self.buf));
                self.buf.clear();
                continue;
            }
            let n = reader.read(&mut scratch[..want])?;
            if n == 0 {
                return Ok(pieces);
            }
            self.buf.extend_from_slice(&scratch[..n]);
        }
    }

    /// Hashes whatever is currently buffered, as-is (no zero padding — an
    /// empty flush hashes the empty string), and clears the buffer.
    pub fn flush(&mut self) -> Id20 {
        let hash = sha1(&self.buf);
        self.buf.clear();
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn piece_count_matches_total_over_piece_length() {
        // 3 files of 10 bytes concatenated, piece_length = 30 -> 1 piece.
        let mut pb = PieceBuffer::new(30).unwrap();
        let input = b"A".repeat(10) + &"B".repeat(10) + &"C".repeat(10);
        let pieces = pb.create_pieces(&mut Cursor::new(input)).unwrap();
        assert_eq!(pieces.len(), 1);
        assert!(pb.empty());
    }

    #[test]
    fn small_pieces_scenario() {
        // Scenario 2: piece_length = 3, same 30-byte input -> 10 pieces.
        let mut pb = PieceBuffer::new(3).unwrap();
        let input = "A".repeat(10) + &"B".repeat(10) + &"C".repeat(10);
        let pieces = pb.create_pieces(&mut Cursor::new(input.into_bytes())).unwrap();
        assert_eq!(pieces.len(), 10);
        assert!(pb.empty());
    }

    #[test]
    fn flush_semantics_scenario() {
        // Scenario 4: piece_length=3, feed "12345".
        let mut pb = PieceBuffer::new(3).unwrap();
        let pieces = pb.create_pieces(&mut Cursor::new(b"12345".to_vec())).unwrap();
        assert_eq!(pieces, vec![sha1(b"123")]);
        assert!(!pb.empty());
        let flushed = pb.flush();
        assert_eq!(flushed, sha1(b"45"));
        assert!(pb.empty());
    }

    #[test]
    fn exact_multiple_needs_no_flush() {
        let mut pb = PieceBuffer::new(5).unwrap();
        let pieces = pb.create_pieces(&mut Cursor::new(b"0123456789".to_vec())).unwrap();
        assert_eq!(pieces.len(), 2);
        assert!(pb.empty());
    }

    #[test]
    fn empty_flush_hashes_empty_string() {
        let mut pb = PieceBuffer::new(4).unwrap();
        assert_eq!(pb.flush(), sha1(b""));
    }
}
