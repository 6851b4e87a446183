//! Stream framing for the manager interface
//!
//! The switch writes a continuous byte stream in which each message ends with
//! an empty line (`\r\n\r\n`). Reads from the socket split that stream at
//! arbitrary points, so the framer keeps whatever follows the last terminator
//! and only yields a block once its terminator has arrived.

use std::fmt;

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

/// Marker ending every manager message
pub const TERMINATOR: &[u8] = b"\r\n\r\n";

const INITIAL_BUFFER_SIZE: usize = 8192;

/// One complete message block, without its terminator
#[derive(Clone, PartialEq, Eq)]
pub struct RawBlock(Bytes);

impl RawBlock {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lossy UTF-8 view of the block
    pub fn to_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for RawBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawBlock({:?})", self.to_text())
    }
}

impl From<&str> for RawBlock {
    fn from(text: &str) -> Self {
        Self(Bytes::copy_from_slice(text.as_bytes()))
    }
}

/// Reassembles terminator-delimited blocks from arbitrary chunks
#[derive(Debug)]
pub struct StreamFramer {
    buffer: BytesMut,
    /// Offset up to which the buffer is known not to contain a terminator
    scanned: usize,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            scanned: 0,
        }
    }

    /// Append a chunk and return every block completed by it, in order
    pub fn feed(&mut self, data: &[u8]) -> Vec<RawBlock> {
        self.buffer.extend_from_slice(data);

        let mut blocks = Vec::new();
        while let Some(pos) = self.find_terminator() {
            let block = self.buffer.split_to(pos).freeze();
            self.buffer.advance(TERMINATOR.len());
            self.scanned = 0;
            trace!("Framed {} byte block", block.len());
            blocks.push(RawBlock(block));
        }

        // A terminator may straddle this chunk and the next one
        self.scanned = self.buffer.len().saturating_sub(TERMINATOR.len() - 1);
        blocks
    }

    /// Bytes received after the last terminator
    pub fn remainder(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop any partial block, e.g. after the transport reconnects
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    fn find_terminator(&self) -> Option<usize> {
        if self.buffer.len() < TERMINATOR.len() {
            return None;
        }
        self.buffer[self.scanned..]
            .windows(TERMINATOR.len())
            .position(|window| window == TERMINATOR)
            .map(|pos| pos + self.scanned)
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(blocks: &[RawBlock]) -> Vec<String> {
        blocks.iter().map(|b| b.to_text().into_owned()).collect()
    }

    #[test]
    fn test_single_block() {
        let mut framer = StreamFramer::new();
        let blocks = framer.feed(b"Event: Hangup\r\nUniqueid: 1\r\n\r\n");
        assert_eq!(texts(&blocks), vec!["Event: Hangup\r\nUniqueid: 1"]);
        assert!(framer.is_empty());
    }

    #[test]
    fn test_multiple_blocks_in_one_chunk() {
        let mut framer = StreamFramer::new();
        let blocks = framer.feed(b"A: 1\r\n\r\nB: 2\r\n\r\nC: 3");
        assert_eq!(texts(&blocks), vec!["A: 1", "B: 2"]);
        assert_eq!(framer.remainder(), b"C: 3");
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut framer = StreamFramer::new();
        assert!(framer.feed(b"A: 1\r\n\r").is_empty());
        assert!(framer.feed(b"").is_empty());
        let blocks = framer.feed(b"\nB: 2\r\n\r\n");
        assert_eq!(texts(&blocks), vec!["A: 1", "B: 2"]);
        assert!(framer.is_empty());
    }

    #[test]
    fn test_terminator_split_byte_by_byte() {
        let mut framer = StreamFramer::new();
        let mut blocks = Vec::new();
        for byte in b"Response: Success\r\n\r\n" {
            blocks.extend(framer.feed(&[*byte]));
        }
        assert_eq!(texts(&blocks), vec!["Response: Success"]);
    }

    #[test]
    fn test_no_block_without_terminator() {
        let mut framer = StreamFramer::new();
        let partial = b"Event: Newchannel\r\nChannel: SIP/100\r\n";
        assert!(framer.feed(partial).is_empty());
        assert_eq!(framer.remainder(), &partial[..]);
    }

    #[test]
    fn test_clear_drops_partial_block() {
        let mut framer = StreamFramer::new();
        framer.feed(b"Event: Partial\r\n\r");
        framer.clear();
        assert_eq!(framer.feed(b"\nA: 1\r\n\r\n").len(), 1);
    }
}
