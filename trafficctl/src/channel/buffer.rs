//! Output buffer for terminal reads.
//!
//! Chunks are cleaned as they arrive: ANSI escape sequences are removed and
//! NUL bytes, which some controllers emit as padding, are dropped. Control
//! bytes other than `\n` go too, so CRLF line ends come out as `\n`.

use bytes::{BufMut, BytesMut};
use regex::bytes::Regex;

/// Accumulates cleaned terminal output.
#[derive(Debug)]
pub struct OutputBuffer {
    buffer: BytesMut,

    /// How many bytes from the end are searched for a prompt.
    search_depth: usize,
}

impl OutputBuffer {
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Append a chunk, stripping ANSI escapes and NUL bytes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        let mut rest = cleaned.as_slice();
        while let Some(pos) = memchr::memchr(0, rest) {
            self.buffer.put_slice(&rest[..pos]);
            rest = &rest[pos + 1..];
        }
        self.buffer.put_slice(rest);
    }

    /// Whether the tail of the buffer matches `pattern`.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.is_match(&self.buffer[start..])
    }

    /// Take the contents as text and reset the buffer.
    pub fn take_string(&mut self) -> String {
        let data = self.buffer.split().freeze();
        String::from_utf8_lossy(&data).into_owned()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_ansi_and_nul() {
        let mut buffer = OutputBuffer::default();
        buffer.extend(b"\x1b[2J\x1b[Hinstat102\0\0 ?\r\n");
        assert_eq!(buffer.as_slice(), b"instat102 ?\n");
    }

    #[test]
    fn test_tail_search_depth() {
        let mut buffer = OutputBuffer::new(8);
        buffer.extend(b"SWARCO>");
        buffer.extend(&[b'x'; 32]);
        let prompt = Regex::new(r">").unwrap();
        assert!(!buffer.tail_contains(&prompt));

        buffer.extend(b"\r\nSWARCO>");
        assert!(buffer.tail_contains(&prompt));
    }

    #[test]
    fn test_take_resets() {
        let mut buffer = OutputBuffer::default();
        buffer.extend(b"OK\r\n");
        assert_eq!(buffer.take_string(), "OK\n");
        assert!(buffer.is_empty());
    }
}
