//! An in-order byte FIFO with a fixed capacity, shared between a writing
//! side (the network, or the application on the send path) and a reading
//! side. Single-owner, not thread-safe.

use std::collections::VecDeque;

/// Bounded byte stream. The writer may close it (EOF); either side may mark
/// it errored, and the error is sticky and visible to both.
#[derive(Debug)]
pub struct ByteStream {
    buf: VecDeque<u8>,
    capacity: usize,
    pushed: u64,
    popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::new(),
            capacity,
            pushed: 0,
            popped: 0,
            closed: false,
            error: false,
        }
    }

    // Writer side.

    /// Append as much of `data` as fits. No-op once closed or errored.
    pub fn push(&mut self, data: &[u8]) {
        if self.closed || self.error || data.is_empty() {
            return;
        }
        let take = data.len().min(self.available_capacity());
        if take == 0 {
            return;
        }
        self.buf.extend(&data[..take]);
        self.pushed += take as u64;
    }

    /// Signal the end of the stream. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn available_capacity(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.pushed
    }

    // Reader side.

    /// A contiguous prefix of the buffered bytes — not necessarily all of
    /// them. Loop until `bytes_buffered` reaches zero to drain everything.
    pub fn peek(&self) -> &[u8] {
        self.buf.as_slices().0
    }

    /// Discard the first `n` buffered bytes; `n` must not exceed
    /// `bytes_buffered`.
    pub fn pop(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.drain(..n);
        self.popped += n as u64;
    }

    /// True once the writer has closed and every byte has been popped.
    pub fn is_finished(&self) -> bool {
        self.closed && self.buf.is_empty()
    }

    pub fn bytes_popped(&self) -> u64 {
        self.popped
    }

    pub fn bytes_buffered(&self) -> usize {
        self.buf.len()
    }

    // Both sides.

    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn has_error(&self) -> bool {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(stream: &mut ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while stream.bytes_buffered() > 0 {
            let prefix = stream.peek().to_vec();
            stream.pop(prefix.len());
            out.extend_from_slice(&prefix);
        }
        out
    }

    #[test]
    fn push_truncates_at_capacity() {
        let mut stream = ByteStream::new(4);
        stream.push(b"abcdef");
        assert_eq!(stream.bytes_pushed(), 4);
        assert_eq!(stream.available_capacity(), 0);
        assert_eq!(stream.peek(), b"abcd");

        // full stream: further pushes are no-ops
        stream.push(b"xyz");
        assert_eq!(stream.bytes_pushed(), 4);

        stream.pop(4);
        assert_eq!(stream.bytes_popped(), 4);
        assert!(!stream.is_finished());
        stream.close();
        assert!(stream.is_finished());
    }

    #[test]
    fn accounting_invariant_holds_across_operations() {
        let mut stream = ByteStream::new(10);
        for chunk in [&b"hello"[..], b"", b"world", b"!"] {
            stream.push(chunk);
            assert_eq!(
                stream.bytes_pushed() - stream.bytes_popped(),
                stream.bytes_buffered() as u64
            );
            assert!(stream.bytes_buffered() <= 10);
        }
        stream.pop(3);
        assert_eq!(
            stream.bytes_pushed() - stream.bytes_popped(),
            stream.bytes_buffered() as u64
        );
    }

    #[test]
    fn capacity_frees_as_bytes_pop() {
        let mut stream = ByteStream::new(4);
        stream.push(b"abcd");
        stream.pop(2);
        stream.push(b"efgh");
        assert_eq!(drain(&mut stream), b"cdef");
        assert_eq!(stream.bytes_pushed(), 6);
    }

    #[test]
    fn close_stops_pushes() {
        let mut stream = ByteStream::new(8);
        stream.push(b"ab");
        stream.close();
        stream.close();
        stream.push(b"cd");
        assert_eq!(stream.bytes_pushed(), 2);
        assert!(!stream.is_finished());
        stream.pop(2);
        assert!(stream.is_finished());
    }

    #[test]
    fn error_is_sticky_and_stops_pushes() {
        let mut stream = ByteStream::new(8);
        stream.push(b"ab");
        stream.set_error();
        assert!(stream.has_error());
        stream.push(b"cd");
        assert_eq!(stream.bytes_pushed(), 2);
    }
}
