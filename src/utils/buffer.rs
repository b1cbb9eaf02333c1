use bytes::{Buf, Bytes, BytesMut};

/// Not-yet-consumed elementary stream bytes together with the absolute
/// stream offset of the first buffered byte.
///
/// Bytes only leave the buffer through [`flush`](Self::flush) or
/// [`take`](Self::take); nothing is ever re-read once consumed.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: BytesMut,
    offset: u64,
}

impl ByteBuffer {
    pub fn new(offset: u64) -> Self {
        Self {
            data: BytesMut::new(),
            offset,
        }
    }

    /// Appends freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Discards `n` bytes from the front. Flushing more than is buffered
    /// empties the buffer.
    pub fn flush(&mut self, n: usize) {
        let n = n.min(self.data.len());
        self.data.advance(n);
        self.offset += n as u64;
    }

    /// Removes and returns `n` bytes from the front, or `None` when fewer
    /// are buffered.
    pub fn take(&mut self, n: usize) -> Option<Bytes> {
        if n > self.data.len() {
            return None;
        }
        self.offset += n as u64;
        Some(self.data.split_to(n).freeze())
    }

    /// Drops everything and restarts at `offset`.
    pub fn reset(&mut self, offset: u64) {
        self.data.clear();
        self.offset = offset;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Absolute stream offset of the first buffered byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
