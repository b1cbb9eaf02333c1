//! # Byte sources
//!
//! Every parser in the crate reads its input through a [`ByteReader`], which
//! layers a read-ahead buffer and big-endian helpers over an abstract
//! [`ByteSource`]. The crate never opens files or sockets itself; callers
//! wrap whatever they have:
//!
//! ```rust
//! use vdkdemux::io::{ByteReader, SeekableSource};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = SeekableSource::new(Cursor::new(vec![0u8, 0, 0, 8, b'f', b'r', b'e', b'e']))?;
//! let mut reader = ByteReader::new(Box::new(source));
//! assert_eq!(reader.read_u32()?, 8);
//! assert_eq!(reader.len(), Some(8));
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VdkError};
use bytes::Bytes;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

const READ_AHEAD: usize = 16 * 1024;
/// Largest single growth of the read-ahead buffer.
const MAX_READ_STEP: usize = 1024 * 1024;

/// What a source can do beyond sequential reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Arbitrary byte seeks are supported.
    pub seekable: bool,
    /// `total_size` is known.
    pub known_length: bool,
}

/// The input a demuxer pulls bytes from.
pub trait ByteSource: Send {
    /// Reads up to `buf.len()` bytes; `Ok(0)` means end of input.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Moves the read position and returns the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;
    fn total_size(&self) -> Option<u64>;
    fn capabilities(&self) -> Capabilities;
}

/// A source backed by anything that implements `Read + Seek`.
pub struct SeekableSource<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek + Send> SeekableSource<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let current = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(current))?;
        Ok(Self { inner, len })
    }
}

impl<R: Read + Seek + Send> ByteSource for SeekableSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }

    fn total_size(&self) -> Option<u64> {
        Some(self.len)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            seekable: true,
            known_length: true,
        }
    }
}

/// A forward-only source such as a pipe. Forward seeks discard bytes,
/// backward seeks fail.
pub struct ForwardSource<R> {
    inner: R,
    position: u64,
    len: Option<u64>,
}

impl<R: Read + Send> ForwardSource<R> {
    pub fn new(inner: R, len: Option<u64>) -> Self {
        Self {
            inner,
            position: 0,
            len,
        }
    }
}

impl<R: Read + Send> ByteSource for ForwardSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::Current(d) => self.position.checked_add_signed(d),
            SeekFrom::End(d) => self.len.and_then(|len| len.checked_add_signed(d)),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid seek on forward-only source")
        })?;
        if target < self.position {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "backward seek on forward-only source",
            ));
        }
        let wanted = target - self.position;
        let skipped = io::copy(&mut (&mut self.inner).take(wanted), &mut io::sink())?;
        self.position += skipped;
        Ok(self.position)
    }

    fn total_size(&self) -> Option<u64> {
        self.len
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            seekable: false,
            known_length: self.len.is_some(),
        }
    }
}

/// Buffered cursor over a [`ByteSource`].
///
/// The cursor is the single point of truth for the read position; callers
/// that share a reader must serialize their access.
pub struct ByteReader {
    source: Box<dyn ByteSource>,
    buf: Vec<u8>,
    buf_start: u64,
    buf_pos: usize,
}

impl ByteReader {
    pub fn new(source: Box<dyn ByteSource>) -> Self {
        Self {
            source,
            buf: Vec::with_capacity(READ_AHEAD),
            buf_start: 0,
            buf_pos: 0,
        }
    }

    /// Reader over an in-memory byte string.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let len = data.len() as u64;
        Self::new(Box::new(SeekableSource {
            inner: Cursor::new(data),
            len,
        }))
    }

    pub fn position(&self) -> u64 {
        self.buf_start + self.buf_pos as u64
    }

    pub fn len(&self) -> Option<u64> {
        self.source.total_size()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.source.capabilities()
    }

    /// Bytes left before the known end of input, if the length is known.
    pub fn remaining(&self) -> Option<u64> {
        self.len().map(|len| len.saturating_sub(self.position()))
    }

    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        let buf_end = self.buf_start + self.buf.len() as u64;
        if position >= self.buf_start && position <= buf_end {
            self.buf_pos = (position - self.buf_start) as usize;
            return Ok(());
        }
        let landed = self.source.seek(SeekFrom::Start(position))?;
        self.buf.clear();
        self.buf_start = landed;
        self.buf_pos = 0;
        if landed != position {
            return Err(VdkError::truncated(position, landed));
        }
        Ok(())
    }

    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.seek_to(self.position() + n)
    }

    /// Makes at least `want` bytes available past the cursor if the source
    /// has them; returns how many are available.
    fn fill(&mut self, want: usize) -> Result<usize> {
        if self.buf_pos > 0 && self.buf_pos >= self.buf.len() / 2 {
            self.buf.drain(..self.buf_pos);
            self.buf_start += self.buf_pos as u64;
            self.buf_pos = 0;
        }
        while self.buf.len() - self.buf_pos < want {
            let have = self.buf.len();
            let grow = (want - (have - self.buf_pos)).clamp(READ_AHEAD, MAX_READ_STEP);
            self.buf.resize(have + grow, 0);
            let n = match self.source.read(&mut self.buf[have..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => 0,
                Err(e) => {
                    self.buf.truncate(have);
                    return Err(e.into());
                }
            };
            self.buf.truncate(have + n);
            if n == 0 {
                break;
            }
        }
        Ok(self.buf.len() - self.buf_pos)
    }

    /// Returns up to `n` bytes without consuming them.
    pub fn peek(&mut self, n: usize) -> Result<&[u8]> {
        let available = self.fill(n)?.min(n);
        Ok(&self.buf[self.buf_pos..self.buf_pos + available])
    }

    /// Reads up to `n` bytes; a short result means end of input.
    pub fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        let available = self.fill(n)?.min(n);
        let out = Bytes::copy_from_slice(&self.buf[self.buf_pos..self.buf_pos + available]);
        self.buf_pos += available;
        Ok(out)
    }

    /// Reads exactly `n` bytes or fails with `TruncatedInput`.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        if let Some(remaining) = self.remaining() {
            if n as u64 > remaining {
                return Err(VdkError::truncated(n as u64, remaining));
            }
        }
        let available = self.fill(n)?;
        if available < n {
            return Err(VdkError::truncated(n as u64, available as u64));
        }
        let out = Bytes::copy_from_slice(&self.buf[self.buf_pos..self.buf_pos + n]);
        self.buf_pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let available = self.fill(N)?;
        if available < N {
            return Err(VdkError::truncated(N as u64, available as u64));
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.buf_pos..self.buf_pos + N]);
        self.buf_pos += N;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let [a, b, c] = self.read_array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }
}

impl std::fmt::Debug for ByteReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteReader")
            .field("position", &self.position())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_big_endian_reads() {
        let mut reader = ByteReader::from_bytes(vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10, 0x11, 0x12,
        ]);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0203);
        assert_eq!(reader.read_u24().unwrap(), 0x040506);
        assert_eq!(reader.read_u32().unwrap(), 0x0708090A);
        assert_eq!(reader.read_u64().unwrap(), 0x0B0C0D0E0F101112);
        assert_eq!(reader.position(), 18);
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn test_short_reads() {
        let mut reader = ByteReader::from_bytes(vec![1, 2, 3]);
        match reader.read_bytes(5) {
            Err(VdkError::TruncatedInput { needed, available }) => {
                assert_eq!((needed, available), (5, 3));
            }
            other => panic!("expected truncation, got {:?}", other),
        }
        // Nothing consumed by the failed read
        assert_eq!(reader.position(), 0);
        assert_eq!(&reader.read_up_to(5).unwrap()[..], &[1, 2, 3]);
        assert!(reader.read_up_to(5).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_read_is_refused_up_front() {
        let mut reader = ByteReader::from_bytes(vec![0u8; 64]);
        reader.read_u32().unwrap();
        match reader.read_bytes(1 << 31) {
            Err(VdkError::TruncatedInput { needed, available }) => {
                assert_eq!((needed, available), (1 << 31, 60));
            }
            other => panic!("expected truncation, got {:?}", other),
        }
        assert!(reader.buf.capacity() <= READ_AHEAD);
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_unknown_length_grows_in_steps() {
        let source = ForwardSource::new(Cursor::new(vec![7u8; 100]), None);
        let mut reader = ByteReader::new(Box::new(source));
        assert!(matches!(
            reader.read_bytes(64 * 1024 * 1024),
            Err(VdkError::TruncatedInput { available: 100, .. })
        ));
        assert!(reader.buf.capacity() <= 2 * MAX_READ_STEP);
        assert_eq!(reader.read_bytes(100).unwrap().len(), 100);
    }

    #[test]
    fn test_seek_and_peek() {
        let data: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
        let mut reader = ByteReader::from_bytes(data);
        reader.seek_to(40_000).unwrap();
        assert_eq!(reader.peek(2).unwrap(), &[(40_000 % 256) as u8, (40_001 % 256) as u8]);
        assert_eq!(reader.read_u8().unwrap(), (40_000 % 256) as u8);
        reader.seek_to(10).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 10);
        reader.skip(5).unwrap();
        assert_eq!(reader.position(), 16);
        assert_eq!(reader.remaining(), Some(64 * 1024 - 16));
    }

    #[test]
    fn test_forward_source() {
        let data: Vec<u8> = (0..100u8).collect();
        let source = ForwardSource::new(Cursor::new(data), None);
        assert!(!source.capabilities().seekable);
        let mut reader = ByteReader::new(Box::new(source));
        reader.seek_to(50_000).unwrap_err();

        let source = ForwardSource::new(Cursor::new((0..100u8).collect::<Vec<_>>()), Some(100));
        let mut reader = ByteReader::new(Box::new(source));
        assert_eq!(reader.read_u8().unwrap(), 0);
        // Seeking inside the read-ahead works even without source seeks
        reader.seek_to(0).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0);
        assert_eq!(reader.len(), Some(100));
    }
}
