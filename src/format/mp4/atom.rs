//! Box headers and bounded body access.
//!
//! A box is `[size u32][fourcc][body]`, with a 64-bit size following the
//! fourcc when `size == 1` and the box running to the end of its parent
//! when `size == 0`. Bodies are handed out as bounded slices, so a body
//! parser can stop early but never read into a sibling.

use bytes::Bytes;

use crate::io::ByteReader;
use crate::{Result, VdkError};

pub type FourCC = [u8; 4];

/// Most entries accepted for a table whose entries carry no fields, such as
/// a `trun` relying on defaults for every sample.
pub const MAX_FIELDLESS_ENTRIES: u32 = 1 << 18;

/// Printable form of a fourcc for logs and errors.
pub fn fourcc_str(kind: &FourCC) -> String {
    kind.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    pub kind: FourCC,
    /// Absolute position of the first header byte.
    pub start: u64,
    /// Total size including the header, with `size == 0` already resolved.
    pub size: u64,
    /// 8, or 16 with a 64-bit size.
    pub header_len: u8,
}

impl AtomHeader {
    pub fn body_start(&self) -> u64 {
        self.start + self.header_len as u64
    }

    pub fn body_len(&self) -> u64 {
        self.size - self.header_len as u64
    }

    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Decodes a header from `data`, which starts at absolute `start` and
    /// whose enclosing extent ends at `limit`.
    ///
    /// `Ok(None)` means fewer than 8 bytes remain before `limit`.
    pub fn decode(data: &[u8], start: u64, limit: u64) -> Result<Option<Self>> {
        let room = limit.saturating_sub(start);
        if room < 8 {
            return Ok(None);
        }
        if data.len() < 8 {
            return Err(VdkError::truncated(8, data.len() as u64));
        }

        let size32 = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let kind = [data[4], data[5], data[6], data[7]];
        let (size, header_len) = match size32 {
            0 => (room, 8u8),
            1 => {
                if data.len() < 16 {
                    return Err(VdkError::truncated(16, data.len() as u64));
                }
                let mut large = [0u8; 8];
                large.copy_from_slice(&data[8..16]);
                (u64::from_be_bytes(large), 16u8)
            }
            n => (n as u64, 8u8),
        };

        if size < header_len as u64 {
            return Err(VdkError::malformed(
                format!("box '{}' at {}", fourcc_str(&kind), start),
                format!("size {} smaller than its header", size),
            ));
        }
        if size > room {
            return Err(VdkError::TruncatedInput {
                needed: size,
                available: room,
            });
        }

        let header = Self {
            kind,
            start,
            size,
            header_len,
        };
        log::trace!(
            "box '{}' at {}, size {}",
            fourcc_str(&kind),
            start,
            size
        );
        Ok(Some(header))
    }

    /// Reads the header at the reader position. `limit` is the end of the
    /// enclosing extent, the input length at top level.
    pub fn read(reader: &mut ByteReader, limit: u64) -> Result<Option<Self>> {
        let start = reader.position();
        if limit.saturating_sub(start) < 8 {
            return Ok(None);
        }
        let data = reader.peek(16)?;
        if data.is_empty() {
            return Ok(None);
        }
        let header = Self::decode(data, start, limit)?;
        if let Some(header) = &header {
            reader.skip(header.header_len as u64)?;
        }
        Ok(header)
    }
}

/// Iterates the child boxes packed in a container body.
///
/// Every step moves to exactly `child.start + child.size`, whatever the
/// consumer did with the body.
pub struct Atoms {
    data: Bytes,
    base: u64,
    pos: usize,
    failed: bool,
}

impl Atoms {
    /// `data` is a container body whose first byte sits at absolute `base`.
    pub fn new(data: Bytes, base: u64) -> Self {
        Self {
            data,
            base,
            pos: 0,
            failed: false,
        }
    }
}

impl Iterator for Atoms {
    type Item = Result<(AtomHeader, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let start = self.base + self.pos as u64;
        let limit = self.base + self.data.len() as u64;
        match AtomHeader::decode(&self.data[self.pos..], start, limit) {
            Ok(Some(header)) => {
                let body_start = self.pos + header.header_len as usize;
                let end = self.pos + header.size as usize;
                let body = self.data.slice(body_start..end);
                self.pos = end;
                Some(Ok((header, body)))
            }
            Ok(None) => {
                if self.pos < self.data.len() {
                    log::trace!(
                        "{} trailing bytes after last box at {}",
                        self.data.len() - self.pos,
                        start
                    );
                }
                None
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Big-endian field reader over one box body.
#[derive(Debug, Clone)]
pub struct BodyReader {
    data: Bytes,
    pos: usize,
}

impl BodyReader {
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(VdkError::truncated(n as u64, self.remaining() as u64));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let hi = self.read_u32()? as u64;
        let lo = self.read_u32()? as u64;
        Ok((hi << 32) | lo)
    }

    pub fn read_fourcc(&mut self) -> Result<FourCC> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Full box prefix: `(version, flags)`.
    pub fn read_full_header(&mut self) -> Result<(u8, u32)> {
        let version = self.read_u8()?;
        let flags = self.read_u24()?;
        Ok((version, flags))
    }

    /// 32-bit field in version 0 boxes, 64-bit in version 1.
    pub fn read_versioned(&mut self, version: u8) -> Result<u64> {
        if version == 1 {
            self.read_u64()
        } else {
            Ok(self.read_u32()? as u64)
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        if self.remaining() < n {
            return Err(VdkError::truncated(n as u64, self.remaining() as u64));
        }
        let out = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(out)
    }

    /// Everything left in the body.
    pub fn rest(&mut self) -> Bytes {
        let out = self.data.slice(self.pos..);
        self.pos = self.data.len();
        out
    }

    /// Reads a table of `count` entries, refusing counts the body cannot
    /// hold before allocating.
    pub fn read_table<T>(
        &mut self,
        count: u32,
        entry_len: usize,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let needed = count as u64 * entry_len as u64;
        if needed > self.remaining() as u64 {
            return Err(VdkError::truncated(needed, self.remaining() as u64));
        }
        // entries without fields take no room in the body
        if entry_len == 0 && count > MAX_FIELDLESS_ENTRIES {
            return Err(VdkError::malformed(
                "box table",
                format!(
                    "{} entries without fields, limit {}",
                    count, MAX_FIELDLESS_ENTRIES
                ),
            ));
        }
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(read(self)?);
        }
        Ok(out)
    }
}
