use super::{FrameInfo, ParseStatus, StreamParser};
use crate::av::{CodingType, Packet, StreamFormat};
use crate::utils::ByteBuffer;
use crate::{Result, VdkError};

/// Result of testing one candidate header position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCheck<H> {
    Valid(H),
    Invalid,
    /// More bytes are needed to decide.
    NeedMore,
}

/// A parsed frame header whose fields fully determine the frame extent.
pub trait FrameHeader: Clone + Send {
    /// Total frame size in bytes, header included.
    fn frame_len(&self) -> usize;
    /// Audio samples carried by the frame.
    fn samples(&self) -> u32;
    fn sample_rate(&self) -> u32;
    /// Whether `other` can belong to the same stream as `self`.
    fn compatible_with(&self, other: &Self) -> bool;
    fn stream_format(&self) -> StreamFormat;
}

/// Codec-specific header recognition plugged into [`ElementaryParser`].
pub trait FrameSync: Send {
    type Header: FrameHeader;

    /// Fewest bytes `check` can ever decide on.
    const MIN_HEADER_LEN: usize;

    /// Tests whether a valid header starts at `data[0]`.
    fn check(&self, data: &[u8]) -> SyncCheck<Self::Header>;
}

#[derive(Debug, Clone)]
struct Located<H> {
    skip: usize,
    header: H,
    timestamp: i64,
}

/// Header-driven frame scanner.
///
/// A candidate header is accepted when the header directly after its frame
/// is valid too, or when it continues the previously accepted frame without
/// a gap, or when the stream ends right after it. Scanning resumes where it
/// stopped, so each byte is tested at most once per candidate position.
pub struct ElementaryParser<S: FrameSync> {
    sync: S,
    buffer: ByteBuffer,
    scan: usize,
    reference: Option<S::Header>,
    format: Option<StreamFormat>,
    located: Option<Located<S::Header>>,
    /// Absolute end of the last taken frame; a header there is in sync.
    locked_at: Option<u64>,
    timestamp: i64,
    eof: bool,
}

impl<S: FrameSync> ElementaryParser<S> {
    pub fn with_sync(sync: S) -> Self {
        Self {
            sync,
            buffer: ByteBuffer::new(0),
            scan: 0,
            reference: None,
            format: None,
            located: None,
            locked_at: None,
            timestamp: 0,
            eof: false,
        }
    }

    /// Header of the first confirmed frame.
    pub fn reference_header(&self) -> Option<&S::Header> {
        self.reference.as_ref()
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn compatible(&self, header: &S::Header) -> bool {
        self.reference
            .as_ref()
            .map_or(true, |reference| reference.compatible_with(header))
    }

    /// Decides the candidate at `pos`. `None` means more data is needed.
    fn confirm(&self, pos: usize) -> Option<Option<S::Header>> {
        let data = self.buffer.as_slice();
        let header = match self.sync.check(&data[pos..]) {
            SyncCheck::Valid(header) if self.compatible(&header) => header,
            SyncCheck::Valid(_) | SyncCheck::Invalid => return Some(None),
            SyncCheck::NeedMore if self.eof => return Some(None),
            SyncCheck::NeedMore => return None,
        };

        let len = header.frame_len();
        let end = pos + len;
        if end > data.len() {
            return if self.eof { Some(None) } else { None };
        }

        let in_sync = self.locked_at == Some(self.buffer.offset() + pos as u64);
        if in_sync || (self.eof && end == data.len()) {
            return Some(Some(header));
        }

        let reference = self.reference.as_ref().unwrap_or(&header);
        match self.sync.check(&data[end..]) {
            SyncCheck::Valid(next) if reference.compatible_with(&next) => Some(Some(header)),
            SyncCheck::NeedMore if self.eof => Some(Some(header)),
            SyncCheck::NeedMore => None,
            _ => Some(None),
        }
    }

    fn frame_info(&self, located: &Located<S::Header>) -> FrameInfo {
        FrameInfo {
            skip: located.skip,
            position: self.buffer.offset() + located.skip as u64,
            size: located.header.frame_len(),
            timestamp: located.timestamp,
            duration: located.header.samples() as i64,
            timescale: located.header.sample_rate(),
            coding_type: CodingType::Unknown,
            keyframe: true,
            no_output: false,
        }
    }
}

impl<S: FrameSync> StreamParser for ElementaryParser<S> {
    fn push(&mut self, data: &[u8]) {
        self.buffer.push(data);
    }

    fn set_eof(&mut self) {
        self.eof = true;
    }

    fn parse(&mut self) -> ParseStatus {
        if let Some(located) = &self.located {
            return ParseStatus::HaveFrame(self.frame_info(located));
        }

        loop {
            if self.scan + S::MIN_HEADER_LEN > self.buffer.len() {
                if !self.eof {
                    return ParseStatus::NeedData;
                }
                if self.scan >= self.buffer.len() {
                    return ParseStatus::Eof;
                }
            }

            match self.confirm(self.scan) {
                None => return ParseStatus::NeedData,
                Some(None) => {
                    if self.locked_at == Some(self.buffer.offset() + self.scan as u64) {
                        log::debug!(
                            "lost sync at offset {}",
                            self.buffer.offset() + self.scan as u64
                        );
                    }
                    self.scan += 1;
                }
                Some(Some(header)) => {
                    let located = Located {
                        skip: self.scan,
                        header,
                        timestamp: self.timestamp,
                    };
                    if self.reference.is_none() {
                        let format = located.header.stream_format();
                        log::debug!(
                            "elementary stream format at offset {}: {:?}",
                            self.buffer.offset() + self.scan as u64,
                            format
                        );
                        self.reference = Some(located.header.clone());
                        self.format = Some(format);
                        self.located = Some(located);
                        return ParseStatus::HaveFormat;
                    }
                    let info = self.frame_info(&located);
                    self.located = Some(located);
                    return ParseStatus::HaveFrame(info);
                }
            }
        }
    }

    fn flush(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.flush(n);
        self.scan = self.scan.saturating_sub(n);
        if let Some(located) = &mut self.located {
            if n > located.skip {
                // The frame itself was discarded.
                self.located = None;
                self.scan = 0;
            } else {
                located.skip -= n;
            }
        }
    }

    fn take_frame(&mut self) -> Result<Packet> {
        let located = match &self.located {
            Some(located) if located.skip == 0 => located.clone(),
            Some(located) => {
                return Err(VdkError::Parser(format!(
                    "{} bytes precede the frame; flush them first",
                    located.skip
                )))
            }
            None => return Err(VdkError::Parser("no frame has been located".into())),
        };

        let info = self.frame_info(&located);
        let data = self
            .buffer
            .take(info.size)
            .ok_or_else(|| VdkError::truncated(info.size as u64, self.buffer.len() as u64))?;
        self.located = None;
        self.scan = 0;
        self.timestamp += info.duration;
        self.locked_at = Some(self.buffer.offset());
        Ok(info.to_packet(data))
    }

    fn reset(&mut self, position: u64, timestamp: i64) {
        self.buffer.reset(position);
        self.scan = 0;
        self.located = None;
        self.locked_at = None;
        self.timestamp = timestamp;
        self.eof = false;
    }

    fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    fn scanned(&self) -> usize {
        match &self.located {
            Some(located) => located.skip,
            None => self.scan,
        }
    }
}
