//! # Elementary stream parsers
//!
//! Each parser turns a raw elementary stream (or, for VP9, demuxer-framed
//! packets) into located, timestamped frames. They share one pull contract:
//!
//! ```rust
//! use vdkdemux::codec::{ParseStatus, StreamParser};
//! use vdkdemux::codec::aac::AdtsParser;
//!
//! # fn main() -> vdkdemux::Result<()> {
//! let mut parser = AdtsParser::new();
//! parser.push(&[0x00, 0xFF, 0xF1, 0x50, 0x80, 0x01, 0x1F, 0xFC, 0xAA]);
//! parser.set_eof();
//! loop {
//!     match parser.parse() {
//!         ParseStatus::NeedData => break, // append more input
//!         ParseStatus::HaveFormat => println!("format: {:?}", parser.format()),
//!         ParseStatus::HaveFrame(info) => {
//!             parser.flush(info.skip);
//!             let packet = parser.take_frame()?;
//!             assert_eq!(packet.byte_position, 1);
//!         }
//!         ParseStatus::Eof => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::av::{CodingType, Packet, StreamFormat};
use crate::Result;

/// AAC audio in ADTS framing
pub mod aac;
/// Sync-scanning engine shared by header-framed audio codecs
pub mod elementary;
/// MPEG-1/2 audio layers I, II and III
pub mod mpa;
/// MPEG-1/2 video
pub mod mpegvideo;
/// VP9 frame and superframe parsing
pub mod vp9;

pub use elementary::{ElementaryParser, FrameHeader, FrameSync, SyncCheck};

/// Outcome of one [`StreamParser::parse`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    /// Not enough bytes to decide; push more and call again.
    NeedData,
    /// Format parameters were just discovered. No frame is reported by
    /// this call; the next call reports it.
    HaveFormat,
    /// A frame has been located.
    HaveFrame(FrameInfo),
    /// End of stream reached, nothing more to emit.
    Eof,
}

/// Where a located frame sits and how it is timed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Buffered bytes preceding the frame; flush exactly these before taking it.
    pub skip: usize,
    /// Absolute stream position of the first frame byte.
    pub position: u64,
    pub size: usize,
    pub timestamp: i64,
    pub duration: i64,
    pub timescale: u32,
    pub coding_type: CodingType,
    pub keyframe: bool,
    pub no_output: bool,
}

impl FrameInfo {
    pub(crate) fn to_packet(&self, data: bytes::Bytes) -> Packet {
        Packet::new(data)
            .with_position(self.position as i64)
            .with_timestamp(self.timestamp, self.timescale)
            .with_duration(self.duration)
            .with_coding_type(self.coding_type)
            .with_key_flag(self.keyframe)
            .with_no_output(self.no_output)
    }
}

/// Pull contract for parsers that consume a raw byte stream.
///
/// The parser never drops bytes on its own: after `HaveFrame` the caller
/// flushes the `skip` prefix and takes the frame.
pub trait StreamParser: Send {
    /// Appends input bytes.
    fn push(&mut self, data: &[u8]);

    /// Marks that no more input will arrive.
    fn set_eof(&mut self);

    fn parse(&mut self) -> ParseStatus;

    /// Discards `n` bytes from the front of the buffer.
    fn flush(&mut self, n: usize);

    /// Removes the located frame from the buffer. The frame must be at the
    /// buffer start, i.e. its `skip` prefix already flushed.
    fn take_frame(&mut self) -> Result<Packet>;

    /// Drops all buffered state and resumes at `position` with the running
    /// timestamp set to `timestamp`.
    fn reset(&mut self, position: u64, timestamp: i64);

    fn format(&self) -> Option<&StreamFormat>;

    /// Leading buffered bytes already ruled out as frame starts.
    fn scanned(&self) -> usize {
        0
    }
}
