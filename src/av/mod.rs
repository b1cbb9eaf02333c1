use bytes::Bytes;

mod packet;
pub use packet::*;

/// Sample/time index and seek resolution
pub mod index;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
    H264,
    H265,
    AAC,
    /// MPEG-1/2 audio layer I
    MP1,
    /// MPEG-1/2 audio layer II
    MP2,
    /// MPEG-1/2 audio layer III
    MP3,
    /// MPEG-1/2 video
    MPEGVideo,
    VP9,
    OPUS,
    /// Anything else, identified by its sample entry fourcc
    Unknown([u8; 4]),
}

impl CodecType {
    /// Maps an MP4 sample entry fourcc to a codec.
    pub fn from_fourcc(fourcc: [u8; 4]) -> Self {
        match &fourcc {
            b"avc1" | b"avc3" => CodecType::H264,
            b"hvc1" | b"hev1" => CodecType::H265,
            b"mp4a" => CodecType::AAC,
            b".mp3" => CodecType::MP3,
            b"mp4v" | b"mp2v" => CodecType::MPEGVideo,
            b"vp09" => CodecType::VP9,
            b"Opus" => CodecType::OPUS,
            _ => CodecType::Unknown(fourcc),
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(
            self,
            CodecType::H264 | CodecType::H265 | CodecType::MPEGVideo | CodecType::VP9
        )
    }
}

/// Stream parameters discovered from headers.
///
/// Audio fields are zero for video streams and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub codec: CodecType,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_frame: u32,
    /// Fixed size of one frame in bytes, 0 when frames vary.
    pub block_align: u32,
    /// Bits per second, 0 when unknown.
    pub bitrate: u32,
    pub width: u32,
    pub height: u32,
    /// Frames per second as `(numerator, denominator)`.
    pub frame_rate: Option<(u32, u32)>,
}

impl StreamFormat {
    pub fn new(codec: CodecType) -> Self {
        Self {
            codec,
            sample_rate: 0,
            channels: 0,
            samples_per_frame: 0,
            block_align: 0,
            bitrate: 0,
            width: 0,
            height: 0,
            frame_rate: None,
        }
    }
}

/// Description of one demuxed stream.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub index: usize,
    /// Container track id, or 0 for elementary streams.
    pub track_id: u32,
    pub timescale: u32,
    /// Duration in `timescale` units when the container declares one.
    pub duration: Option<i64>,
    pub format: StreamFormat,
    /// Codec configuration record (avcC, esds, vpcC, ...)
    pub extra_data: Option<Bytes>,
}

/// Pull interface shared by every demuxer.
pub trait Demuxer: Send {
    /// Streams known so far.
    fn streams(&self) -> &[StreamInfo];

    /// Returns the next packet, or `None` at end of input.
    fn read_packet(&mut self) -> crate::Result<Option<Packet>>;

    /// Repositions to the keyframe at or before `time` (in `timescale`
    /// units) and returns the resolved time in the same units.
    fn seek(&mut self, time: i64, timescale: u32) -> crate::Result<i64>;

    /// Rewinds to the first packet.
    fn reset(&mut self) -> crate::Result<()>;
}
