use bytes::Bytes;

/// How a video frame was coded. Audio frames are always `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodingType {
    /// Intra coded
    I,
    /// Predicted from earlier frames
    P,
    /// Bidirectionally predicted
    B,
    #[default]
    Unknown,
}

/// One demuxable unit of compressed data.
///
/// `timestamp` is the decode timestamp in `timescale` units; the
/// presentation time adds `presentation_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub data: Bytes,
    pub byte_position: i64,
    pub size: u32,
    pub timestamp: i64,
    pub presentation_offset: i64,
    pub duration: i64,
    pub timescale: u32,
    pub stream_index: usize,
    pub coding_type: CodingType,
    pub keyframe: bool,
    /// Decoded but never displayed (hidden reference frames).
    pub no_output: bool,
}

impl Packet {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            size: data.len() as u32,
            data,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, byte_position: i64) -> Self {
        self.byte_position = byte_position;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64, timescale: u32) -> Self {
        self.timestamp = timestamp;
        self.timescale = timescale;
        self
    }

    pub fn with_presentation_offset(mut self, offset: i64) -> Self {
        self.presentation_offset = offset;
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_stream_index(mut self, index: usize) -> Self {
        self.stream_index = index;
        self
    }

    pub fn with_coding_type(mut self, coding_type: CodingType) -> Self {
        self.coding_type = coding_type;
        self
    }

    pub fn with_key_flag(mut self, keyframe: bool) -> Self {
        self.keyframe = keyframe;
        self
    }

    pub fn with_no_output(mut self, no_output: bool) -> Self {
        self.no_output = no_output;
        self
    }

    pub fn presentation_time(&self) -> i64 {
        self.timestamp + self.presentation_offset
    }
}
