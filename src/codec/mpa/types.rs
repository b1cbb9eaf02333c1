use crate::av::{CodecType, StreamFormat};
use crate::codec::FrameHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    /// Unofficial low sample rate extension
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo = 0,
    JointStereo = 1,
    DualChannel = 2,
    Mono = 3,
}

impl From<u8> for ChannelMode {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        }
    }
}

/// Bitrates in kbit/s indexed by `bitrate_index`; index 0 is free format.
pub(crate) const BITRATES_V1: [[u32; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

pub(crate) const BITRATES_V2: [[u32; 15]; 3] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

pub(crate) const SAMPLE_RATES: [[u32; 3]; 3] = [
    [44100, 48000, 32000],
    [22050, 24000, 16000],
    [11025, 12000, 8000],
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpaHeader {
    pub version: MpegVersion,
    /// 1, 2 or 3
    pub layer: u8,
    /// A CRC-16 follows the header
    pub protected: bool,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub private_bit: bool,
    pub channel_mode: ChannelMode,
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: u8,
}

impl MpaHeader {
    /// Frame size in bytes, excluding the padding slot.
    pub fn unpadded_len(&self) -> usize {
        let bitrate = self.bitrate_kbps as usize * 1000;
        let rate = self.sample_rate as usize;
        match (self.layer, self.version) {
            (1, _) => (12 * bitrate / rate) * 4,
            (3, MpegVersion::Mpeg2 | MpegVersion::Mpeg25) => 72 * bitrate / rate,
            _ => 144 * bitrate / rate,
        }
    }

    /// True when the bitrate divides into whole slots, so no frame of the
    /// stream ever carries padding.
    pub fn has_fixed_len(&self) -> bool {
        let bitrate = self.bitrate_kbps as usize * 1000;
        let rate = self.sample_rate as usize;
        let numerator = match (self.layer, self.version) {
            (1, _) => 12 * bitrate,
            (3, MpegVersion::Mpeg2 | MpegVersion::Mpeg25) => 72 * bitrate,
            _ => 144 * bitrate,
        };
        rate > 0 && numerator % rate == 0
    }

    pub fn channels(&self) -> u16 {
        if self.channel_mode == ChannelMode::Mono {
            1
        } else {
            2
        }
    }

    /// Bytes of layer III side information that follow the header (and CRC).
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            _ => 17,
        }
    }

    pub fn codec(&self) -> CodecType {
        match self.layer {
            1 => CodecType::MP1,
            2 => CodecType::MP2,
            _ => CodecType::MP3,
        }
    }
}

impl FrameHeader for MpaHeader {
    fn frame_len(&self) -> usize {
        let slot = if self.layer == 1 { 4 } else { 1 };
        self.unpadded_len() + if self.padding { slot } else { 0 }
    }

    fn samples(&self) -> u32 {
        match (self.layer, self.version) {
            (1, _) => 384,
            (3, MpegVersion::Mpeg2 | MpegVersion::Mpeg25) => 576,
            _ => 1152,
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn compatible_with(&self, other: &Self) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }

    fn stream_format(&self) -> StreamFormat {
        let mut format = StreamFormat::new(self.codec());
        format.sample_rate = self.sample_rate;
        format.channels = self.channels();
        format.samples_per_frame = self.samples();
        if self.has_fixed_len() {
            format.block_align = self.unpadded_len() as u32;
        }
        format.bitrate = self.bitrate_kbps * 1000;
        format
    }
}
