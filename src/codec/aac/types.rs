use crate::av::{CodecType, StreamFormat};
use crate::codec::FrameHeader;
use crate::utils::BitReader;
use crate::{Result, VdkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    Main = 0,
    LC = 1,
    SSR = 2,
    LTP = 3,
}

impl From<u8> for ProfileType {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => ProfileType::Main,
            1 => ProfileType::LC,
            2 => ProfileType::SSR,
            _ => ProfileType::LTP,
        }
    }
}

const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Maps a sampling frequency index to Hz.
pub fn sample_rate_for_index(index: u8) -> Option<u32> {
    SAMPLE_RATES.get(index as usize).copied()
}

/// Channel count for a channel configuration; 0 means "defined in-band".
pub fn channels_for_configuration(configuration: u8) -> u16 {
    match configuration {
        7 => 8,
        c => c as u16,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AACConfig {
    pub profile: ProfileType,
    pub sample_rate_index: u8,
    pub channel_configuration: u8,
    pub frame_length: u16,
}

impl Default for AACConfig {
    fn default() -> Self {
        Self {
            profile: ProfileType::LC,
            sample_rate_index: 4,     // 44100 Hz
            channel_configuration: 2, // Stereo
            frame_length: 1024,
        }
    }
}

impl AACConfig {
    /// Parses the leading fields of an MPEG-4 AudioSpecificConfig, as
    /// carried in an MP4 `esds` decoder specific info.
    pub fn from_audio_specific_config(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        let mut object_type = reader.read_bits(5)?;
        if object_type == 31 {
            object_type = 32 + reader.read_bits(6)?;
        }
        let sample_rate_index = reader.read_bits(4)? as u8;
        if sample_rate_index == 15 {
            // Explicit 24-bit frequency; not representable as an index.
            return Err(VdkError::Codec(
                "explicit AAC sampling frequency is not supported".into(),
            ));
        }
        if sample_rate_index >= 13 {
            return Err(VdkError::malformed(
                "AudioSpecificConfig",
                format!("reserved sampling index {}", sample_rate_index),
            ));
        }
        let channel_configuration = reader.read_bits(4)? as u8;
        // GASpecificConfig frameLengthFlag
        let short_frames = matches!(object_type, 1..=4 | 6 | 7 | 17 | 19..=23)
            && reader.read_flag().unwrap_or(false);
        let frame_length = if short_frames { 960 } else { 1024 };

        Ok(Self {
            profile: ProfileType::from(object_type.saturating_sub(1) as u8),
            sample_rate_index,
            channel_configuration,
            frame_length,
        })
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_for_index(self.sample_rate_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ADTSHeader {
    pub sync_word: u32,             // 12 bits
    pub id: u8,                     // 1 bit, 0=MPEG-4, 1=MPEG-2
    pub layer: u8,                  // 2 bits
    pub protection_absent: bool,    // 1 bit
    pub profile: ProfileType,       // 2 bits
    pub sample_rate_index: u8,      // 4 bits
    pub private_bit: bool,          // 1 bit
    pub channel_configuration: u8,  // 3 bits
    pub original_copy: bool,        // 1 bit
    pub home: bool,                 // 1 bit
    pub copyright_id_bit: bool,     // 1 bit
    pub copyright_id_start: bool,   // 1 bit
    pub frame_length: u16,          // 13 bits
    pub buffer_fullness: u16,       // 11 bits
    pub number_of_raw_blocks: u8,   // 2 bits
}

impl ADTSHeader {
    pub fn sync_word_valid(&self) -> bool {
        self.sync_word == 0xFFF
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_for_index(self.sample_rate_index)
    }

    /// 7 bytes, or 9 when a CRC follows.
    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            7
        } else {
            9
        }
    }

    /// Serializes the fixed and variable header (without CRC).
    pub fn to_bytes(&self) -> [u8; 7] {
        let mut bits: u64 = 0;
        let mut push = |value: u64, width: u32| {
            bits = (bits << width) | (value & ((1u64 << width) - 1));
        };
        push(self.sync_word as u64, 12);
        push(self.id as u64, 1);
        push(self.layer as u64, 2);
        push(self.protection_absent as u64, 1);
        push(self.profile as u64, 2);
        push(self.sample_rate_index as u64, 4);
        push(self.private_bit as u64, 1);
        push(self.channel_configuration as u64, 3);
        push(self.original_copy as u64, 1);
        push(self.home as u64, 1);
        push(self.copyright_id_bit as u64, 1);
        push(self.copyright_id_start as u64, 1);
        push(self.frame_length as u64, 13);
        push(self.buffer_fullness as u64, 11);
        push(self.number_of_raw_blocks as u64, 2);

        let mut out = [0u8; 7];
        out.copy_from_slice(&bits.to_be_bytes()[1..]);
        out
    }
}

impl FrameHeader for ADTSHeader {
    fn frame_len(&self) -> usize {
        self.frame_length as usize
    }

    fn samples(&self) -> u32 {
        1024 * (self.number_of_raw_blocks as u32 + 1)
    }

    fn sample_rate(&self) -> u32 {
        ADTSHeader::sample_rate(self).unwrap_or(0)
    }

    fn compatible_with(&self, other: &Self) -> bool {
        self.id == other.id
            && self.profile == other.profile
            && self.sample_rate_index == other.sample_rate_index
    }

    fn stream_format(&self) -> StreamFormat {
        let mut format = StreamFormat::new(CodecType::AAC);
        format.sample_rate = FrameHeader::sample_rate(self);
        format.channels = channels_for_configuration(self.channel_configuration);
        format.samples_per_frame = self.samples();
        format
    }
}
