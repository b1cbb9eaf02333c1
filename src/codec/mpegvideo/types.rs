use crate::av::{CodecType, CodingType, StreamFormat};
use crate::utils::BitReader;
use crate::{Result, VdkError};

pub const PICTURE_START_CODE: u8 = 0x00;
pub const SEQUENCE_HEADER_CODE: u8 = 0xB3;
pub const EXTENSION_START_CODE: u8 = 0xB5;
pub const SEQUENCE_END_CODE: u8 = 0xB7;
pub const GROUP_START_CODE: u8 = 0xB8;

/// Frame rate for a `frame_rate_code`, as (numerator, denominator).
pub fn frame_rate_for_code(code: u8) -> Option<(u32, u32)> {
    match code {
        1 => Some((24000, 1001)),
        2 => Some((24, 1)),
        3 => Some((25, 1)),
        4 => Some((30000, 1001)),
        5 => Some((30, 1)),
        6 => Some((50, 1)),
        7 => Some((60000, 1001)),
        8 => Some((60, 1)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio_code: u8,
    pub frame_rate_code: u8,
    /// In units of 400 bit/s; 0x3FFFF marks variable bitrate.
    pub bit_rate_value: u32,
    pub vbv_buffer_size: u32,
    pub constrained_parameters: bool,
}

/// Bytes following the start code needed to parse a sequence header.
pub const SEQUENCE_HEADER_LEN: usize = 8;

impl SequenceHeader {
    /// Parses the fields following `00 00 01 B3`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        let width = reader.read_bits(12)?;
        let height = reader.read_bits(12)?;
        let aspect_ratio_code = reader.read_bits(4)? as u8;
        let frame_rate_code = reader.read_bits(4)? as u8;
        let bit_rate_value = reader.read_bits(18)?;
        if !reader.read_flag()? {
            return Err(VdkError::malformed("MPEG video sequence header", "marker bit not set"));
        }
        let vbv_buffer_size = reader.read_bits(10)?;
        let constrained_parameters = reader.read_flag()?;

        if width == 0 || height == 0 {
            return Err(VdkError::malformed("MPEG video sequence header", "zero picture size"));
        }
        if aspect_ratio_code == 0 {
            return Err(VdkError::malformed("MPEG video sequence header", "forbidden aspect ratio"));
        }
        if frame_rate_for_code(frame_rate_code).is_none() {
            return Err(VdkError::malformed(
                "MPEG video sequence header",
                format!("reserved frame rate code {}", frame_rate_code),
            ));
        }

        Ok(Self {
            width,
            height,
            aspect_ratio_code,
            frame_rate_code,
            bit_rate_value,
            vbv_buffer_size,
            constrained_parameters,
        })
    }

    pub fn frame_rate(&self) -> (u32, u32) {
        frame_rate_for_code(self.frame_rate_code).unwrap_or((25, 1))
    }

    /// Frame duration at `timescale` ticks per second.
    pub fn frame_duration(&self, timescale: u32) -> i64 {
        let (num, den) = self.frame_rate();
        timescale as i64 * den as i64 / num as i64
    }

    pub fn stream_format(&self) -> StreamFormat {
        let mut format = StreamFormat::new(CodecType::MPEGVideo);
        format.width = self.width;
        format.height = self.height;
        format.frame_rate = Some(self.frame_rate());
        if self.bit_rate_value != 0x3FFFF {
            format.bitrate = self.bit_rate_value * 400;
        }
        format
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
    pub temporal_reference: u16,
    pub coding_type: CodingType,
}

/// Bytes following the start code needed to parse a picture header.
pub const PICTURE_HEADER_LEN: usize = 2;

impl PictureHeader {
    /// Parses the fields following `00 00 01 00`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        let temporal_reference = reader.read_bits(10)? as u16;
        let coding_type = match reader.read_bits(3)? {
            // D pictures (MPEG-1) are intra coded too
            1 | 4 => CodingType::I,
            2 => CodingType::P,
            3 => CodingType::B,
            other => {
                return Err(VdkError::malformed(
                    "MPEG video picture header",
                    format!("invalid coding type {}", other),
                ))
            }
        };
        Ok(Self {
            temporal_reference,
            coding_type,
        })
    }
}
