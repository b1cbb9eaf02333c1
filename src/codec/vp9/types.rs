use crate::av::{CodecType, CodingType, StreamFormat};
use crate::utils::BitReader;
use crate::{Result, VdkError};

pub const FRAME_MARKER: u32 = 2;
pub const SYNC_CODE: [u8; 3] = [0x49, 0x83, 0x42];

const CS_RGB: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    pub bit_depth: u8,
    pub color_space: u8,
    pub full_range: bool,
    pub subsampling_x: bool,
    pub subsampling_y: bool,
}

impl ColorConfig {
    /// Implied configuration of profile 0 intra-only frames.
    pub const PROFILE_0: ColorConfig = ColorConfig {
        bit_depth: 8,
        color_space: 1,
        full_range: false,
        subsampling_x: true,
        subsampling_y: true,
    };
}

/// The leading fields of a VP9 uncompressed frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vp9FrameHeader {
    pub profile: u8,
    /// Index of the reference frame to redisplay, when set no new frame is
    /// decoded.
    pub show_existing_frame: Option<u8>,
    pub keyframe: bool,
    pub show_frame: bool,
    pub error_resilient: bool,
    pub intra_only: bool,
    pub color: Option<ColorConfig>,
    /// Coded frame size, present for key and intra-only frames.
    pub size: Option<(u32, u32)>,
    /// Bits consumed from the header.
    pub header_bits: usize,
}

impl Vp9FrameHeader {
    pub fn coding_type(&self) -> CodingType {
        if self.show_existing_frame.is_none() && (self.keyframe || self.intra_only) {
            CodingType::I
        } else {
            CodingType::P
        }
    }

    /// Whether this frame contributes to the presentation sequence.
    pub fn is_shown(&self) -> bool {
        self.show_existing_frame.is_some() || self.show_frame
    }

    pub fn stream_format(&self) -> Option<StreamFormat> {
        let (width, height) = self.size?;
        let mut format = StreamFormat::new(CodecType::VP9);
        format.width = width;
        format.height = height;
        Some(format)
    }

    /// Reads the uncompressed header fields up to the frame size.
    ///
    /// A wrong frame marker or sync code fails the whole frame; inter frames
    /// are read only as far as `reset_frame_context`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);

        let marker = reader.read_bits(2)?;
        if marker != FRAME_MARKER {
            return Err(VdkError::malformed(
                "VP9 frame header",
                format!("frame marker {} != {}", marker, FRAME_MARKER),
            ));
        }
        let low = reader.read_bits(1)? as u8;
        let high = reader.read_bits(1)? as u8;
        let profile = (high << 1) | low;
        if profile == 3 && reader.read_flag()? {
            return Err(VdkError::malformed("VP9 frame header", "reserved bit set"));
        }

        let mut header = Self {
            profile,
            show_existing_frame: None,
            keyframe: false,
            show_frame: false,
            error_resilient: false,
            intra_only: false,
            color: None,
            size: None,
            header_bits: 0,
        };

        if reader.read_flag()? {
            header.show_existing_frame = Some(reader.read_bits(3)? as u8);
            header.header_bits = reader.bit_position();
            return Ok(header);
        }

        header.keyframe = reader.read_bits(1)? == 0;
        header.show_frame = reader.read_flag()?;
        header.error_resilient = reader.read_flag()?;

        if header.keyframe {
            read_sync_code(&mut reader)?;
            header.color = Some(read_color_config(&mut reader, profile)?);
            header.size = Some(read_frame_size(&mut reader)?);
        } else {
            header.intra_only = if header.show_frame {
                false
            } else {
                reader.read_flag()?
            };
            if !header.error_resilient {
                reader.skip_bits(2)?; // reset_frame_context
            }
            if header.intra_only {
                read_sync_code(&mut reader)?;
                header.color = Some(if profile > 0 {
                    read_color_config(&mut reader, profile)?
                } else {
                    ColorConfig::PROFILE_0
                });
                reader.skip_bits(8)?; // refresh_frame_flags
                header.size = Some(read_frame_size(&mut reader)?);
            }
        }

        header.header_bits = reader.bit_position();
        Ok(header)
    }
}

fn read_sync_code(reader: &mut BitReader) -> Result<()> {
    for expected in SYNC_CODE {
        let byte = reader.read_bits(8)? as u8;
        if byte != expected {
            return Err(VdkError::malformed(
                "VP9 frame header",
                format!("sync code byte {:#04x}, expected {:#04x}", byte, expected),
            ));
        }
    }
    Ok(())
}

fn read_color_config(reader: &mut BitReader, profile: u8) -> Result<ColorConfig> {
    let bit_depth = if profile >= 2 {
        if reader.read_flag()? {
            12
        } else {
            10
        }
    } else {
        8
    };
    let color_space = reader.read_bits(3)? as u8;
    let odd_profile = profile == 1 || profile == 3;

    let config = if color_space != CS_RGB {
        let full_range = reader.read_flag()?;
        let (subsampling_x, subsampling_y) = if odd_profile {
            let x = reader.read_flag()?;
            let y = reader.read_flag()?;
            reader.skip_bits(1)?;
            (x, y)
        } else {
            (true, true)
        };
        ColorConfig {
            bit_depth,
            color_space,
            full_range,
            subsampling_x,
            subsampling_y,
        }
    } else {
        if odd_profile {
            reader.skip_bits(1)?;
        }
        ColorConfig {
            bit_depth,
            color_space,
            full_range: true,
            subsampling_x: false,
            subsampling_y: false,
        }
    };
    Ok(config)
}

fn read_frame_size(reader: &mut BitReader) -> Result<(u32, u32)> {
    let width = reader.read_bits(16)? + 1;
    let height = reader.read_bits(16)? + 1;
    Ok((width, height))
}

/// Splits a packet at its superframe index.
///
/// Returns `(offset, len)` for each frame; a packet without a valid index is
/// a single frame.
pub fn split_superframe(data: &[u8]) -> Vec<(usize, usize)> {
    let whole = vec![(0, data.len())];
    let marker = match data.last() {
        Some(&b) if b & 0xE0 == 0xC0 => b,
        _ => return whole,
    };
    let bytes_per_size = (((marker >> 3) & 0x3) + 1) as usize;
    let frames = ((marker & 0x7) + 1) as usize;
    let index_len = 2 + bytes_per_size * frames;
    if data.len() < index_len || data[data.len() - index_len] != marker {
        return whole;
    }

    let index = &data[data.len() - index_len + 1..data.len() - 1];
    let mut out = Vec::with_capacity(frames);
    let mut offset = 0;
    for size_bytes in index.chunks(bytes_per_size) {
        let size = size_bytes
            .iter()
            .rev()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        if size == 0 {
            continue;
        }
        out.push((offset, size));
        offset += size;
    }

    if offset > data.len() - index_len {
        log::debug!(
            "superframe index covers {} bytes, only {} available",
            offset,
            data.len() - index_len
        );
        return whole;
    }
    out
}
