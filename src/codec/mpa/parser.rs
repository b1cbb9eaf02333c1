use super::types::{ChannelMode, MpaHeader, MpegVersion, BITRATES_V1, BITRATES_V2, SAMPLE_RATES};
use crate::codec::{ElementaryParser, FrameSync, SyncCheck};
use crate::utils::{BitReader, Crc16};
use crate::{Result, VdkError};

/// MPEG audio frame header length in bytes.
pub const HEADER_LEN: usize = 4;

/// Parses and validates a four-byte MPEG audio frame header.
///
/// Reserved versions, layers, bitrates, sample rates and emphasis values
/// are rejected, as is free-format bitrate (its frame length cannot be
/// derived from the header alone).
pub fn parse_mpa_header(data: &[u8]) -> Result<MpaHeader> {
    if data.len() < HEADER_LEN {
        return Err(VdkError::Parser("MPEG audio header too short".into()));
    }

    let mut reader = BitReader::new(&data[..HEADER_LEN]);

    let sync = reader.read_bits(11)?;
    if sync != 0x7FF {
        return Err(VdkError::malformed("MPEG audio header", "bad sync word"));
    }

    let version = match reader.read_bits(2)? {
        0 => MpegVersion::Mpeg25,
        2 => MpegVersion::Mpeg2,
        3 => MpegVersion::Mpeg1,
        _ => return Err(VdkError::malformed("MPEG audio header", "reserved version")),
    };
    let layer = match reader.read_bits(2)? {
        0 => return Err(VdkError::malformed("MPEG audio header", "reserved layer")),
        bits => 4 - bits as u8,
    };
    let protected = !reader.read_flag()?;

    let bitrate_index = reader.read_bits(4)? as usize;
    if bitrate_index == 0 {
        return Err(VdkError::malformed("MPEG audio header", "free format bitrate"));
    }
    if bitrate_index == 15 {
        return Err(VdkError::malformed("MPEG audio header", "bad bitrate index"));
    }
    let table = if version == MpegVersion::Mpeg1 {
        &BITRATES_V1
    } else {
        &BITRATES_V2
    };
    let bitrate_kbps = table[layer as usize - 1][bitrate_index];

    let rate_index = reader.read_bits(2)? as usize;
    if rate_index == 3 {
        return Err(VdkError::malformed("MPEG audio header", "reserved sample rate"));
    }
    let sample_rate = match version {
        MpegVersion::Mpeg1 => SAMPLE_RATES[0][rate_index],
        MpegVersion::Mpeg2 => SAMPLE_RATES[1][rate_index],
        MpegVersion::Mpeg25 => SAMPLE_RATES[2][rate_index],
    };

    let padding = reader.read_flag()?;
    let private_bit = reader.read_flag()?;
    let channel_mode = ChannelMode::from(reader.read_bits(2)? as u8);
    let mode_extension = reader.read_bits(2)? as u8;
    let copyright = reader.read_flag()?;
    let original = reader.read_flag()?;
    let emphasis = reader.read_bits(2)? as u8;
    if emphasis == 2 {
        return Err(VdkError::malformed("MPEG audio header", "reserved emphasis"));
    }

    Ok(MpaHeader {
        version,
        layer,
        protected,
        bitrate_kbps,
        sample_rate,
        padding,
        private_bit,
        channel_mode,
        mode_extension,
        copyright,
        original,
        emphasis,
    })
}

/// Sync recognition for MPEG audio; layer III CRCs are verified.
pub struct MpaSync {
    crc: Crc16,
}

impl MpaSync {
    pub fn new() -> Self {
        Self { crc: Crc16::new() }
    }

    /// Checks the CRC-16 of a protected layer III frame starting at `data[0]`.
    /// `None` when not enough bytes are present yet.
    pub fn verify_crc(&self, header: &MpaHeader, data: &[u8]) -> Option<bool> {
        if !header.protected || header.layer != 3 {
            return Some(true);
        }
        let end = HEADER_LEN + 2 + header.side_info_len();
        if data.len() < end {
            return None;
        }
        let stored = u16::from_be_bytes([data[4], data[5]]);
        let computed = self.crc.calculate(&[&data[2..4], &data[6..end]]);
        Some(stored == computed)
    }
}

impl Default for MpaSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSync for MpaSync {
    type Header = MpaHeader;

    const MIN_HEADER_LEN: usize = HEADER_LEN;

    fn check(&self, data: &[u8]) -> SyncCheck<MpaHeader> {
        if data.len() < HEADER_LEN {
            return SyncCheck::NeedMore;
        }
        if data[0] != 0xFF || data[1] & 0xE0 != 0xE0 {
            return SyncCheck::Invalid;
        }
        let header = match parse_mpa_header(data) {
            Ok(header) => header,
            Err(_) => return SyncCheck::Invalid,
        };
        match self.verify_crc(&header, data) {
            Some(true) => SyncCheck::Valid(header),
            Some(false) => SyncCheck::Invalid,
            None => SyncCheck::NeedMore,
        }
    }
}

/// Elementary parser for MPEG-1/2/2.5 audio streams.
pub type MpaParser = ElementaryParser<MpaSync>;

impl ElementaryParser<MpaSync> {
    pub fn new() -> Self {
        Self::with_sync(MpaSync::new())
    }
}

impl Default for ElementaryParser<MpaSync> {
    fn default() -> Self {
        Self::new()
    }
}
