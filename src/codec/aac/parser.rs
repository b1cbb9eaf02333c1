use super::types::{ADTSHeader, ProfileType};
use crate::codec::{ElementaryParser, FrameSync, SyncCheck};
use crate::utils::BitReader;
use crate::{Result, VdkError};

/// Fixed ADTS header length; a CRC adds two bytes.
pub const ADTS_HEADER_LEN: usize = 7;

/// Parses an ADTS header and checks the fields that must hold for a real
/// frame: sync word, layer, sampling index and a frame length that at
/// least covers the header.
pub fn parse_adts_header(data: &[u8]) -> Result<ADTSHeader> {
    if data.len() < ADTS_HEADER_LEN {
        return Err(VdkError::Parser("ADTS header too short".into()));
    }

    let mut reader = BitReader::new(&data[..ADTS_HEADER_LEN]);

    let sync_word = reader.read_bits(12)?;
    if sync_word != 0xFFF {
        return Err(VdkError::malformed("ADTS header", "invalid sync word"));
    }

    let id = reader.read_bits(1)? as u8;
    let layer = reader.read_bits(2)? as u8;
    if layer != 0 {
        return Err(VdkError::malformed("ADTS header", "layer must be 0"));
    }
    let protection_absent = reader.read_bits(1)? == 1;

    let profile = ProfileType::from(reader.read_bits(2)? as u8);

    let sample_rate_index = reader.read_bits(4)? as u8;
    if sample_rate_index >= 13 {
        return Err(VdkError::malformed(
            "ADTS header",
            format!("reserved sampling index {}", sample_rate_index),
        ));
    }
    let private_bit = reader.read_bits(1)? == 1;
    let channel_configuration = reader.read_bits(3)? as u8;
    let original_copy = reader.read_bits(1)? == 1;
    let home = reader.read_bits(1)? == 1;

    let copyright_id_bit = reader.read_bits(1)? == 1;
    let copyright_id_start = reader.read_bits(1)? == 1;
    let frame_length = reader.read_bits(13)? as u16;
    let buffer_fullness = reader.read_bits(11)? as u16;
    let number_of_raw_blocks = reader.read_bits(2)? as u8;

    let header = ADTSHeader {
        sync_word,
        id,
        layer,
        protection_absent,
        profile,
        sample_rate_index,
        private_bit,
        channel_configuration,
        original_copy,
        home,
        copyright_id_bit,
        copyright_id_start,
        frame_length,
        buffer_fullness,
        number_of_raw_blocks,
    };

    if (header.frame_length as usize) < header.header_len() {
        return Err(VdkError::malformed(
            "ADTS header",
            format!("frame length {} shorter than header", header.frame_length),
        ));
    }

    Ok(header)
}

/// Sync recognition for ADTS framed AAC.
#[derive(Debug, Default)]
pub struct AdtsSync;

impl FrameSync for AdtsSync {
    type Header = ADTSHeader;

    const MIN_HEADER_LEN: usize = ADTS_HEADER_LEN;

    fn check(&self, data: &[u8]) -> SyncCheck<ADTSHeader> {
        if data.len() < ADTS_HEADER_LEN {
            return SyncCheck::NeedMore;
        }
        if data[0] != 0xFF || data[1] & 0xF6 != 0xF0 {
            return SyncCheck::Invalid;
        }
        match parse_adts_header(data) {
            Ok(header) => SyncCheck::Valid(header),
            Err(_) => SyncCheck::Invalid,
        }
    }
}

/// Elementary parser for ADTS streams.
pub type AdtsParser = ElementaryParser<AdtsSync>;

impl ElementaryParser<AdtsSync> {
    pub fn new() -> Self {
        Self::with_sync(AdtsSync)
    }
}

impl Default for ElementaryParser<AdtsSync> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FrameHeader, ParseStatus, StreamParser};
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn adts_frame(payload_len: usize, raw_blocks: u8) -> Vec<u8> {
        let header = ADTSHeader {
            sync_word: 0xFFF,
            id: 0,
            layer: 0,
            protection_absent: true,
            profile: ProfileType::LC,
            sample_rate_index: 4, // 44.1kHz
            private_bit: false,
            channel_configuration: 2, // Stereo
            original_copy: false,
            home: false,
            copyright_id_bit: false,
            copyright_id_start: false,
            frame_length: (payload_len + ADTS_HEADER_LEN) as u16,
            buffer_fullness: 0x7FF,
            number_of_raw_blocks: raw_blocks,
        };
        let mut frame = header.to_bytes().to_vec();
        frame.extend(vec![0x21; payload_len]);
        frame
    }

    #[test]
    fn test_parse_adts_header() {
        // ADTS header for AAC-LC, 44.1kHz, stereo, 8 byte frame
        let data = vec![0xFF, 0xF1, 0x50, 0x80, 0x01, 0x1F, 0xFC];

        let header = parse_adts_header(&data).unwrap();

        assert!(header.sync_word_valid());
        assert_eq!(header.profile, ProfileType::LC);
        assert_eq!(header.sample_rate_index, 4);
        assert_eq!(header.sample_rate(), Some(44100));
        assert_eq!(header.channel_configuration, 2);
        assert_eq!(header.frame_length, 8);
        assert_eq!(header.buffer_fullness, 0x7FF);
        assert_eq!(header.to_bytes().to_vec(), data);
    }

    #[test]
    fn test_invalid_headers() {
        // Bad sync
        assert!(parse_adts_header(&[0x00, 0x00, 0x50, 0x80, 0x01, 0x1F, 0xFC]).is_err());
        // Layer 01
        assert!(parse_adts_header(&[0xFF, 0xF3, 0x50, 0x80, 0x01, 0x1F, 0xFC]).is_err());
        // Sampling index 13
        assert!(parse_adts_header(&[0xFF, 0xF1, 0x74, 0x80, 0x01, 0x1F, 0xFC]).is_err());
        // Frame length 6 < header
        assert!(parse_adts_header(&[0xFF, 0xF1, 0x50, 0x80, 0x00, 0xDF, 0xFC]).is_err());
    }

    #[test]
    fn test_frames_and_timestamps() {
        let mut stream = vec![0x00];
        stream.extend(adts_frame(20, 0));
        stream.extend(adts_frame(30, 1));
        stream.extend(adts_frame(10, 0));

        let mut parser = AdtsParser::new();
        parser.push(&stream);
        parser.set_eof();

        assert_eq!(parser.parse(), ParseStatus::HaveFormat);
        let format = parser.format().unwrap().clone();
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.channels, 2);

        let mut packets = Vec::new();
        loop {
            match parser.parse() {
                ParseStatus::HaveFrame(info) => {
                    parser.flush(info.skip);
                    packets.push(parser.take_frame().unwrap());
                }
                ParseStatus::Eof => break,
                other => panic!("unexpected {:?}", other),
            }
        }
        let summary: Vec<_> = packets
            .iter()
            .map(|p| (p.byte_position, p.size, p.timestamp))
            .collect();
        assert_eq!(summary, vec![(1, 27, 0), (28, 37, 1024), (65, 17, 3072)]);
    }

    #[test]
    fn test_flushing_past_frame_start_drops_it() {
        let mut stream = adts_frame(20, 0);
        stream.extend(adts_frame(20, 0));
        let mut parser = AdtsParser::new();
        parser.push(&stream);
        assert_eq!(parser.parse(), ParseStatus::HaveFormat);
        parser.flush(3);
        assert!(parser.take_frame().is_err());
        // Rescans and finds the second frame at EOF
        parser.set_eof();
        match parser.parse() {
            ParseStatus::HaveFrame(info) => assert_eq!(info.position, 27),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[quickcheck]
    fn prop_chunking_does_not_change_frames(sizes: Vec<u8>, chunk: u8) -> bool {
        let mut stream = Vec::new();
        for size in sizes.iter().take(10) {
            stream.extend(adts_frame(*size as usize, size % 2));
        }
        let collect = |chunk: usize| {
            let mut parser = AdtsParser::new();
            let mut chunks = stream.chunks(chunk);
            let mut out = Vec::new();
            loop {
                match parser.parse() {
                    ParseStatus::NeedData => match chunks.next() {
                        Some(c) => parser.push(c),
                        None => parser.set_eof(),
                    },
                    ParseStatus::HaveFormat => {}
                    ParseStatus::HaveFrame(info) => {
                        parser.flush(info.skip);
                        parser.take_frame().unwrap();
                        out.push((info.position, info.size, info.timestamp));
                    }
                    ParseStatus::Eof => return out,
                }
            }
        };
        let whole = collect(stream.len().max(1));
        whole.len() == sizes.len().min(10) && whole == collect(chunk as usize % 31 + 1)
    }

    #[test]
    fn test_header_samples() {
        let header = parse_adts_header(&adts_frame(4, 3)).unwrap();
        assert_eq!(header.samples(), 4096);
        assert_eq!(header.frame_len(), 11);
    }
}
