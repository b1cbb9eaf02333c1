//! Demuxing of raw elementary streams (ADTS, MPEG audio, MPEG video).
//!
//! The whole input is one stream. The seek index is filled as frames are
//! read, so a seek past the indexed range first scans forward.

use super::{DemuxerFactory, ProbeScore};
use crate::av::index::{frame_aligned_seek, rescale, IndexEntry, SeekIndex};
use crate::av::{Demuxer, Packet, StreamInfo};
use crate::codec::aac::AdtsParser;
use crate::codec::mpa::MpaParser;
use crate::codec::mpegvideo::MpegVideoParser;
use crate::codec::{FrameInfo, ParseStatus, StreamParser};
use crate::config::Config;
use crate::io::ByteReader;
use crate::{Result, VdkError};

pub struct EsDemuxer<P: StreamParser> {
    reader: ByteReader,
    parser: P,
    streams: Vec<StreamInfo>,
    index: Option<SeekIndex>,
    chunk_size: usize,
    reserve_chunk: usize,
    /// Position of the first frame.
    data_start: u64,
    /// First frame, read while opening.
    primed: Option<Packet>,
}

impl<P: StreamParser> EsDemuxer<P> {
    /// Opens the stream and reads up to its first frame.
    ///
    /// Fails with `UnsupportedFormat` when the input holds no frame.
    pub fn open(reader: ByteReader, parser: P, config: &Config) -> Result<Self> {
        let mut demuxer = Self {
            reader,
            parser,
            streams: Vec::new(),
            index: None,
            chunk_size: config.read_chunk_size.max(1),
            reserve_chunk: config.index_reserve_chunk,
            data_start: 0,
            primed: None,
        };
        let (info, packet) = demuxer
            .next_frame()?
            .ok_or_else(|| VdkError::UnsupportedFormat("no elementary stream frame found".into()))?;
        demuxer.data_start = info.position;
        demuxer.primed = Some(packet);
        log::debug!(
            "elementary stream starts at {}, timescale {}",
            info.position,
            info.timescale
        );
        Ok(demuxer)
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn index(&self) -> Option<&SeekIndex> {
        self.index.as_ref()
    }

    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    fn next_frame(&mut self) -> Result<Option<(FrameInfo, Packet)>> {
        loop {
            match self.parser.parse() {
                ParseStatus::NeedData => {
                    let data = self.reader.read_up_to(self.chunk_size)?;
                    if data.is_empty() {
                        self.parser.set_eof();
                    } else {
                        self.parser.push(&data);
                    }
                }
                ParseStatus::HaveFormat => self.update_format(),
                ParseStatus::HaveFrame(info) => {
                    self.parser.flush(info.skip);
                    let packet = self.parser.take_frame()?;
                    self.record(&info);
                    return Ok(Some((info, packet)));
                }
                ParseStatus::Eof => return Ok(None),
            }
        }
    }

    fn update_format(&mut self) {
        let format = match self.parser.format() {
            Some(format) => format.clone(),
            None => return,
        };
        log::debug!("elementary stream format: {:?}", format);
        match self.streams.first_mut() {
            Some(stream) => stream.format = format,
            None => self.streams.push(StreamInfo {
                index: 0,
                track_id: 0,
                timescale: 0,
                duration: None,
                format,
                extra_data: None,
            }),
        }
    }

    /// Checks a frame against the block size and indexes it when it extends
    /// the indexed range.
    fn record(&mut self, info: &FrameInfo) {
        if let Some(stream) = self.streams.first_mut() {
            if stream.timescale == 0 {
                stream.timescale = info.timescale;
            }
            let block_align = stream.format.block_align as usize;
            if block_align > 0 && info.size != block_align {
                log::debug!(
                    "frame at {} is {} bytes, not {}; byte seeks use the index",
                    info.position,
                    info.size,
                    block_align
                );
                stream.format.block_align = 0;
            }
        }
        let reserve_chunk = self.reserve_chunk;
        let index = self
            .index
            .get_or_insert_with(|| SeekIndex::with_reserve_chunk(info.timescale, reserve_chunk));
        let extends = index
            .last()
            .map_or(true, |last| info.timestamp > last.time && info.position > last.position);
        if extends {
            if let Err(e) = index.push(IndexEntry::new(info.timestamp, info.position, info.keyframe)) {
                log::warn!("frame at {} not indexed: {}", info.position, e);
            }
        }
    }

    /// Repositions reader and parser at `position`, with the running
    /// timestamp set to `timestamp`.
    fn restart(&mut self, position: u64, timestamp: i64) -> Result<()> {
        self.reader.seek_to(position)?;
        self.parser.reset(position, timestamp);
        self.primed = None;
        Ok(())
    }

    /// Reads ahead until the index reaches `done`, resuming from the last
    /// indexed frame.
    fn scan_until(&mut self, done: impl Fn(&SeekIndex) -> bool) -> Result<()> {
        let last = match &self.index {
            Some(index) if done(index) => return Ok(()),
            Some(index) => index.last().copied(),
            None => None,
        };
        if let Some(last) = last {
            self.restart(last.position, last.time)?;
        }
        log::debug!("scanning ahead to extend the seek index");
        while self.next_frame()?.is_some() {
            if self.index.as_ref().is_some_and(&done) {
                break;
            }
        }
        Ok(())
    }

    /// Seeks to a byte position.
    ///
    /// Frames up to `position` are scanned first. When every one of them has
    /// the block size the position snaps to the frame grid and the
    /// timestamp follows exactly. Otherwise the reader restarts at the last
    /// indexed keyframe at or before `position`. Returns the timestamp of
    /// the next packet.
    pub fn seek_bytes(&mut self, position: u64) -> Result<i64> {
        self.scan_until(|index| index.last().is_some_and(|last| last.position >= position))?;

        let format = self.streams.first().map(|stream| stream.format.clone());
        if let Some(format) = format {
            if let Some((offset, samples)) = frame_aligned_seek(
                position,
                self.data_start,
                format.block_align,
                format.samples_per_frame,
            ) {
                self.restart(offset, samples)?;
                return Ok(samples);
            }
        }

        let entry = self
            .index
            .as_ref()
            .and_then(|index| index.resolve_position(position).and_then(|i| index.get(i).copied()));
        match entry {
            Some(entry) => {
                self.restart(entry.position, entry.time)?;
                Ok(entry.time)
            }
            None => {
                self.restart(self.data_start, 0)?;
                Ok(0)
            }
        }
    }
}

impl<P: StreamParser> Demuxer for EsDemuxer<P> {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        if let Some(packet) = self.primed.take() {
            return Ok(Some(packet));
        }
        Ok(self.next_frame()?.map(|(_, packet)| packet))
    }

    fn seek(&mut self, time: i64, timescale: u32) -> Result<i64> {
        self.scan_until(|index| index.covers(time, timescale))?;
        let entry = self.index.as_ref().and_then(|index| {
            let i = index.resolve(time, timescale)?;
            Some((index.entries()[i], index.timescale()))
        });
        match entry {
            Some((entry, index_timescale)) => {
                log::debug!(
                    "seek to {}/{}: frame at {}, time {}",
                    time,
                    timescale,
                    entry.position,
                    entry.time
                );
                self.restart(entry.position, entry.time)?;
                Ok(rescale(entry.time, index_timescale, timescale))
            }
            None => {
                self.restart(self.data_start, 0)?;
                Ok(0)
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.restart(self.data_start, 0)
    }
}

/// Counts frames a parser finds in `data`, treated as the whole input.
///
/// Two or more frames, the first at offset 0, is a confident match.
fn probe_with<P: StreamParser>(mut parser: P, data: &[u8]) -> ProbeScore {
    parser.push(data);
    parser.set_eof();
    let mut frames = 0;
    let mut first = None;
    loop {
        match parser.parse() {
            ParseStatus::HaveFrame(info) => {
                first.get_or_insert(info.position);
                frames += 1;
                parser.flush(info.skip);
                if parser.take_frame().is_err() || frames >= 4 {
                    break;
                }
            }
            ParseStatus::HaveFormat => {}
            ParseStatus::NeedData | ParseStatus::Eof => break,
        }
    }
    match (frames, first) {
        (0, _) => ProbeScore::NONE,
        (1, _) => ProbeScore::WEAK,
        (_, Some(0)) => ProbeScore::CERTAIN,
        _ => ProbeScore::LIKELY,
    }
}

/// AAC in ADTS framing.
pub struct AdtsFactory;

impl DemuxerFactory for AdtsFactory {
    fn name(&self) -> &'static str {
        "adts"
    }

    fn probe(&self, data: &[u8]) -> ProbeScore {
        probe_with(AdtsParser::new(), data)
    }

    fn open(&self, reader: ByteReader, config: &Config) -> Result<Box<dyn Demuxer>> {
        Ok(Box::new(EsDemuxer::open(reader, AdtsParser::new(), config)?))
    }
}

/// MPEG-1/2 audio, layers I to III.
pub struct MpaFactory;

impl DemuxerFactory for MpaFactory {
    fn name(&self) -> &'static str {
        "mpa"
    }

    fn probe(&self, data: &[u8]) -> ProbeScore {
        probe_with(MpaParser::new(), data)
    }

    fn open(&self, reader: ByteReader, config: &Config) -> Result<Box<dyn Demuxer>> {
        Ok(Box::new(EsDemuxer::open(reader, MpaParser::new(), config)?))
    }
}

/// MPEG-1/2 video elementary streams.
pub struct MpegVideoFactory;

impl DemuxerFactory for MpegVideoFactory {
    fn name(&self) -> &'static str {
        "mpegvideo"
    }

    fn probe(&self, data: &[u8]) -> ProbeScore {
        // frames only close at the next start code, so a sequence header
        // up front is the stronger signal
        if data.starts_with(&[0x00, 0x00, 0x01, 0xB3]) {
            return ProbeScore::CERTAIN;
        }
        match probe_with(MpegVideoParser::new(), data) {
            ProbeScore::CERTAIN => ProbeScore::LIKELY,
            score => score,
        }
    }

    fn open(&self, reader: ByteReader, config: &Config) -> Result<Box<dyn Demuxer>> {
        Ok(Box::new(EsDemuxer::open(reader, MpegVideoParser::new(), config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    /// ADTS frame: AAC-LC, 44.1 kHz, stereo, no CRC, `len` bytes total.
    fn adts_frame(len: usize, fill: u8) -> Vec<u8> {
        let mut frame = vec![
            0xFF,
            0xF1,
            0x50,
            0x80 | ((len >> 11) & 0x03) as u8,
            ((len >> 3) & 0xFF) as u8,
            (((len & 0x07) << 5) as u8) | 0x1F,
            0xFC,
        ];
        frame.resize(len, fill);
        frame
    }

    fn adts_stream(frames: usize) -> Vec<u8> {
        (0..frames)
            .flat_map(|i| adts_frame(20 + (i % 3) * 4, i as u8))
            .collect()
    }

    fn open_adts(data: Vec<u8>) -> EsDemuxer<AdtsParser> {
        EsDemuxer::open(ByteReader::from_bytes(data), AdtsParser::new(), &Config::default()).unwrap()
    }

    fn timestamps(demuxer: &mut EsDemuxer<AdtsParser>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(packet) = demuxer.read_packet().unwrap() {
            out.push(packet.timestamp);
        }
        out
    }

    #[test]
    fn test_open_skips_garbage() {
        let mut data = vec![0x42];
        data.extend(adts_stream(3));
        let mut demuxer = open_adts(data);
        assert_eq!(demuxer.data_start(), 1);
        assert_eq!(demuxer.streams()[0].timescale, 44100);
        assert_eq!(demuxer.streams()[0].format.channels, 2);
        let first = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(first.byte_position, 1);
        assert_eq!(first.timestamp, 0);
    }

    #[test]
    fn test_no_frames() {
        let result = EsDemuxer::open(
            ByteReader::from_bytes(vec![0u8; 64]),
            AdtsParser::new(),
            &Config::default(),
        );
        assert!(matches!(result, Err(VdkError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_read_and_index() {
        let mut demuxer = open_adts(adts_stream(6));
        let ts = timestamps(&mut demuxer);
        assert_eq!(ts, vec![0, 1024, 2048, 3072, 4096, 5120]);
        let index = demuxer.index().unwrap();
        assert_eq!(index.len(), 6);
        assert_eq!(index.get(1).unwrap().position, 20);
    }

    #[test]
    fn test_seek_scans_ahead() {
        let mut demuxer = open_adts(adts_stream(10));
        assert_eq!(demuxer.index().unwrap().len(), 1);

        assert_eq!(demuxer.seek(5000, 44100).unwrap(), 4096);
        assert!(demuxer.index().unwrap().len() >= 6);
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.timestamp, 4096);
        assert_eq!(packet.byte_position, 20 + 24 + 28 + 20);

        // same target, same answer
        assert_eq!(demuxer.seek(5000, 44100).unwrap(), 4096);
        assert_eq!(demuxer.read_packet().unwrap().unwrap().timestamp, 4096);
    }

    #[test]
    fn test_seek_in_other_timescale() {
        let mut demuxer = open_adts(adts_stream(10));
        // 100 ms = 4410 samples
        assert_eq!(demuxer.seek(100, 1000).unwrap(), 92);
        assert_eq!(demuxer.read_packet().unwrap().unwrap().timestamp, 4096);
    }

    #[test]
    fn test_seek_past_end_and_reset() {
        let mut demuxer = open_adts(adts_stream(4));
        assert_eq!(demuxer.seek(1_000_000, 44100).unwrap(), 3072);
        assert_eq!(timestamps(&mut demuxer), vec![3072]);

        demuxer.reset().unwrap();
        assert_eq!(timestamps(&mut demuxer), vec![0, 1024, 2048, 3072]);
    }

    #[test]
    fn test_seek_bytes_variable_frames() {
        let mut demuxer = open_adts(adts_stream(8));
        assert_eq!(demuxer.seek_bytes(50).unwrap(), 2048);
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!((packet.byte_position, packet.timestamp), (44, 2048));
    }

    /// MPEG-1 layer III, 48 kHz, mono: 384 bytes at 128 kbit/s, 768 at 256.
    fn mp3_frame(high_rate: bool) -> Vec<u8> {
        let rate_bits = if high_rate { 0xC4 } else { 0x94 };
        let mut frame = vec![0u8; if high_rate { 768 } else { 384 }];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, rate_bits, 0xC0]);
        frame
    }

    #[test]
    fn test_seek_bytes_mixed_bitrate() {
        let mut data = mp3_frame(false);
        data.extend(mp3_frame(true));
        for _ in 0..4 {
            data.extend(mp3_frame(false));
        }
        let mut demuxer =
            EsDemuxer::open(ByteReader::from_bytes(data), MpaParser::new(), &Config::default()).unwrap();
        assert_eq!(demuxer.streams()[0].format.block_align, 384);

        assert_eq!(demuxer.seek_bytes(1200).unwrap(), 2304);
        assert_eq!(demuxer.streams()[0].format.block_align, 0);
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!((packet.byte_position, packet.timestamp), (1152, 2304));
        let next = demuxer.read_packet().unwrap().unwrap();
        assert_eq!((next.byte_position, next.timestamp), (1536, 3456));
    }

    #[test]
    fn test_seek_bytes_constant_bitrate() {
        let data: Vec<u8> = (0..6).flat_map(|_| mp3_frame(false)).collect();
        let mut demuxer =
            EsDemuxer::open(ByteReader::from_bytes(data), MpaParser::new(), &Config::default()).unwrap();
        assert_eq!(demuxer.seek_bytes(1000).unwrap(), 2304);
        assert_eq!(demuxer.streams()[0].format.block_align, 384);
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!((packet.byte_position, packet.timestamp), (768, 2304));
    }

    #[test]
    fn test_probe_scores() {
        assert_eq!(AdtsFactory.probe(&adts_stream(4)), ProbeScore::CERTAIN);
        let mut shifted = vec![0x00, 0x11];
        shifted.extend(adts_stream(4));
        assert_eq!(AdtsFactory.probe(&shifted), ProbeScore::LIKELY);
        assert_eq!(AdtsFactory.probe(&[0u8; 32]), ProbeScore::NONE);
        assert_eq!(MpaFactory.probe(&adts_stream(4)), ProbeScore::NONE);
    }

    #[quickcheck]
    fn prop_seek_is_idempotent(target: u16) -> bool {
        let mut demuxer = open_adts(adts_stream(12));
        let target = target as i64;
        let first = demuxer.seek(target, 44100).unwrap();
        let a = demuxer.read_packet().unwrap().map(|p| p.byte_position);
        let second = demuxer.seek(target, 44100).unwrap();
        let b = demuxer.read_packet().unwrap().map(|p| p.byte_position);
        first == second && a == b && first <= target.max(0)
    }
}
