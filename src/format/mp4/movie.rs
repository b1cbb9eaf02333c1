use bytes::Bytes;

use super::atom::{fourcc_str, Atoms, BodyReader, FourCC};
use super::boxes::*;
use crate::av::index::{IndexEntry, SeekIndex};
use crate::av::{CodecType, StreamFormat, StreamInfo};
use crate::codec::aac::AACConfig;
use crate::config::Config;
use crate::{Result, VdkError};

/// One sample in decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub offset: u64,
    pub size: u32,
    pub dts: i64,
    /// Presentation time minus decode time.
    pub cts_offset: i64,
    pub duration: u32,
    pub keyframe: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    Other,
}

/// Raw sample table boxes of one track.
#[derive(Debug, Clone, Default)]
pub struct SampleTables {
    pub stts: Vec<TimeToSample>,
    pub ctts: Vec<CompositionOffset>,
    pub stsc: Vec<SampleToChunk>,
    pub stsz: Option<SampleSizeBox>,
    pub chunk_offsets: Vec<u64>,
    /// `None` when every sample is a sync sample.
    pub sync: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: u32,
    pub kind: TrackKind,
    pub handler: FourCC,
    pub timescale: u32,
    pub duration: u64,
    pub width: u32,
    pub height: u32,
    pub language: String,
    pub entry: Option<SampleEntry>,
    pub tables: SampleTables,
    /// Fragment defaults from `mvex/trex`.
    pub trex: Option<TrackExtends>,
    pub samples: Vec<Sample>,
}

/// Checks the nesting limit before descending into `kind`.
pub(crate) fn descend(depth: usize, config: &Config, kind: &FourCC) -> Result<usize> {
    let depth = depth + 1;
    if depth > config.max_box_depth {
        return Err(VdkError::malformed(
            format!("box '{}'", fourcc_str(kind)),
            format!("nesting deeper than {}", config.max_box_depth),
        ));
    }
    Ok(depth)
}

impl Track {
    fn new() -> Self {
        Self {
            id: 0,
            kind: TrackKind::Other,
            handler: *b"    ",
            timescale: 0,
            duration: 0,
            width: 0,
            height: 0,
            language: String::new(),
            entry: None,
            tables: SampleTables::default(),
            trex: None,
            samples: Vec::new(),
        }
    }

    /// Parses a `trak` body.
    pub fn parse(body: Bytes, base: u64, depth: usize, config: &Config) -> Result<Self> {
        let mut track = Track::new();
        for child in Atoms::new(body, base) {
            let (header, data) = child?;
            match header.kind {
                TKHD => {
                    let tkhd = TrackHeader::from_body(data)?;
                    track.id = tkhd.track_id;
                    track.duration = tkhd.duration;
                    track.width = tkhd.width;
                    track.height = tkhd.height;
                }
                MDIA => {
                    let depth = descend(depth, config, &header.kind)?;
                    track.parse_media(data, header.body_start(), depth, config)?;
                }
                _ => log::trace!("trak: skipping '{}'", fourcc_str(&header.kind)),
            }
        }
        if track.timescale == 0 {
            return Err(VdkError::malformed(
                format!("track {}", track.id),
                "missing media header",
            ));
        }
        Ok(track)
    }

    fn parse_media(&mut self, body: Bytes, base: u64, depth: usize, config: &Config) -> Result<()> {
        for child in Atoms::new(body, base) {
            let (header, data) = child?;
            match header.kind {
                MDHD => {
                    let mdhd = MediaHeader::from_body(data)?;
                    self.timescale = mdhd.timescale;
                    self.duration = mdhd.duration;
                    self.language = mdhd.language;
                }
                HDLR => {
                    let hdlr = Handler::from_body(data)?;
                    self.handler = hdlr.handler_type;
                    self.kind = match hdlr.handler_type {
                        VIDE => TrackKind::Video,
                        SOUN => TrackKind::Audio,
                        _ => TrackKind::Other,
                    };
                }
                MINF => {
                    let depth = descend(depth, config, &header.kind)?;
                    for child in Atoms::new(data, header.body_start()) {
                        let (header, data) = child?;
                        if header.kind == STBL {
                            descend(depth, config, &header.kind)?;
                            self.parse_sample_tables(data, header.body_start())?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_sample_tables(&mut self, body: Bytes, base: u64) -> Result<()> {
        for child in Atoms::new(body, base) {
            let (header, data) = child?;
            match header.kind {
                STSD => self.entry = SampleDescription::from_body(data)?.entry,
                STTS => self.tables.stts = TimeToSampleBox::from_body(data)?.0,
                CTTS => self.tables.ctts = CompositionOffsetBox::from_body(data)?.0,
                STSC => self.tables.stsc = SampleToChunkBox::from_body(data)?.0,
                STSZ => self.tables.stsz = Some(SampleSizeBox::from_body(data)?),
                STCO => self.tables.chunk_offsets = ChunkOffsetBox::from_body(data)?.0,
                CO64 => {
                    self.tables.chunk_offsets =
                        ChunkOffsetBox::parse_co64(&mut BodyReader::new(data))?.0
                }
                STSS => self.tables.sync = Some(SyncSampleBox::from_body(data)?.0),
                _ => log::trace!("stbl: skipping '{}'", fourcc_str(&header.kind)),
            }
        }
        Ok(())
    }

    /// Flattens the sample tables into [`Track::samples`].
    pub fn build_samples(&mut self, reserve_chunk: usize) -> Result<()> {
        let samples = flatten_tables(&self.tables, reserve_chunk)?;
        let declared = self.tables.stsz.as_ref().map_or(0, |stsz| stsz.count as usize);
        if samples.len() != declared {
            return Err(VdkError::malformed(
                format!("track {}", self.id),
                format!(
                    "chunks hold {} samples, stsz declares {}",
                    samples.len(),
                    declared
                ),
            ));
        }
        log::debug!(
            "track {}: {} samples, timescale {}",
            self.id,
            samples.len(),
            self.timescale
        );
        self.samples = samples;
        Ok(())
    }

    /// Decode time following the last known sample.
    pub fn next_decode_time(&self) -> i64 {
        self.samples
            .last()
            .map_or(0, |s| s.dts + s.duration as i64)
    }

    /// Index of `samples[from..]`, appended to `index`.
    pub fn extend_index(&self, index: &mut SeekIndex, from: usize) {
        for sample in &self.samples[from.min(self.samples.len())..] {
            if let Err(e) = index.push(IndexEntry::new(sample.dts, sample.offset, sample.keyframe)) {
                log::warn!("track {}: sample not indexed: {}", self.id, e);
            }
        }
    }

    pub fn codec(&self) -> CodecType {
        let entry = match &self.entry {
            Some(entry) => entry,
            None => return CodecType::Unknown(*b"    "),
        };
        let object_type = entry.esds.as_ref().map(|esds| esds.object_type);
        match (&entry.format, object_type) {
            (b"mp4a", Some(0x69 | 0x6B)) => CodecType::MP3,
            (b"mp4v", Some(0x60..=0x65 | 0x6A)) => CodecType::MPEGVideo,
            (b"mp4v", _) => CodecType::Unknown(entry.format),
            _ => CodecType::from_fourcc(entry.format),
        }
    }

    /// Codec configuration handed to decoders.
    pub fn extra_data(&self) -> Option<Bytes> {
        let entry = self.entry.as_ref()?;
        match &entry.esds {
            Some(esds) => esds.decoder_specific_info.clone(),
            None => entry.config.as_ref().map(|(_, data)| data.clone()),
        }
    }

    pub fn stream_format(&self) -> StreamFormat {
        let mut format = StreamFormat::new(self.codec());
        match self.entry.as_ref().map(|entry| &entry.kind) {
            Some(SampleEntryKind::Video { width, height, .. }) => {
                format.width = *width as u32;
                format.height = *height as u32;
            }
            Some(SampleEntryKind::Audio {
                channels,
                sample_rate,
                ..
            }) => {
                format.channels = *channels;
                format.sample_rate = if *sample_rate > 0 {
                    *sample_rate
                } else {
                    self.timescale
                };
            }
            _ => {}
        }
        if format.width == 0 {
            format.width = self.width;
            format.height = self.height;
        }
        if let Some(esds) = self.entry.as_ref().and_then(|entry| entry.esds.as_ref()) {
            format.bitrate = esds.avg_bitrate;
        }

        match format.codec {
            CodecType::AAC => {
                let asc = self.extra_data();
                match asc.as_deref().map(AACConfig::from_audio_specific_config) {
                    Some(Ok(config)) => {
                        format.sample_rate = config.sample_rate().unwrap_or(format.sample_rate);
                        if config.channel_configuration > 0 {
                            format.channels = crate::codec::aac::channels_for_configuration(
                                config.channel_configuration,
                            );
                        }
                        format.samples_per_frame = config.frame_length as u32;
                    }
                    Some(Err(e)) => log::warn!("track {}: bad AudioSpecificConfig: {}", self.id, e),
                    None => format.samples_per_frame = 1024,
                }
            }
            CodecType::MP3 => format.samples_per_frame = 1152,
            _ => {}
        }
        format
    }

    pub fn stream_info(&self, index: usize) -> StreamInfo {
        StreamInfo {
            index,
            track_id: self.id,
            timescale: self.timescale,
            duration: (self.duration > 0).then_some(self.duration as i64),
            format: self.stream_format(),
            extra_data: self.extra_data(),
        }
    }
}

/// Walks chunks in order, assigning sizes from `stsz`, durations from
/// `stts` (the last delta repeats when it runs short) and composition
/// offsets from `ctts`.
fn flatten_tables(tables: &SampleTables, reserve_chunk: usize) -> Result<Vec<Sample>> {
    let stsz = match &tables.stsz {
        Some(stsz) => stsz,
        None => return Ok(Vec::new()),
    };
    let count = stsz.count as usize;
    let reserve_chunk = reserve_chunk.max(1);

    let mut samples: Vec<Sample> = Vec::with_capacity(count.min(reserve_chunk * 64));
    let mut stts = tables
        .stts
        .iter()
        .flat_map(|e| (0..e.count).map(move |_| e.delta));
    let mut ctts = tables
        .ctts
        .iter()
        .flat_map(|e| (0..e.count).map(move |_| e.offset));
    let mut dts: i64 = 0;
    let mut last_delta = 0u32;

    'chunks: for (chunk_idx, &chunk_offset) in tables.chunk_offsets.iter().enumerate() {
        let per_chunk = samples_per_chunk(&tables.stsc, chunk_idx as u32 + 1);
        let mut offset = chunk_offset;
        for _ in 0..per_chunk {
            let index = samples.len();
            if index >= count {
                break 'chunks;
            }
            let size = stsz.size(index).ok_or_else(|| {
                VdkError::malformed("stsz", format!("no size for sample {}", index))
            })?;
            let duration = stts.next().unwrap_or(last_delta);
            last_delta = duration;
            let keyframe = match &tables.sync {
                Some(sync) => sync.binary_search(&(index as u32 + 1)).is_ok(),
                None => true,
            };
            if samples.len() == samples.capacity() {
                samples.reserve(reserve_chunk);
            }
            samples.push(Sample {
                offset,
                size,
                dts,
                cts_offset: ctts.next().unwrap_or(0),
                duration,
                keyframe,
            });
            offset += size as u64;
            dts += duration as i64;
        }
    }
    Ok(samples)
}

/// Samples in 1-based `chunk`: the last `stsc` run starting at or before it.
fn samples_per_chunk(stsc: &[SampleToChunk], chunk: u32) -> u32 {
    let upper = stsc.partition_point(|e| e.first_chunk <= chunk);
    if upper == 0 {
        0
    } else {
        stsc[upper - 1].samples_per_chunk
    }
}

/// The parsed `moov` tree.
#[derive(Debug, Clone)]
pub struct Movie {
    pub header: MovieHeader,
    pub tracks: Vec<Track>,
    /// `mvex` present: samples continue in movie fragments.
    pub fragmented: bool,
}

impl Movie {
    /// Parses a `moov` body starting at absolute `base`.
    pub fn parse(body: Bytes, base: u64, config: &Config) -> Result<Self> {
        let depth = descend(0, config, &MOOV)?;
        let mut header = None;
        let mut tracks: Vec<Track> = Vec::new();
        let mut extends = Vec::new();
        let mut fragmented = false;

        for child in Atoms::new(body, base) {
            let (atom, data) = child?;
            match atom.kind {
                MVHD => header = Some(MovieHeader::from_body(data)?),
                TRAK => {
                    let depth = descend(depth, config, &atom.kind)?;
                    let mut track = Track::parse(data, atom.body_start(), depth, config)?;
                    track.build_samples(config.index_reserve_chunk)?;
                    if tracks.len() == tracks.capacity() {
                        tracks.reserve(4);
                    }
                    tracks.push(track);
                }
                MVEX => {
                    fragmented = true;
                    descend(depth, config, &atom.kind)?;
                    for child in Atoms::new(data, atom.body_start()) {
                        let (atom, data) = child?;
                        if atom.kind == TREX {
                            extends.push(TrackExtends::from_body(data)?);
                        }
                    }
                }
                UDTA | META => log::trace!("moov: skipping metadata '{}'", fourcc_str(&atom.kind)),
                _ => log::trace!("moov: skipping '{}'", fourcc_str(&atom.kind)),
            }
        }

        let header = header.ok_or_else(|| VdkError::malformed("moov", "missing mvhd"))?;
        for trex in extends {
            if let Some(track) = tracks.iter_mut().find(|t| t.id == trex.track_id) {
                track.trex = Some(trex);
            }
        }
        log::debug!(
            "moov: {} tracks{}",
            tracks.len(),
            if fragmented { ", fragmented" } else { "" }
        );
        Ok(Self {
            header,
            tracks,
            fragmented,
        })
    }

    pub fn track_by_id(&self, id: u32) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }
}
