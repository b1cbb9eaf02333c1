use super::atom::AtomHeader;
use super::boxes::{FileType, ParseBox, FREE, FTYP, MDAT, MOOF, MOOV, SKIP, STYP, WIDE};
use super::fragment::Fragment;
use super::movie::{Movie, TrackKind};
use crate::av::index::{rescale, SeekIndex};
use crate::av::{CodecType, CodingType, Demuxer, Packet, StreamInfo};
use crate::codec::vp9::Vp9Parser;
use crate::codec::ParseStatus;
use crate::config::Config;
use crate::format::{DemuxerFactory, ProbeScore};
use crate::io::ByteReader;
use crate::{Result, VdkError};

struct TrackState {
    next: usize,
    index: SeekIndex,
    vp9: Option<Vp9Parser>,
}

/// QuickTime/MP4 demuxer, plain or fragmented.
///
/// Samples are read in file order across tracks. Fragments are parsed only
/// once every known sample has been delivered, or when a seek target lies
/// beyond the loaded ones.
pub struct Mp4Demuxer {
    reader: ByteReader,
    config: Config,
    movie: Movie,
    streams: Vec<StreamInfo>,
    states: Vec<TrackState>,
    limit: u64,
    next_box: u64,
    fragments_done: bool,
}

impl Mp4Demuxer {
    /// Reads top-level boxes up to and including `moov`.
    pub fn open(mut reader: ByteReader, config: &Config) -> Result<Self> {
        let limit = reader.len().unwrap_or(u64::MAX);
        let mut movie = None;

        while let Some(header) = AtomHeader::read(&mut reader, limit)? {
            match header.kind {
                MOOV => {
                    let body = reader.read_bytes(header.body_len() as usize)?;
                    movie = Some(Movie::parse(body, header.body_start(), config)?);
                    break;
                }
                MOOF => {
                    return Err(VdkError::malformed("mp4", "movie fragment before moov"));
                }
                FTYP => {
                    let body = reader.read_bytes(header.body_len() as usize)?;
                    FileType::from_body(body)?;
                }
                _ => reader.seek_to(header.end())?,
            }
        }

        let movie = movie.ok_or_else(|| VdkError::malformed("mp4", "no moov box"))?;
        let next_box = reader.position();

        let mut streams = Vec::with_capacity(movie.tracks.len());
        let mut states = Vec::with_capacity(movie.tracks.len());
        for (i, track) in movie.tracks.iter().enumerate() {
            let mut index = SeekIndex::with_reserve_chunk(track.timescale, config.index_reserve_chunk);
            track.extend_index(&mut index, 0);
            let info = track.stream_info(i);
            let vp9 = (info.format.codec == CodecType::VP9)
                .then(|| Vp9Parser::new(track.timescale, config.packet_cache_size));
            streams.push(info);
            states.push(TrackState {
                next: 0,
                index,
                vp9,
            });
        }

        Ok(Self {
            reader,
            config: config.clone(),
            fragments_done: !movie.fragmented,
            movie,
            streams,
            states,
            limit,
            next_box,
        })
    }

    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Seek index of stream `stream`.
    pub fn index(&self, stream: usize) -> Option<&SeekIndex> {
        self.states.get(stream).map(|state| &state.index)
    }

    /// Parses the next `moof` and appends its samples. `false` at end of
    /// input.
    fn load_next_fragment(&mut self) -> Result<bool> {
        if self.fragments_done {
            return Ok(false);
        }
        loop {
            self.reader.seek_to(self.next_box)?;
            let header = match AtomHeader::read(&mut self.reader, self.limit)? {
                Some(header) => header,
                None => {
                    self.fragments_done = true;
                    return Ok(false);
                }
            };
            self.next_box = header.end();
            if header.kind != MOOF {
                continue;
            }

            let body = self.reader.read_bytes(header.body_len() as usize)?;
            let fragment = Fragment::parse(&header, body, &self.config)?;
            self.append_fragment(&fragment);

            // Step over the media data now so its samples lie ahead of the
            // cursor on forward-only sources.
            if let Some(next) = AtomHeader::read(&mut self.reader, self.limit)? {
                if next.kind == MDAT {
                    self.next_box = next.end();
                }
            }
            return Ok(true);
        }
    }

    fn append_fragment(&mut self, fragment: &Fragment) {
        let mut previous_end = None;
        for traf in &fragment.tracks {
            let base = traf.data_base(fragment.moof_start, previous_end);
            let found = self.movie.track_by_id(traf.header.track_id);
            let samples = match found {
                Some(i) => {
                    let track = &self.movie.tracks[i];
                    traf.samples(base, track.trex.as_ref(), track.next_decode_time())
                }
                None => traf.samples(base, None, 0),
            };
            previous_end = Some(
                samples
                    .last()
                    .map_or(base, |last| last.offset + last.size as u64),
            );

            let i = match found {
                Some(i) => i,
                None => {
                    log::warn!("fragment for unknown track {}", traf.header.track_id);
                    continue;
                }
            };
            let track = &mut self.movie.tracks[i];
            let from = track.samples.len();
            track.samples.extend(samples);
            track.extend_index(&mut self.states[i].index, from);
        }
    }

    /// Stream whose next sample sits earliest in the file.
    fn next_stream(&self) -> Option<usize> {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, state)| {
                self.movie.tracks[i]
                    .samples
                    .get(state.next)
                    .map(|sample| (sample.offset, i))
            })
            .min()
            .map(|(_, i)| i)
    }

    /// Reads the next sample of stream `i`. VP9 samples go to the frame
    /// parser instead and yield `None`.
    fn read_sample(&mut self, i: usize) -> Result<Option<Packet>> {
        let track = &self.movie.tracks[i];
        let state = &mut self.states[i];
        let sample = track.samples[state.next];
        state.next += 1;

        self.reader.seek_to(sample.offset)?;
        let data = self.reader.read_bytes(sample.size as usize)?;

        if let Some(vp9) = &mut state.vp9 {
            vp9.push_packet(data, sample.offset as i64, sample.dts, sample.duration as i64)?;
            return Ok(None);
        }

        let coding_type = match (track.kind, sample.keyframe) {
            (TrackKind::Video, true) => CodingType::I,
            _ => CodingType::Unknown,
        };
        Ok(Some(
            Packet::new(data)
                .with_position(sample.offset as i64)
                .with_timestamp(sample.dts, track.timescale)
                .with_presentation_offset(sample.cts_offset)
                .with_duration(sample.duration as i64)
                .with_stream_index(i)
                .with_coding_type(coding_type)
                .with_key_flag(sample.keyframe),
        ))
    }

    /// Takes a queued VP9 frame, if any stream has one.
    fn take_pending_frame(&mut self) -> Result<Option<Packet>> {
        for i in 0..self.states.len() {
            let vp9 = match &mut self.states[i].vp9 {
                Some(vp9) => vp9,
                None => continue,
            };
            loop {
                match vp9.parse() {
                    ParseStatus::HaveFormat => {
                        if let Some(format) = vp9.format() {
                            self.streams[i].format.width = format.width;
                            self.streams[i].format.height = format.height;
                        }
                    }
                    ParseStatus::HaveFrame(_) => {
                        return Ok(Some(vp9.take_frame()?.with_stream_index(i)));
                    }
                    ParseStatus::NeedData | ParseStatus::Eof => break,
                }
            }
        }
        Ok(None)
    }

    /// Stream that drives seeking: the first video stream with samples.
    fn reference_stream(&self) -> Option<usize> {
        let with_samples = |i: &usize| !self.movie.tracks[*i].samples.is_empty();
        (0..self.states.len())
            .filter(with_samples)
            .find(|&i| self.movie.tracks[i].kind == TrackKind::Video)
            .or_else(|| (0..self.states.len()).find(with_samples))
    }

    /// Sample number of the index entry resolved for `target`.
    fn resolve_sample(&self, i: usize, target: i64, timescale: u32) -> usize {
        let state = &self.states[i];
        let entry = match state.index.resolve(target, timescale) {
            Some(entry) => state.index.entries()[entry],
            None => return 0,
        };
        self.movie.tracks[i]
            .samples
            .iter()
            .position(|s| s.offset == entry.position && s.dts == entry.time)
            .unwrap_or(0)
    }
}

impl Demuxer for Mp4Demuxer {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            if let Some(packet) = self.take_pending_frame()? {
                return Ok(Some(packet));
            }
            match self.next_stream() {
                Some(i) => {
                    if let Some(packet) = self.read_sample(i)? {
                        return Ok(Some(packet));
                    }
                }
                None => {
                    if !self.load_next_fragment()? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn seek(&mut self, time: i64, timescale: u32) -> Result<i64> {
        for state in &mut self.states {
            if let Some(vp9) = &mut state.vp9 {
                vp9.reset();
            }
        }

        let reference = loop {
            match self.reference_stream() {
                Some(i) if self.states[i].index.covers(time, timescale) => break Some(i),
                found => {
                    if !self.load_next_fragment()? {
                        break found.or_else(|| self.reference_stream());
                    }
                }
            }
        };
        let reference = match reference {
            Some(i) => i,
            None => {
                self.reset()?;
                return Ok(0);
            }
        };

        let sample = self.resolve_sample(reference, time, timescale);
        let ref_timescale = self.movie.tracks[reference].timescale;
        let resolved = self.movie.tracks[reference].samples[sample].dts;
        self.states[reference].next = sample;

        for i in 0..self.states.len() {
            if i == reference {
                continue;
            }
            let next = self.resolve_sample(i, resolved, ref_timescale);
            self.states[i].next = next;
        }

        log::debug!(
            "seek to {}/{}: stream {} sample {} at {}",
            time,
            timescale,
            reference,
            sample,
            resolved
        );
        Ok(rescale(resolved, ref_timescale, timescale))
    }

    fn reset(&mut self) -> Result<()> {
        for state in &mut self.states {
            state.next = 0;
            if let Some(vp9) = &mut state.vp9 {
                vp9.reset();
            }
        }
        Ok(())
    }
}

/// Recognises files by their first top-level box.
pub struct Mp4Factory;

impl DemuxerFactory for Mp4Factory {
    fn name(&self) -> &'static str {
        "mp4"
    }

    fn probe(&self, data: &[u8]) -> ProbeScore {
        if data.len() < 8 {
            return ProbeScore::NONE;
        }
        let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if size != 0 && size != 1 && size < 8 {
            return ProbeScore::NONE;
        }
        match [data[4], data[5], data[6], data[7]] {
            FTYP | MOOV | MOOF | STYP => ProbeScore::CERTAIN,
            MDAT | FREE | SKIP | WIDE => ProbeScore::LIKELY,
            _ => ProbeScore::NONE,
        }
    }

    fn open(&self, reader: ByteReader, config: &Config) -> Result<Box<dyn Demuxer>> {
        Ok(Box::new(Mp4Demuxer::open(reader, config)?))
    }
}
