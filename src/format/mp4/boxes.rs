//! Typed records for the boxes the demuxer understands.
//!
//! Each record parses from a [`BodyReader`] positioned at the body start.
//! Full boxes read `[version][flags]` first; versions select 32 or 64-bit
//! layouts and flags gate optional fields, which otherwise stay `None`.

use bytes::Bytes;

use super::atom::{fourcc_str, Atoms, BodyReader, FourCC};
use crate::{Result, VdkError};

pub const FTYP: FourCC = *b"ftyp";
pub const STYP: FourCC = *b"styp";
pub const MOOV: FourCC = *b"moov";
pub const MVHD: FourCC = *b"mvhd";
pub const TRAK: FourCC = *b"trak";
pub const TKHD: FourCC = *b"tkhd";
pub const MDIA: FourCC = *b"mdia";
pub const MDHD: FourCC = *b"mdhd";
pub const HDLR: FourCC = *b"hdlr";
pub const MINF: FourCC = *b"minf";
pub const STBL: FourCC = *b"stbl";
pub const STSD: FourCC = *b"stsd";
pub const STTS: FourCC = *b"stts";
pub const CTTS: FourCC = *b"ctts";
pub const STSC: FourCC = *b"stsc";
pub const STSZ: FourCC = *b"stsz";
pub const STCO: FourCC = *b"stco";
pub const CO64: FourCC = *b"co64";
pub const STSS: FourCC = *b"stss";
pub const MVEX: FourCC = *b"mvex";
pub const TREX: FourCC = *b"trex";
pub const MOOF: FourCC = *b"moof";
pub const MFHD: FourCC = *b"mfhd";
pub const TRAF: FourCC = *b"traf";
pub const TFHD: FourCC = *b"tfhd";
pub const TFDT: FourCC = *b"tfdt";
pub const TRUN: FourCC = *b"trun";
pub const MDAT: FourCC = *b"mdat";
pub const FREE: FourCC = *b"free";
pub const SKIP: FourCC = *b"skip";
pub const WIDE: FourCC = *b"wide";
pub const UDTA: FourCC = *b"udta";
pub const META: FourCC = *b"meta";
pub const ESDS: FourCC = *b"esds";

pub const VIDE: FourCC = *b"vide";
pub const SOUN: FourCC = *b"soun";

/// A record decoded from one box body.
pub trait ParseBox: Sized {
    const KIND: FourCC;

    fn parse(body: &mut BodyReader) -> Result<Self>;

    fn from_body(body: Bytes) -> Result<Self> {
        Self::parse(&mut BodyReader::new(body))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub major_brand: FourCC,
    pub minor_version: u32,
    pub compatible_brands: Vec<FourCC>,
}

impl ParseBox for FileType {
    const KIND: FourCC = FTYP;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        let major_brand = body.read_fourcc()?;
        let minor_version = body.read_u32()?;
        let count = body.remaining() / 4;
        let compatible_brands = body.read_table(count as u32, 4, |r| r.read_fourcc())?;
        log::debug!(
            "ftyp: major brand '{}', {} compatible",
            fourcc_str(&major_brand),
            compatible_brands.len()
        );
        Ok(Self {
            major_brand,
            minor_version,
            compatible_brands,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieHeader {
    pub timescale: u32,
    pub duration: u64,
    pub next_track_id: u32,
}

impl ParseBox for MovieHeader {
    const KIND: FourCC = MVHD;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        let (version, _) = body.read_full_header()?;
        body.read_versioned(version)?; // creation_time
        body.read_versioned(version)?; // modification_time
        let timescale = body.read_u32()?;
        let duration = body.read_versioned(version)?;
        // rate, volume, reserved, matrix, pre_defined
        body.skip(4 + 2 + 10 + 36 + 24)?;
        let next_track_id = body.read_u32()?;
        log::debug!("mvhd: timescale={}, duration={}", timescale, duration);
        Ok(Self {
            timescale,
            duration,
            next_track_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackHeader {
    pub flags: u32,
    pub track_id: u32,
    pub duration: u64,
    pub width: u32,
    pub height: u32,
}

impl TrackHeader {
    pub fn enabled(&self) -> bool {
        self.flags & 0x1 != 0
    }
}

impl ParseBox for TrackHeader {
    const KIND: FourCC = TKHD;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        let (version, flags) = body.read_full_header()?;
        body.read_versioned(version)?;
        body.read_versioned(version)?;
        let track_id = body.read_u32()?;
        body.skip(4)?;
        let duration = body.read_versioned(version)?;
        // reserved, layer, alternate_group, volume, reserved, matrix
        body.skip(8 + 2 + 2 + 2 + 2 + 36)?;
        let width = body.read_u32()? >> 16;
        let height = body.read_u32()? >> 16;
        log::debug!(
            "tkhd: track_id={}, duration={}, {}x{}",
            track_id,
            duration,
            width,
            height
        );
        Ok(Self {
            flags,
            track_id,
            duration,
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHeader {
    pub timescale: u32,
    pub duration: u64,
    /// ISO-639-2/T code.
    pub language: String,
}

impl ParseBox for MediaHeader {
    const KIND: FourCC = MDHD;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        let (version, _) = body.read_full_header()?;
        body.read_versioned(version)?;
        body.read_versioned(version)?;
        let timescale = body.read_u32()?;
        let duration = body.read_versioned(version)?;
        let packed = body.read_u16()?;
        let language = [10u16, 5, 0]
            .iter()
            .map(|shift| (((packed >> shift) & 0x1F) as u8 + 0x60) as char)
            .collect();
        if timescale == 0 {
            return Err(VdkError::malformed("mdhd", "zero timescale"));
        }
        log::debug!("mdhd: timescale={}, duration={}", timescale, duration);
        Ok(Self {
            timescale,
            duration,
            language,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub handler_type: FourCC,
    pub name: String,
}

impl ParseBox for Handler {
    const KIND: FourCC = HDLR;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        body.skip(4)?; // pre_defined
        let handler_type = body.read_fourcc()?;
        body.skip(12)?;
        let rest = body.rest();
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let name = String::from_utf8_lossy(&rest[..end]).into_owned();
        Ok(Self { handler_type, name })
    }
}

/// Media-specific part of a sample entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleEntryKind {
    Video { width: u16, height: u16, depth: u16 },
    Audio { channels: u16, sample_size: u16, sample_rate: u32 },
    Other,
}

/// Decoder configuration carried by an `esds` box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsDescriptor {
    pub object_type: u8,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    /// DecoderSpecificInfo, the AudioSpecificConfig for AAC.
    pub decoder_specific_info: Option<Bytes>,
}

/// The first entry of an `stsd` box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    pub format: FourCC,
    pub data_reference_index: u16,
    pub kind: SampleEntryKind,
    /// Codec configuration child box (`avcC`, `vpcC`, `esds`, ...).
    pub config: Option<(FourCC, Bytes)>,
    pub esds: Option<EsDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDescription {
    pub entry_count: u32,
    pub entry: Option<SampleEntry>,
}

/// Children of a sample entry that describe presentation, not the codec.
const NON_CONFIG_CHILDREN: [FourCC; 6] =
    [*b"btrt", *b"pasp", *b"colr", *b"clap", *b"fiel", *b"sinf"];

impl ParseBox for SampleDescription {
    const KIND: FourCC = STSD;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let entry_count = body.read_u32()?;
        let base = body.position() as u64;
        let mut entries = Atoms::new(body.rest(), base);
        let entry = match entries.next() {
            Some(item) => {
                let (header, data) = item?;
                Some(parse_sample_entry(header.kind, data, header.body_start())?)
            }
            None => None,
        };
        if entry_count > 1 {
            log::debug!("stsd: {} entries, using the first", entry_count);
        }
        Ok(Self { entry_count, entry })
    }
}

fn parse_sample_entry(format: FourCC, data: Bytes, base: u64) -> Result<SampleEntry> {
    let mut body = BodyReader::new(data);
    body.skip(6)?;
    let data_reference_index = body.read_u16()?;

    let kind = match &format {
        b"avc1" | b"avc3" | b"hvc1" | b"hev1" | b"vp08" | b"vp09" | b"av01" | b"mp4v"
        | b"mp2v" | b"encv" => {
            body.skip(16)?;
            let width = body.read_u16()?;
            let height = body.read_u16()?;
            // resolution, reserved, frame_count, compressorname
            body.skip(4 + 4 + 4 + 2 + 32)?;
            let depth = body.read_u16()?;
            body.skip(2)?;
            SampleEntryKind::Video {
                width,
                height,
                depth,
            }
        }
        b"mp4a" | b".mp3" | b"Opus" | b"ac-3" | b"ec-3" | b"fLaC" | b"alac" | b"enca" => {
            let version = body.read_u16()?;
            body.skip(6)?; // revision, vendor
            let mut channels = body.read_u16()?;
            let sample_size = body.read_u16()?;
            body.skip(4)?; // compression_id, packet_size
            let mut sample_rate = body.read_u32()? >> 16;
            match version {
                1 => body.skip(16)?,
                2 => {
                    body.skip(4)?; // sizeOfStructOnly
                    sample_rate = f64::from_bits(body.read_u64()?) as u32;
                    channels = body.read_u32()? as u16;
                    body.skip(20)?;
                }
                _ => {}
            }
            SampleEntryKind::Audio {
                channels,
                sample_size,
                sample_rate,
            }
        }
        _ => SampleEntryKind::Other,
    };

    let mut config = None;
    let mut esds = None;
    if kind != SampleEntryKind::Other {
        let child_base = base + body.position() as u64;
        for child in Atoms::new(body.rest(), child_base) {
            let (header, data) = match child {
                Ok(child) => child,
                Err(e) => {
                    log::warn!("ignoring malformed sample entry child: {}", e);
                    break;
                }
            };
            if NON_CONFIG_CHILDREN.contains(&header.kind) {
                continue;
            }
            if header.kind == ESDS {
                esds = Some(parse_esds(data.clone())?);
            }
            if config.is_none() {
                config = Some((header.kind, data));
            }
        }
    }

    log::debug!("stsd entry '{}': {:?}", fourcc_str(&format), kind);
    Ok(SampleEntry {
        format,
        data_reference_index,
        kind,
        config,
        esds,
    })
}

/// Reads an MPEG-4 descriptor header: tag and expandable length.
fn read_descriptor(body: &mut BodyReader) -> Result<(u8, usize)> {
    let tag = body.read_u8()?;
    let mut len = 0usize;
    for _ in 0..4 {
        let b = body.read_u8()?;
        len = (len << 7) | (b & 0x7F) as usize;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok((tag, len))
}

const ES_DESCRIPTOR_TAG: u8 = 0x03;
const DECODER_CONFIG_TAG: u8 = 0x04;
const DECODER_SPECIFIC_TAG: u8 = 0x05;

pub fn parse_esds(data: Bytes) -> Result<EsDescriptor> {
    let mut body = BodyReader::new(data);
    body.read_full_header()?;

    let (tag, _) = read_descriptor(&mut body)?;
    if tag != ES_DESCRIPTOR_TAG {
        return Err(VdkError::malformed("esds", format!("unexpected tag {:#x}", tag)));
    }
    body.skip(2)?; // ES_ID
    let flags = body.read_u8()?;
    if flags & 0x80 != 0 {
        body.skip(2)?;
    }
    if flags & 0x40 != 0 {
        let url_len = body.read_u8()? as usize;
        body.skip(url_len)?;
    }
    if flags & 0x20 != 0 {
        body.skip(2)?;
    }

    let (tag, _) = read_descriptor(&mut body)?;
    if tag != DECODER_CONFIG_TAG {
        return Err(VdkError::malformed("esds", format!("unexpected tag {:#x}", tag)));
    }
    let object_type = body.read_u8()?;
    body.skip(1 + 3)?; // stream type, buffer size
    let max_bitrate = body.read_u32()?;
    let avg_bitrate = body.read_u32()?;

    let decoder_specific_info = if body.remaining() > 0 {
        let (tag, len) = read_descriptor(&mut body)?;
        if tag == DECODER_SPECIFIC_TAG {
            Some(body.read_bytes(len)?)
        } else {
            None
        }
    } else {
        None
    };

    Ok(EsDescriptor {
        object_type,
        max_bitrate,
        avg_bitrate,
        decoder_specific_info,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToSample {
    pub count: u32,
    pub delta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeToSampleBox(pub Vec<TimeToSample>);

impl ParseBox for TimeToSampleBox {
    const KIND: FourCC = STTS;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let count = body.read_u32()?;
        let entries = body.read_table(count, 8, |r| {
            Ok(TimeToSample {
                count: r.read_u32()?,
                delta: r.read_u32()?,
            })
        })?;
        Ok(Self(entries))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionOffset {
    pub count: u32,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionOffsetBox(pub Vec<CompositionOffset>);

impl ParseBox for CompositionOffsetBox {
    const KIND: FourCC = CTTS;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        let (version, _) = body.read_full_header()?;
        let count = body.read_u32()?;
        let entries = body.read_table(count, 8, |r| {
            let count = r.read_u32()?;
            // version 0 is formally unsigned, but writers store negatives
            // there too
            let offset = if version == 0 {
                let raw = r.read_u32()?;
                if raw > i32::MAX as u32 {
                    raw as i32 as i64
                } else {
                    raw as i64
                }
            } else {
                r.read_i32()? as i64
            };
            Ok(CompositionOffset { count, offset })
        })?;
        Ok(Self(entries))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleToChunk {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub description_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleToChunkBox(pub Vec<SampleToChunk>);

impl ParseBox for SampleToChunkBox {
    const KIND: FourCC = STSC;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let count = body.read_u32()?;
        let entries = body.read_table(count, 12, |r| {
            Ok(SampleToChunk {
                first_chunk: r.read_u32()?,
                samples_per_chunk: r.read_u32()?,
                description_index: r.read_u32()?,
            })
        })?;
        Ok(Self(entries))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSizeBox {
    /// Size shared by every sample, 0 when sizes are listed.
    pub uniform: u32,
    pub count: u32,
    pub sizes: Vec<u32>,
}

impl SampleSizeBox {
    pub fn size(&self, sample: usize) -> Option<u32> {
        if self.uniform != 0 {
            (sample < self.count as usize).then_some(self.uniform)
        } else {
            self.sizes.get(sample).copied()
        }
    }
}

impl ParseBox for SampleSizeBox {
    const KIND: FourCC = STSZ;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let uniform = body.read_u32()?;
        let count = body.read_u32()?;
        let sizes = if uniform == 0 {
            body.read_table(count, 4, |r| r.read_u32())?
        } else {
            Vec::new()
        };
        Ok(Self {
            uniform,
            count,
            sizes,
        })
    }
}

/// `stco` or `co64`, widened to 64 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOffsetBox(pub Vec<u64>);

impl ParseBox for ChunkOffsetBox {
    const KIND: FourCC = STCO;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let count = body.read_u32()?;
        let offsets = body.read_table(count, 4, |r| Ok(r.read_u32()? as u64))?;
        Ok(Self(offsets))
    }
}

impl ChunkOffsetBox {
    pub fn parse_co64(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let count = body.read_u32()?;
        let offsets = body.read_table(count, 8, |r| r.read_u64())?;
        Ok(Self(offsets))
    }
}

/// One-based sample numbers of sync samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSampleBox(pub Vec<u32>);

impl ParseBox for SyncSampleBox {
    const KIND: FourCC = STSS;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        let count = body.read_u32()?;
        Ok(Self(body.read_table(count, 4, |r| r.read_u32())?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackExtends {
    pub track_id: u32,
    pub default_description_index: u32,
    pub default_duration: u32,
    pub default_size: u32,
    pub default_flags: u32,
}

impl ParseBox for TrackExtends {
    const KIND: FourCC = TREX;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        Ok(Self {
            track_id: body.read_u32()?,
            default_description_index: body.read_u32()?,
            default_duration: body.read_u32()?,
            default_size: body.read_u32()?,
            default_flags: body.read_u32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieFragmentHeader {
    pub sequence_number: u32,
}

impl ParseBox for MovieFragmentHeader {
    const KIND: FourCC = MFHD;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        body.read_full_header()?;
        Ok(Self {
            sequence_number: body.read_u32()?,
        })
    }
}

pub mod tfhd_flags {
    pub const BASE_DATA_OFFSET: u32 = 0x000001;
    pub const SAMPLE_DESCRIPTION_INDEX: u32 = 0x000002;
    pub const DEFAULT_DURATION: u32 = 0x000008;
    pub const DEFAULT_SIZE: u32 = 0x000010;
    pub const DEFAULT_FLAGS: u32 = 0x000020;
    pub const DURATION_IS_EMPTY: u32 = 0x010000;
    pub const DEFAULT_BASE_IS_MOOF: u32 = 0x020000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFragmentHeader {
    pub flags: u32,
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub description_index: Option<u32>,
    pub default_duration: Option<u32>,
    pub default_size: Option<u32>,
    pub default_flags: Option<u32>,
}

impl TrackFragmentHeader {
    pub fn duration_is_empty(&self) -> bool {
        self.flags & tfhd_flags::DURATION_IS_EMPTY != 0
    }

    pub fn default_base_is_moof(&self) -> bool {
        self.flags & tfhd_flags::DEFAULT_BASE_IS_MOOF != 0
    }
}

impl ParseBox for TrackFragmentHeader {
    const KIND: FourCC = TFHD;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        use tfhd_flags::*;

        let (_, flags) = body.read_full_header()?;
        let track_id = body.read_u32()?;
        let optional = |flag: u32| flags & flag != 0;
        let base_data_offset = if optional(BASE_DATA_OFFSET) {
            Some(body.read_u64()?)
        } else {
            None
        };
        let description_index = if optional(SAMPLE_DESCRIPTION_INDEX) {
            Some(body.read_u32()?)
        } else {
            None
        };
        let default_duration = if optional(DEFAULT_DURATION) {
            Some(body.read_u32()?)
        } else {
            None
        };
        let default_size = if optional(DEFAULT_SIZE) {
            Some(body.read_u32()?)
        } else {
            None
        };
        let default_flags = if optional(DEFAULT_FLAGS) {
            Some(body.read_u32()?)
        } else {
            None
        };
        Ok(Self {
            flags,
            track_id,
            base_data_offset,
            description_index,
            default_duration,
            default_size,
            default_flags,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFragmentDecodeTime {
    pub base_media_decode_time: u64,
}

impl ParseBox for TrackFragmentDecodeTime {
    const KIND: FourCC = TFDT;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        let (version, _) = body.read_full_header()?;
        Ok(Self {
            base_media_decode_time: body.read_versioned(version)?,
        })
    }
}

pub mod trun_flags {
    pub const DATA_OFFSET: u32 = 0x000001;
    pub const FIRST_SAMPLE_FLAGS: u32 = 0x000004;
    pub const SAMPLE_DURATION: u32 = 0x000100;
    pub const SAMPLE_SIZE: u32 = 0x000200;
    pub const SAMPLE_FLAGS: u32 = 0x000400;
    pub const SAMPLE_COMPOSITION_OFFSET: u32 = 0x000800;
}

/// `sample_is_non_sync_sample` in the sample flags word.
pub const SAMPLE_IS_NON_SYNC: u32 = 0x0001_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSample {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: Option<u32>,
    pub composition_offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRun {
    pub flags: u32,
    pub data_offset: Option<i32>,
    pub first_sample_flags: Option<u32>,
    pub samples: Vec<RunSample>,
}

impl ParseBox for TrackRun {
    const KIND: FourCC = TRUN;

    fn parse(body: &mut BodyReader) -> Result<Self> {
        use trun_flags::*;

        let (version, flags) = body.read_full_header()?;
        let count = body.read_u32()?;
        let data_offset = if flags & DATA_OFFSET != 0 {
            Some(body.read_i32()?)
        } else {
            None
        };
        let first_sample_flags = if flags & FIRST_SAMPLE_FLAGS != 0 {
            Some(body.read_u32()?)
        } else {
            None
        };

        let fields = [
            SAMPLE_DURATION,
            SAMPLE_SIZE,
            SAMPLE_FLAGS,
            SAMPLE_COMPOSITION_OFFSET,
        ];
        let entry_len = fields.iter().filter(|&&f| flags & f != 0).count() * 4;
        let samples = body.read_table(count, entry_len, |r| {
            let duration = if flags & SAMPLE_DURATION != 0 {
                Some(r.read_u32()?)
            } else {
                None
            };
            let size = if flags & SAMPLE_SIZE != 0 {
                Some(r.read_u32()?)
            } else {
                None
            };
            let sample_flags = if flags & SAMPLE_FLAGS != 0 {
                Some(r.read_u32()?)
            } else {
                None
            };
            let composition_offset = if flags & SAMPLE_COMPOSITION_OFFSET != 0 {
                Some(if version == 0 {
                    r.read_u32()? as i64
                } else {
                    r.read_i32()? as i64
                })
            } else {
                None
            };
            Ok(RunSample {
                duration,
                size,
                flags: sample_flags,
                composition_offset,
            })
        })?;

        Ok(Self {
            flags,
            data_offset,
            first_sample_flags,
            samples,
        })
    }
}
