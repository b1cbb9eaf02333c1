use super::atom::{AtomHeader, Atoms, MAX_FIELDLESS_ENTRIES};
use super::boxes::*;
use super::*;
use crate::av::{CodecType, Demuxer};
use crate::config::Config;
use crate::io::ByteReader;
use crate::VdkError;
use bytes::Bytes;
use pretty_assertions::assert_eq;

fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(&(body.len() as u32 + 8).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

fn full_atom(kind: &[u8; 4], version: u8, flags: u32, body: &[u8]) -> Vec<u8> {
    let mut data = vec![version];
    data.extend_from_slice(&flags.to_be_bytes()[1..]);
    data.extend_from_slice(body);
    atom(kind, &data)
}

fn be32(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn ftyp() -> Vec<u8> {
    atom(b"ftyp", b"isom\0\0\0\0isom")
}

fn mvhd(timescale: u32) -> Vec<u8> {
    let mut body = be32(&[0, 0, timescale, 0]);
    body.extend_from_slice(&[0u8; 76]);
    body.extend_from_slice(&be32(&[3]));
    full_atom(b"mvhd", 0, 0, &body)
}

fn video_entry(kind: &[u8; 4], width: u16, height: u16) -> Vec<u8> {
    let mut body = vec![0u8; 6];
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&[0u8; 16]);
    body.extend_from_slice(&width.to_be_bytes());
    body.extend_from_slice(&height.to_be_bytes());
    body.extend_from_slice(&[0u8; 46]);
    body.extend_from_slice(&[0x00, 0x18, 0xFF, 0xFF]);
    atom(kind, &body)
}

/// `mp4a` entry carrying an AAC-LC 44.1 kHz stereo esds.
fn aac_entry() -> Vec<u8> {
    let mut body = vec![0u8; 6];
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&[0u8; 8]);
    body.extend_from_slice(&2u16.to_be_bytes());
    body.extend_from_slice(&16u16.to_be_bytes());
    body.extend_from_slice(&[0u8; 4]);
    body.extend_from_slice(&(44100u32 << 16).to_be_bytes());
    let mut esds = vec![0x03, 22, 0x00, 0x01, 0x00, 0x04, 17, 0x40, 0x15, 0, 0, 0];
    esds.extend_from_slice(&be32(&[192_000, 128_000]));
    esds.extend_from_slice(&[0x05, 2, 0x12, 0x10]);
    body.extend_from_slice(&full_atom(b"esds", 0, 0, &esds));
    atom(b"mp4a", &body)
}

struct TrackTables {
    id: u32,
    handler: &'static [u8; 4],
    timescale: u32,
    entry: Vec<u8>,
    stts: Vec<(u32, u32)>,
    ctts: Vec<(u32, u32)>,
    stsc: Vec<(u32, u32)>,
    sizes: Vec<u32>,
    chunk_offsets: Vec<u32>,
    sync: Option<Vec<u32>>,
}

impl TrackTables {
    fn empty(id: u32, handler: &'static [u8; 4], timescale: u32, entry: Vec<u8>) -> Self {
        Self {
            id,
            handler,
            timescale,
            entry,
            stts: vec![],
            ctts: vec![],
            stsc: vec![],
            sizes: vec![],
            chunk_offsets: vec![],
            sync: None,
        }
    }
}

fn table(kind: &[u8; 4], rows: &[Vec<u32>]) -> Vec<u8> {
    let mut body = be32(&[rows.len() as u32]);
    for row in rows {
        body.extend_from_slice(&be32(row));
    }
    full_atom(kind, 0, 0, &body)
}

fn trak(tables: &TrackTables) -> Vec<u8> {
    let mut tkhd = be32(&[0, 0, tables.id, 0, 0]);
    tkhd.extend_from_slice(&[0u8; 52]);
    tkhd.extend_from_slice(&be32(&[320 << 16, 240 << 16]));

    let mut mdhd = be32(&[0, 0, tables.timescale, 0]);
    mdhd.extend_from_slice(&[0x15, 0xC7, 0, 0]);

    let mut hdlr = be32(&[0]);
    hdlr.extend_from_slice(tables.handler);
    hdlr.extend_from_slice(&[0u8; 13]);

    let mut stsd = be32(&[1]);
    stsd.extend_from_slice(&tables.entry);

    let pairs = |rows: &[(u32, u32)]| rows.iter().map(|&(a, b)| vec![a, b]).collect::<Vec<_>>();
    let mut stbl = full_atom(b"stsd", 0, 0, &stsd);
    stbl.extend(table(b"stts", &pairs(&tables.stts)));
    if !tables.ctts.is_empty() {
        stbl.extend(table(b"ctts", &pairs(&tables.ctts)));
    }
    let stsc: Vec<_> = tables.stsc.iter().map(|&(first, n)| vec![first, n, 1]).collect();
    stbl.extend(table(b"stsc", &stsc));
    let mut stsz = be32(&[0, tables.sizes.len() as u32]);
    stsz.extend_from_slice(&be32(&tables.sizes));
    stbl.extend(full_atom(b"stsz", 0, 0, &stsz));
    let offsets: Vec<_> = tables.chunk_offsets.iter().map(|&o| vec![o]).collect();
    stbl.extend(table(b"stco", &offsets));
    if let Some(sync) = &tables.sync {
        let rows: Vec<_> = sync.iter().map(|&s| vec![s]).collect();
        stbl.extend(table(b"stss", &rows));
    }

    let minf = atom(b"minf", &atom(b"stbl", &stbl));
    let mut mdia = full_atom(b"mdhd", 0, 0, &mdhd);
    mdia.extend(full_atom(b"hdlr", 0, 0, &hdlr));
    mdia.extend(minf);

    let mut body = full_atom(b"tkhd", 0, 3, &tkhd);
    body.extend(atom(b"mdia", &mdia));
    atom(b"trak", &body)
}

fn moov(tracks: &[TrackTables], mvex: Option<Vec<u8>>) -> Vec<u8> {
    let mut body = mvhd(1000);
    for tables in tracks {
        body.extend(trak(tables));
    }
    if let Some(mvex) = mvex {
        body.extend(atom(b"mvex", &mvex));
    }
    atom(b"moov", &body)
}

/// Video track of five samples in three chunks plus an AAC track with one
/// sample per chunk, interleaved in a single mdat.
fn interleaved_file() -> (Vec<u8>, u64) {
    let tracks = |d: u32| {
        vec![
            TrackTables {
                stts: vec![(4, 3000)],
                ctts: vec![(1, 0), (1, 6000), (3, 0)],
                stsc: vec![(1, 2), (3, 1)],
                sizes: vec![10, 4, 4, 10, 4],
                chunk_offsets: vec![d, d + 20, d + 40],
                sync: Some(vec![1, 4]),
                ..TrackTables::empty(1, b"vide", 90000, video_entry(b"avc1", 320, 240))
            },
            TrackTables {
                stts: vec![(3, 1024)],
                stsc: vec![(1, 1)],
                sizes: vec![6, 6, 6],
                chunk_offsets: vec![d + 14, d + 34, d + 44],
                ..TrackTables::empty(2, b"soun", 44100, aac_entry())
            },
        ]
    };
    let head_len = ftyp().len() + moov(&tracks(0), None).len() + 8;
    let d = head_len as u32;

    let mut payload = Vec::new();
    for (fill, len) in [(1u8, 10), (2, 4), (0xA1, 6), (3, 4), (4, 10), (0xA2, 6), (5, 4), (0xA3, 6)] {
        payload.extend(std::iter::repeat(fill).take(len));
    }
    let mut file = ftyp();
    file.extend(moov(&tracks(d), None));
    file.extend(atom(b"mdat", &payload));
    (file, d as u64)
}

fn fragment(sequence: u32, decode_time: u64, trun_flags: u32, rows: &[u32], data: &[u8]) -> Vec<u8> {
    let build = |data_offset: u32| {
        let mfhd = full_atom(b"mfhd", 0, 0, &be32(&[sequence]));
        let tfhd = full_atom(b"tfhd", 0, 0x020010, &be32(&[1, 5]));
        let tfdt = full_atom(b"tfdt", 1, 0, &decode_time.to_be_bytes());
        let count = if trun_flags & 0x200 != 0 { rows.len() } else { rows[0] as usize };
        let mut trun = be32(&[count as u32, data_offset, 0]);
        if trun_flags & 0x200 != 0 {
            trun.extend(be32(rows));
        }
        let mut traf = tfhd;
        traf.extend(tfdt);
        traf.extend(full_atom(b"trun", 0, trun_flags, &trun));
        let mut body = mfhd;
        body.extend(atom(b"traf", &traf));
        atom(b"moof", &body)
    };
    let moof_len = build(0).len() as u32;
    let mut out = build(moof_len + 8);
    out.extend(atom(b"mdat", data));
    out
}

/// moov with an empty video track and trex defaults, then two fragments:
/// three 5-byte samples at 0, then sizes 3 and 7 at 9000.
fn fragmented_file() -> Vec<u8> {
    let mut trex = be32(&[1, 1, 3000, 0, SAMPLE_IS_NON_SYNC]);
    trex = full_atom(b"trex", 0, 0, &trex);
    let track = TrackTables::empty(1, b"vide", 90000, video_entry(b"avc1", 64, 48));

    let mut file = ftyp();
    file.extend(moov(&[track], Some(trex)));
    file.extend(fragment(1, 0, 0x005, &[3], &[7u8; 15]));
    file.extend(fragment(2, 9000, 0x205, &[3, 7], &[8u8; 10]));
    file
}

fn open(data: Vec<u8>) -> Mp4Demuxer {
    Mp4Demuxer::open(ByteReader::from_bytes(data), &Config::default()).unwrap()
}

fn drain(demuxer: &mut Mp4Demuxer) -> Vec<(usize, i64, u64, bool)> {
    let mut out = Vec::new();
    while let Some(packet) = demuxer.read_packet().unwrap() {
        out.push((
            packet.stream_index,
            packet.timestamp,
            packet.byte_position as u64,
            packet.keyframe,
        ));
    }
    out
}

#[test]
fn test_atom_walk_preserves_order_and_extent() {
    let mut container = atom(b"free", &[1, 2, 3]);
    container.extend(full_atom(b"mfhd", 0, 0, &be32(&[9])));
    container.extend(atom(b"skip", &[]));

    let children: Vec<_> = Atoms::new(Bytes::from(container), 100)
        .map(|child| child.unwrap())
        .collect();
    let summary: Vec<_> = children
        .iter()
        .map(|(h, body)| (h.kind, h.start, h.size, body.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (*b"free", 100, 11, 3),
            (*b"mfhd", 111, 16, 8),
            (*b"skip", 127, 8, 0),
        ]
    );
    assert_eq!(
        MovieFragmentHeader::from_body(children[1].1.clone()).unwrap(),
        MovieFragmentHeader { sequence_number: 9 }
    );
}

#[test]
fn test_child_exceeding_parent() {
    let mut container = atom(b"free", &[0; 4]);
    container.extend_from_slice(&[0, 0, 0, 64, b'm', b'd', b'a', b't', 0, 0]);
    let mut children = Atoms::new(Bytes::from(container), 0);
    assert!(children.next().unwrap().is_ok());
    match children.next() {
        Some(Err(VdkError::TruncatedInput { needed, available })) => {
            assert_eq!((needed, available), (64, 10));
        }
        other => panic!("expected truncation, got {:?}", other),
    }
    assert!(children.next().is_none());
}

#[test]
fn test_size_zero_and_large_size() {
    let header = AtomHeader::decode(b"\0\0\0\0mdat", 40, 1000).unwrap().unwrap();
    assert_eq!((header.size, header.body_start(), header.end()), (960, 48, 1000));

    let mut large = vec![0, 0, 0, 1];
    large.extend_from_slice(b"mdat");
    large.extend_from_slice(&24u64.to_be_bytes());
    let header = AtomHeader::decode(&large, 0, 1000).unwrap().unwrap();
    assert_eq!((header.size, header.header_len, header.body_len()), (24, 16, 8));

    assert!(AtomHeader::decode(b"\0\0\0\x04free", 0, 100).is_err());
    assert_eq!(AtomHeader::decode(b"\0\0\0\x08fre", 0, 3).unwrap(), None);
}

#[test]
fn test_read_header_from_source() {
    let mut reader = ByteReader::from_bytes(atom(b"free", &[0; 8]));
    let header = AtomHeader::read(&mut reader, 16).unwrap().unwrap();
    assert_eq!(reader.position(), header.body_start());
    reader.seek_to(header.end()).unwrap();
    assert_eq!(AtomHeader::read(&mut reader, 16).unwrap(), None);
}

#[test]
fn test_depth_limit() {
    let (file, _) = interleaved_file();
    let config = Config {
        max_box_depth: 3,
        ..Config::default()
    };
    match Mp4Demuxer::open(ByteReader::from_bytes(file), &config) {
        Err(VdkError::MalformedHeader { reason, .. }) => assert!(reason.contains("nesting")),
        other => panic!("expected depth error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_sample_flattening() {
    let (file, d) = interleaved_file();
    let demuxer = open(file);
    let video = &demuxer.movie().tracks[0];

    let layout: Vec<_> = video
        .samples
        .iter()
        .map(|s| (s.offset - d, s.size, s.dts, s.cts_offset, s.duration, s.keyframe))
        .collect();
    assert_eq!(
        layout,
        vec![
            (0, 10, 0, 0, 3000, true),
            (10, 4, 3000, 6000, 3000, false),
            (20, 4, 6000, 0, 3000, false),
            (24, 10, 9000, 0, 3000, true),
            (40, 4, 12000, 0, 3000, false),
        ]
    );

    let audio = &demuxer.movie().tracks[1];
    assert_eq!(audio.samples.len(), 3);
    assert!(audio.samples.iter().all(|s| s.keyframe && s.duration == 1024));
}

#[test]
fn test_stream_info() {
    let (file, _) = interleaved_file();
    let demuxer = open(file);
    let streams = demuxer.streams();
    assert_eq!(streams.len(), 2);

    assert_eq!(streams[0].format.codec, CodecType::H264);
    assert_eq!((streams[0].format.width, streams[0].format.height), (320, 240));
    assert_eq!(streams[0].timescale, 90000);

    assert_eq!(streams[1].track_id, 2);
    assert_eq!(streams[1].format.codec, CodecType::AAC);
    assert_eq!(streams[1].format.sample_rate, 44100);
    assert_eq!(streams[1].format.channels, 2);
    assert_eq!(streams[1].format.samples_per_frame, 1024);
    assert_eq!(streams[1].format.bitrate, 128_000);
    assert_eq!(streams[1].extra_data.as_deref(), Some(&[0x12u8, 0x10][..]));
}

#[test]
fn test_packets_in_file_order() {
    let (file, d) = interleaved_file();
    let mut demuxer = open(file);
    let packets: Vec<_> = drain(&mut demuxer)
        .into_iter()
        .map(|(stream, ts, pos, _)| (stream, ts, pos - d))
        .collect();
    assert_eq!(
        packets,
        vec![
            (0, 0, 0),
            (0, 3000, 10),
            (1, 0, 14),
            (0, 6000, 20),
            (0, 9000, 24),
            (1, 1024, 34),
            (0, 12000, 40),
            (1, 2048, 44),
        ]
    );
}

#[test]
fn test_packet_payload_and_presentation() {
    let (file, _) = interleaved_file();
    let mut demuxer = open(file);
    demuxer.read_packet().unwrap();
    let packet = demuxer.read_packet().unwrap().unwrap();
    assert_eq!(&packet.data[..], &[2, 2, 2, 2]);
    assert_eq!(packet.presentation_time(), 9000);
    assert!(!packet.keyframe);
}

#[test]
fn test_seek_to_keyframe() {
    let (file, _) = interleaved_file();
    let mut demuxer = open(file);
    drain(&mut demuxer);

    assert_eq!(demuxer.seek(10000, 90000).unwrap(), 9000);
    let next = demuxer.read_packet().unwrap().unwrap();
    assert_eq!((next.stream_index, next.timestamp), (0, 9000));
    assert!(next.keyframe);

    // 50 ms lands on the second frame, which is not a keyframe.
    assert_eq!(demuxer.seek(50, 1000).unwrap(), 0);
    assert_eq!(drain(&mut demuxer).len(), 8);

    demuxer.reset().unwrap();
    assert_eq!(demuxer.read_packet().unwrap().unwrap().timestamp, 0);
}

#[test]
fn test_missing_moov() {
    let mut file = ftyp();
    file.extend(atom(b"mdat", &[0; 16]));
    assert!(Mp4Demuxer::open(ByteReader::from_bytes(file), &Config::default()).is_err());
}

#[test]
fn test_run_defaults() {
    let run = TrackRun {
        flags: 0,
        data_offset: Some(100),
        first_sample_flags: Some(0),
        samples: vec![
            RunSample::default(),
            RunSample {
                duration: Some(500),
                ..Default::default()
            },
            RunSample {
                size: Some(9),
                flags: Some(0),
                composition_offset: Some(-20),
                ..Default::default()
            },
        ],
    };
    let traf = TrackFragment {
        header: TrackFragmentHeader {
            track_id: 1,
            default_size: Some(4),
            ..Default::default()
        },
        decode_time: None,
        runs: vec![
            run,
            TrackRun {
                flags: 0,
                data_offset: None,
                first_sample_flags: None,
                samples: vec![RunSample::default()],
            },
        ],
    };
    let trex = TrackExtends {
        track_id: 1,
        default_description_index: 1,
        default_duration: 1000,
        default_size: 99,
        default_flags: SAMPLE_IS_NON_SYNC,
    };

    let samples = traf.samples(1000, Some(&trex), 7000);
    let layout: Vec<_> = samples
        .iter()
        .map(|s| (s.offset, s.size, s.dts, s.duration, s.cts_offset, s.keyframe))
        .collect();
    assert_eq!(
        layout,
        vec![
            (1100, 4, 7000, 1000, 0, true),
            (1104, 4, 8000, 500, 0, false),
            (1108, 9, 8500, 1000, -20, true),
            (1117, 4, 9500, 1000, 0, false),
        ]
    );
}

#[test]
fn test_empty_duration_fragment() {
    let traf = TrackFragment {
        header: TrackFragmentHeader {
            flags: tfhd_flags::DURATION_IS_EMPTY,
            track_id: 1,
            ..Default::default()
        },
        decode_time: Some(0),
        runs: vec![],
    };
    assert!(traf.samples(0, None, 0).is_empty());
}

#[test]
fn test_fragmented_playback() {
    let mut demuxer = open(fragmented_file());
    assert!(demuxer.movie().fragmented);
    assert!(demuxer.movie().tracks[0].samples.is_empty());

    let packets = drain(&mut demuxer);
    let timing: Vec<_> = packets.iter().map(|&(_, ts, _, key)| (ts, key)).collect();
    assert_eq!(
        timing,
        vec![
            (0, true),
            (3000, false),
            (6000, false),
            (9000, true),
            (12000, false),
        ]
    );
    let sizes: Vec<_> = demuxer.movie().tracks[0].samples.iter().map(|s| s.size).collect();
    assert_eq!(sizes, vec![5, 5, 5, 3, 7]);
}

#[test]
fn test_fragmented_seek_loads_fragments() {
    let mut demuxer = open(fragmented_file());
    assert_eq!(demuxer.seek(10000, 90000).unwrap(), 9000);
    assert_eq!(demuxer.index(0).unwrap().len(), 5);

    let packet = demuxer.read_packet().unwrap().unwrap();
    assert_eq!(packet.timestamp, 9000);
    assert_eq!(&packet.data[..], &[8, 8, 8]);
    assert_eq!(drain(&mut demuxer).len(), 1);
}

/// One fragment holding a video `traf` and an audio `traf`. Neither sets a
/// base offset or default-base-is-moof, and the audio run has no data
/// offset, so its data follows the video data.
fn two_track_fragment_file() -> Vec<u8> {
    let mut mvex = full_atom(b"trex", 0, 0, &be32(&[1, 1, 3000, 0, 0]));
    mvex.extend(full_atom(b"trex", 0, 0, &be32(&[2, 1, 1024, 0, 0])));
    let tracks = [
        TrackTables::empty(1, b"vide", 90000, video_entry(b"avc1", 64, 48)),
        TrackTables::empty(2, b"soun", 44100, aac_entry()),
    ];
    let build = |data_offset: u32| {
        let mut video = full_atom(b"tfhd", 0, 0, &be32(&[1]));
        video.extend(full_atom(b"trun", 0, 0x201, &be32(&[2, data_offset, 4, 4])));
        let mut audio = full_atom(b"tfhd", 0, 0, &be32(&[2]));
        audio.extend(full_atom(b"trun", 0, 0x200, &be32(&[1, 6])));
        let mut body = full_atom(b"mfhd", 0, 0, &be32(&[1]));
        body.extend(atom(b"traf", &video));
        body.extend(atom(b"traf", &audio));
        atom(b"moof", &body)
    };
    let moof_len = build(0).len() as u32;

    let mut payload = vec![1u8; 4];
    payload.extend([2u8; 4]);
    payload.extend([3u8; 6]);
    let mut file = ftyp();
    file.extend(moov(&tracks, Some(mvex)));
    file.extend(build(moof_len + 8));
    file.extend(atom(b"mdat", &payload));
    file
}

#[test]
fn test_second_traf_continues_after_first() {
    let mut demuxer = open(two_track_fragment_file());
    let mut packets = Vec::new();
    while let Some(packet) = demuxer.read_packet().unwrap() {
        packets.push(packet);
    }
    assert_eq!(packets.len(), 3);
    let start = packets[0].byte_position;
    let layout: Vec<_> = packets
        .iter()
        .map(|p| (p.stream_index, p.byte_position - start, p.timestamp, p.data.to_vec()))
        .collect();
    assert_eq!(
        layout,
        vec![
            (0, 0, 0, vec![1; 4]),
            (0, 4, 3000, vec![2; 4]),
            (1, 8, 0, vec![3; 6]),
        ]
    );
}

#[test]
fn test_data_base_selection() {
    let mut traf = TrackFragment {
        header: TrackFragmentHeader {
            track_id: 1,
            ..Default::default()
        },
        decode_time: None,
        runs: vec![],
    };
    assert_eq!(traf.data_base(500, None), 500);
    assert_eq!(traf.data_base(500, Some(900)), 900);

    traf.header.flags = tfhd_flags::DEFAULT_BASE_IS_MOOF;
    assert_eq!(traf.data_base(500, Some(900)), 500);

    traf.header.base_data_offset = Some(40);
    assert_eq!(traf.data_base(500, Some(900)), 40);
}

#[test]
fn test_fieldless_run_count_is_bounded() {
    let run_body = |count: u32| {
        let mut body = vec![0u8; 4];
        body.extend(be32(&[count]));
        Bytes::from(body)
    };
    let run = TrackRun::from_body(run_body(3)).unwrap();
    assert_eq!(run.samples, vec![RunSample::default(); 3]);
    assert!(TrackRun::from_body(run_body(MAX_FIELDLESS_ENTRIES)).is_ok());
    assert!(matches!(
        TrackRun::from_body(run_body(50_000_000)),
        Err(VdkError::MalformedHeader { .. })
    ));
}

#[test]
fn test_vp9_track_goes_through_frame_parser() {
    // 8x8 profile 0 keyframe, followed by a hidden inter frame
    let keyframe = [0x82, 0x49, 0x83, 0x42, 0x00, 0x00, 0x70, 0x00, 0x70, 0x00];
    let hidden = [0x84, 0x00];
    let tracks = |d: u32| {
        vec![TrackTables {
            stts: vec![(2, 3000)],
            stsc: vec![(1, 2)],
            sizes: vec![keyframe.len() as u32, hidden.len() as u32],
            chunk_offsets: vec![d],
            ..TrackTables::empty(1, b"vide", 90000, video_entry(b"vp09", 8, 8))
        }]
    };
    let d = (ftyp().len() + moov(&tracks(0), None).len() + 8) as u32;
    let mut payload = keyframe.to_vec();
    payload.extend_from_slice(&hidden);
    let mut file = ftyp();
    file.extend(moov(&tracks(d), None));
    file.extend(atom(b"mdat", &payload));

    let mut demuxer = open(file);
    assert_eq!(demuxer.streams()[0].format.codec, CodecType::VP9);
    let first = demuxer.read_packet().unwrap().unwrap();
    assert!(first.keyframe && !first.no_output);
    let second = demuxer.read_packet().unwrap().unwrap();
    assert!(second.no_output);
    assert_eq!(second.duration, 0);
    assert!(demuxer.read_packet().unwrap().is_none());
}
