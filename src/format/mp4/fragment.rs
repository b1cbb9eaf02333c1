use bytes::Bytes;

use super::atom::{fourcc_str, AtomHeader, Atoms};
use super::boxes::*;
use super::movie::{descend, Sample};
use crate::config::Config;
use crate::Result;

/// One `traf`: a track's share of a movie fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFragment {
    pub header: TrackFragmentHeader,
    pub decode_time: Option<u64>,
    pub runs: Vec<TrackRun>,
}

/// A parsed `moof` box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub sequence_number: u32,
    /// Absolute position of the `moof` header.
    pub moof_start: u64,
    pub tracks: Vec<TrackFragment>,
}

impl Fragment {
    pub fn parse(header: &AtomHeader, body: Bytes, config: &Config) -> Result<Self> {
        let depth = descend(0, config, &header.kind)?;
        let mut fragment = Fragment {
            sequence_number: 0,
            moof_start: header.start,
            tracks: Vec::new(),
        };

        for child in Atoms::new(body, header.body_start()) {
            let (atom, data) = child?;
            match atom.kind {
                MFHD => {
                    fragment.sequence_number = MovieFragmentHeader::from_body(data)?.sequence_number
                }
                TRAF => {
                    descend(depth, config, &atom.kind)?;
                    fragment
                        .tracks
                        .push(TrackFragment::parse(data, atom.body_start())?);
                }
                _ => log::trace!("moof: skipping '{}'", fourcc_str(&atom.kind)),
            }
        }
        log::debug!(
            "moof #{} at {}: {} track fragments",
            fragment.sequence_number,
            fragment.moof_start,
            fragment.tracks.len()
        );
        Ok(fragment)
    }
}

impl TrackFragment {
    fn parse(body: Bytes, base: u64) -> Result<Self> {
        let mut header = None;
        let mut decode_time = None;
        let mut runs = Vec::new();
        for child in Atoms::new(body, base) {
            let (atom, data) = child?;
            match atom.kind {
                TFHD => header = Some(TrackFragmentHeader::from_body(data)?),
                TFDT => {
                    decode_time =
                        Some(TrackFragmentDecodeTime::from_body(data)?.base_media_decode_time)
                }
                TRUN => runs.push(TrackRun::from_body(data)?),
                _ => {}
            }
        }
        let header = header.ok_or_else(|| crate::VdkError::malformed("traf", "missing tfhd"))?;
        Ok(Self {
            header,
            decode_time,
            runs,
        })
    }

    /// Base that run data offsets are relative to.
    ///
    /// An explicit `base_data_offset` wins. With `default-base-is-moof`, or
    /// for the first `traf` of a fragment, it is the `moof` start. Later
    /// `traf`s otherwise continue at `previous_end`, the end of the data of
    /// the `traf` before them.
    pub fn data_base(&self, moof_start: u64, previous_end: Option<u64>) -> u64 {
        match self.header.base_data_offset {
            Some(base) => base,
            None if self.header.default_base_is_moof() => moof_start,
            None => previous_end.unwrap_or(moof_start),
        }
    }

    /// Expands the runs into samples, with data offsets relative to `base`.
    ///
    /// Per-sample fields win over the `tfhd` defaults, which win over the
    /// `trex` defaults. Without a `tfdt` the fragment continues at
    /// `next_decode_time`.
    pub fn samples(
        &self,
        base: u64,
        trex: Option<&TrackExtends>,
        next_decode_time: i64,
    ) -> Vec<Sample> {
        let tfhd = &self.header;
        let trex = trex.copied().unwrap_or_default();
        let default_duration = tfhd.default_duration.unwrap_or(trex.default_duration);
        let default_size = tfhd.default_size.unwrap_or(trex.default_size);
        let default_flags = tfhd.default_flags.unwrap_or(trex.default_flags);

        let mut dts = self
            .decode_time
            .map_or(next_decode_time, |time| time as i64);
        let total = self.runs.iter().map(|run| run.samples.len()).sum();
        let mut out = Vec::with_capacity(total);
        let mut data_end = base;

        if tfhd.duration_is_empty() {
            return out;
        }

        for run in &self.runs {
            let mut offset = match run.data_offset {
                Some(delta) => (base as i64 + delta as i64) as u64,
                None => data_end,
            };
            for (i, entry) in run.samples.iter().enumerate() {
                let flags = match (entry.flags, run.first_sample_flags) {
                    (Some(flags), _) => flags,
                    (None, Some(first)) if i == 0 => first,
                    _ => default_flags,
                };
                let duration = entry.duration.unwrap_or(default_duration);
                let size = entry.size.unwrap_or(default_size);
                out.push(Sample {
                    offset,
                    size,
                    dts,
                    cts_offset: entry.composition_offset.unwrap_or(0),
                    duration,
                    keyframe: flags & SAMPLE_IS_NON_SYNC == 0,
                });
                offset += size as u64;
                dts += duration as i64;
            }
            data_end = offset;
        }
        out
    }
}
