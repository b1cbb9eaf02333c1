//! Sample/time index used to resolve seeks.
//!
//! An index is an ascending table of `(time, byte position, keyframe)`
//! entries for one stream, built either from a container's sample tables or
//! incrementally while an elementary stream is scanned.

use crate::error::{Result, VdkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Decode time in the index timescale.
    pub time: i64,
    /// Absolute byte position of the sample.
    pub position: u64,
    pub keyframe: bool,
}

impl IndexEntry {
    pub fn new(time: i64, position: u64, keyframe: bool) -> Self {
        Self {
            time,
            position,
            keyframe,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeekIndex {
    timescale: u32,
    entries: Vec<IndexEntry>,
    reserve_chunk: usize,
}

/// Converts `value` between timescales, rounding toward negative infinity.
pub fn rescale(value: i64, from: u32, to: u32) -> i64 {
    if from == to || from == 0 {
        return value;
    }
    let scaled = (value as i128 * to as i128).div_euclid(from as i128);
    scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl SeekIndex {
    pub fn new(timescale: u32) -> Self {
        Self::with_reserve_chunk(timescale, 256)
    }

    /// Creates an index that grows its storage `chunk` entries at a time.
    pub fn with_reserve_chunk(timescale: u32, chunk: usize) -> Self {
        Self {
            timescale,
            entries: Vec::new(),
            reserve_chunk: chunk.max(1),
        }
    }

    pub fn timescale(&self) -> u32 {
        self.timescale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&IndexEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&IndexEntry> {
        self.entries.last()
    }

    /// Appends an entry. Time must not go backwards.
    pub fn push(&mut self, entry: IndexEntry) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if entry.time < last.time {
                return Err(VdkError::InvalidData(format!(
                    "index time {} precedes previous entry {}",
                    entry.time, last.time
                )));
            }
            if entry.position < last.position {
                log::trace!(
                    "index position {} precedes previous entry {}",
                    entry.position,
                    last.position
                );
            }
        }
        if self.entries.len() == self.entries.capacity() {
            self.entries.reserve(self.reserve_chunk);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// True when the index already reaches `target` (given in `target_timescale`).
    pub fn covers(&self, target: i64, target_timescale: u32) -> bool {
        let target = rescale(target, target_timescale, self.timescale);
        self.entries.last().is_some_and(|last| last.time >= target)
    }

    /// Resolves a presentation target to the entry playback must restart from.
    ///
    /// Picks the last entry with `time <= target`, moves back to the nearest
    /// keyframe, then back over entries stored at the same byte position as
    /// their predecessor. `None` when no keyframe precedes the target.
    pub fn resolve(&self, target: i64, target_timescale: u32) -> Option<usize> {
        let target = rescale(target, target_timescale, self.timescale);
        let upper = self.entries.partition_point(|e| e.time <= target);
        if upper == 0 {
            return None;
        }

        let mut idx = upper - 1;
        while !self.entries[idx].keyframe {
            if idx == 0 {
                return None;
            }
            idx -= 1;
        }
        while idx > 0 && self.entries[idx - 1].position == self.entries[idx].position {
            idx -= 1;
        }
        Some(idx)
    }

    /// Resolves a byte position to the last keyframe stored at or before it.
    pub fn resolve_position(&self, position: u64) -> Option<usize> {
        let upper = self.entries.partition_point(|e| e.position <= position);
        self.entries[..upper].iter().rposition(|e| e.keyframe)
    }
}

/// Aligns a byte target to a fixed block grid starting at `data_start`.
///
/// Returns the frame-aligned offset and the exact sample count of the
/// frames before it, or `None` when blocks have no fixed size.
pub fn frame_aligned_seek(
    byte_target: u64,
    data_start: u64,
    block_align: u32,
    samples_per_block: u32,
) -> Option<(u64, i64)> {
    if block_align == 0 {
        return None;
    }
    let blocks = byte_target.saturating_sub(data_start) / block_align as u64;
    Some((
        data_start + blocks * block_align as u64,
        blocks as i64 * samples_per_block as i64,
    ))
}
