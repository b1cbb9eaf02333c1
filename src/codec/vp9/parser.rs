use std::collections::VecDeque;

use bytes::Bytes;

use super::types::{split_superframe, Vp9FrameHeader};
use crate::av::{Packet, StreamFormat};
use crate::codec::{FrameInfo, ParseStatus};
use crate::{Result, VdkError};

#[derive(Debug, Clone)]
struct PendingFrame {
    info: FrameInfo,
    data: Bytes,
    header: Vp9FrameHeader,
}

/// Frame splitter and classifier for demuxer-framed VP9.
///
/// Each pushed packet is split at its superframe index; every frame takes a
/// decode slot at the packet timestamp. Frames with `show_frame` cleared are
/// flagged no-output and carry no duration.
pub struct Vp9Parser {
    timescale: u32,
    capacity: usize,
    pending: VecDeque<PendingFrame>,
    format: Option<StreamFormat>,
    format_changed: bool,
    last_header: Option<Vp9FrameHeader>,
}

impl Vp9Parser {
    pub fn new(timescale: u32, capacity: usize) -> Self {
        Self {
            timescale,
            capacity: capacity.max(1),
            pending: VecDeque::with_capacity(capacity),
            format: None,
            format_changed: false,
            last_header: None,
        }
    }

    /// Queues the frames of one packet.
    ///
    /// Fails without queueing anything when a frame header is malformed or
    /// the pending cache cannot hold every frame of the packet.
    pub fn push_packet(
        &mut self,
        data: Bytes,
        position: i64,
        timestamp: i64,
        duration: i64,
    ) -> Result<()> {
        let ranges = split_superframe(&data);
        if self.pending.len() + ranges.len() > self.capacity {
            return Err(VdkError::Codec(format!(
                "VP9 frame cache full ({} pending, {} incoming)",
                self.pending.len(),
                ranges.len()
            )));
        }

        let mut frames = Vec::with_capacity(ranges.len());
        for (offset, len) in ranges {
            let frame = data.slice(offset..offset + len);
            let header = Vp9FrameHeader::parse(&frame)?;
            let shown = header.is_shown();
            let info = FrameInfo {
                skip: 0,
                position: (position + offset as i64) as u64,
                size: len,
                timestamp,
                duration: if shown { duration } else { 0 },
                timescale: self.timescale,
                coding_type: header.coding_type(),
                keyframe: header.keyframe,
                no_output: !shown,
            };
            frames.push(PendingFrame {
                info,
                data: frame,
                header,
            });
        }

        for frame in frames {
            if let Some(format) = frame.header.stream_format() {
                if self.format.as_ref() != Some(&format) {
                    log::debug!("VP9 frame size {}x{}", format.width, format.height);
                    self.format = Some(format);
                    self.format_changed = true;
                }
            }
            log::trace!(
                "VP9 frame at {} size {} key={} shown={}",
                frame.info.position,
                frame.info.size,
                frame.info.keyframe,
                !frame.info.no_output
            );
            self.pending.push_back(frame);
        }
        Ok(())
    }

    pub fn parse(&mut self) -> ParseStatus {
        if self.format_changed {
            self.format_changed = false;
            return ParseStatus::HaveFormat;
        }
        match self.pending.front() {
            Some(frame) => ParseStatus::HaveFrame(frame.info.clone()),
            None => ParseStatus::NeedData,
        }
    }

    pub fn take_frame(&mut self) -> Result<Packet> {
        let frame = self
            .pending
            .pop_front()
            .ok_or_else(|| VdkError::Parser("no VP9 frame pending".into()))?;
        let packet = frame.info.to_packet(frame.data);
        self.last_header = Some(frame.header);
        Ok(packet)
    }

    /// Header of the most recently taken frame.
    pub fn last_header(&self) -> Option<&Vp9FrameHeader> {
        self.last_header.as_ref()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.format_changed = false;
        self.last_header = None;
    }

    pub fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }
}
