use super::types::*;
use crate::av::{CodingType, Packet, StreamFormat};
use crate::codec::{FrameInfo, ParseStatus, StreamParser};
use crate::utils::ByteBuffer;
use crate::{Result, VdkError};

/// Presentation clock of MPEG system streams.
pub const MPEG_VIDEO_TIMESCALE: u32 = 90_000;

#[derive(Debug, Clone)]
struct Located {
    skip: usize,
    size: usize,
    picture: PictureHeader,
    timestamp: i64,
}

/// Start-code scanner for MPEG-1/2 video elementary streams.
///
/// A frame runs from the first sequence, GOP or picture start code before a
/// picture up to the next such code after it. A sequence end code closes
/// the frame and stays part of it. Pictures seen before the first sequence
/// header are skipped.
pub struct MpegVideoParser {
    buffer: ByteBuffer,
    scan: usize,
    frame_start: Option<usize>,
    picture: Option<PictureHeader>,
    sequence: Option<SequenceHeader>,
    format: Option<StreamFormat>,
    located: Option<Located>,
    timestamp: i64,
    eof: bool,
}

impl Default for MpegVideoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MpegVideoParser {
    pub fn new() -> Self {
        Self {
            buffer: ByteBuffer::new(0),
            scan: 0,
            frame_start: None,
            picture: None,
            sequence: None,
            format: None,
            located: None,
            timestamp: 0,
            eof: false,
        }
    }

    pub fn sequence_header(&self) -> Option<&SequenceHeader> {
        self.sequence.as_ref()
    }

    fn frame_duration(&self) -> i64 {
        self.sequence
            .as_ref()
            .map_or(0, |sequence| sequence.frame_duration(MPEG_VIDEO_TIMESCALE))
    }

    fn frame_info(&self, located: &Located) -> FrameInfo {
        FrameInfo {
            skip: located.skip,
            position: self.buffer.offset() + located.skip as u64,
            size: located.size,
            timestamp: located.timestamp,
            duration: self.frame_duration(),
            timescale: MPEG_VIDEO_TIMESCALE,
            coding_type: located.picture.coding_type,
            keyframe: located.picture.coding_type == CodingType::I,
            no_output: false,
        }
    }

    /// Closes the pending frame at `end` if it holds a picture.
    fn close_frame(&mut self, end: usize) -> Option<FrameInfo> {
        let picture = self.picture.take()?;
        let start = self.frame_start.take()?;
        let located = Located {
            skip: start,
            size: end - start,
            picture,
            timestamp: self.timestamp,
        };
        let info = self.frame_info(&located);
        self.located = Some(located);
        Some(info)
    }

    /// Bytes after the start code at `pos`, or `None` when they are not
    /// buffered yet.
    fn payload(&self, pos: usize, len: usize) -> Option<&[u8]> {
        let data = self.buffer.as_slice();
        data.get(pos + 4..pos + 4 + len)
    }
}

impl StreamParser for MpegVideoParser {
    fn push(&mut self, data: &[u8]) {
        self.buffer.push(data);
    }

    fn set_eof(&mut self) {
        self.eof = true;
    }

    fn parse(&mut self) -> ParseStatus {
        if let Some(located) = &self.located {
            return ParseStatus::HaveFrame(self.frame_info(located));
        }

        loop {
            let len = self.buffer.len();
            if self.scan + 4 > len {
                if !self.eof {
                    return ParseStatus::NeedData;
                }
                if let Some(info) = self.close_frame(len) {
                    return ParseStatus::HaveFrame(info);
                }
                self.scan = len;
                return ParseStatus::Eof;
            }

            let pos = self.scan;
            let code = {
                let data = self.buffer.as_slice();
                if data[pos..pos + 3] != [0x00, 0x00, 0x01] {
                    self.scan += 1;
                    continue;
                }
                data[pos + 3]
            };

            match code {
                SEQUENCE_HEADER_CODE | GROUP_START_CODE | PICTURE_START_CODE => {
                    if let Some(info) = self.close_frame(pos) {
                        return ParseStatus::HaveFrame(info);
                    }
                    if code != SEQUENCE_HEADER_CODE && self.sequence.is_none() {
                        self.scan += 4;
                        continue;
                    }

                    if code == SEQUENCE_HEADER_CODE {
                        let parsed = match self.payload(pos, SEQUENCE_HEADER_LEN) {
                            Some(bytes) => SequenceHeader::parse(bytes),
                            None if self.eof => Err(VdkError::truncated(
                                SEQUENCE_HEADER_LEN as u64,
                                (len - pos - 4) as u64,
                            )),
                            None => return ParseStatus::NeedData,
                        };
                        match parsed {
                            Ok(sequence) => {
                                self.frame_start.get_or_insert(pos);
                                self.scan += 4;
                                if self.sequence.as_ref() != Some(&sequence) {
                                    let format = sequence.stream_format();
                                    log::debug!(
                                        "MPEG video sequence header at offset {}: {:?}",
                                        self.buffer.offset() + pos as u64,
                                        format
                                    );
                                    let changed = self
                                        .format
                                        .as_ref()
                                        .map_or(true, |old| *old != format);
                                    self.sequence = Some(sequence);
                                    self.format = Some(format);
                                    if changed {
                                        return ParseStatus::HaveFormat;
                                    }
                                }
                            }
                            Err(e) => {
                                log::trace!("skipping sequence header: {}", e);
                                self.scan += 4;
                            }
                        }
                        continue;
                    }

                    self.frame_start.get_or_insert(pos);
                    if code == PICTURE_START_CODE {
                        let parsed = match self.payload(pos, PICTURE_HEADER_LEN) {
                            Some(bytes) => PictureHeader::parse(bytes),
                            None if self.eof => Err(VdkError::truncated(
                                PICTURE_HEADER_LEN as u64,
                                (len - pos - 4) as u64,
                            )),
                            None => return ParseStatus::NeedData,
                        };
                        match parsed {
                            Ok(picture) => self.picture = Some(picture),
                            Err(e) => {
                                log::trace!("skipping picture header: {}", e);
                                self.frame_start = None;
                            }
                        }
                    }
                    self.scan += 4;
                }
                SEQUENCE_END_CODE => {
                    self.scan += 4;
                    if let Some(info) = self.close_frame(pos + 4) {
                        return ParseStatus::HaveFrame(info);
                    }
                }
                // slices, extensions and user data stay inside the frame
                _ => self.scan += 4,
            }
        }
    }

    fn flush(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.flush(n);
        self.scan = self.scan.saturating_sub(n);
        if let Some(located) = &mut self.located {
            if n > located.skip {
                self.located = None;
                self.scan = 0;
            } else {
                located.skip -= n;
            }
        }
        if let Some(start) = self.frame_start {
            if n > start {
                self.frame_start = None;
                self.picture = None;
            } else {
                self.frame_start = Some(start - n);
            }
        }
    }

    fn take_frame(&mut self) -> Result<Packet> {
        let located = match &self.located {
            Some(located) if located.skip == 0 => located.clone(),
            Some(located) => {
                return Err(VdkError::Parser(format!(
                    "{} bytes precede the frame; flush them first",
                    located.skip
                )))
            }
            None => return Err(VdkError::Parser("no frame has been located".into())),
        };

        let info = self.frame_info(&located);
        let data = self
            .buffer
            .take(info.size)
            .ok_or_else(|| VdkError::truncated(info.size as u64, self.buffer.len() as u64))?;
        self.located = None;
        self.scan = self.scan.saturating_sub(info.size);
        self.timestamp += info.duration;
        Ok(info.to_packet(data))
    }

    fn reset(&mut self, position: u64, timestamp: i64) {
        self.buffer.reset(position);
        self.scan = 0;
        self.frame_start = None;
        self.picture = None;
        self.located = None;
        self.timestamp = timestamp;
        self.eof = false;
    }

    fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    fn scanned(&self) -> usize {
        match (&self.located, self.frame_start) {
            (Some(located), _) => located.skip,
            (None, Some(start)) => start,
            (None, None) => self.scan,
        }
    }
}
