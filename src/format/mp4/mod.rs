//! # MP4 / QuickTime demuxer
//!
//! The `moov` tree is read once at open time and every track's sample
//! tables are flattened into a sample list plus a [`SeekIndex`]. Movie
//! fragments (`moof`) are parsed lazily as playback or a seek reaches them,
//! and their samples are appended to the same lists.
//!
//! ```rust
//! use vdkdemux::format::mp4::atom::{AtomHeader, Atoms};
//!
//! # fn main() -> vdkdemux::Result<()> {
//! let data = bytes::Bytes::from_static(&[0, 0, 0, 8, b'f', b'r', b'e', b'e']);
//! let (header, body) = Atoms::new(data, 0).next().unwrap()?;
//! assert_eq!(&header.kind, b"free");
//! assert!(body.is_empty());
//! assert_eq!(AtomHeader::decode(&[0, 0, 0, 0, b'm', b'd', b'a', b't'], 0, 100)?.unwrap().size, 100);
//! # Ok(())
//! # }
//! ```
//!
//! [`SeekIndex`]: crate::av::index::SeekIndex

pub mod atom;
pub mod boxes;
pub mod demuxer;
pub mod fragment;
pub mod movie;

pub use demuxer::{Mp4Demuxer, Mp4Factory};
pub use fragment::{Fragment, TrackFragment};
pub use movie::{Movie, Sample, Track, TrackKind};

#[cfg(test)]
mod tests;
