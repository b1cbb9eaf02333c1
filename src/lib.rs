#![doc(html_root_url = "https://docs.rs/vdkdemux/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # vdkdemux - media demuxing toolkit
//!
//! `vdkdemux` turns files and byte streams into timestamped packets. It
//! recognises the input format, splits it into per-stream frames, reports
//! the stream parameters it discovers and seeks through a per-stream index.
//!
//! ## Features
//!
//! ### Containers
//! - MP4 / QuickTime, including fragmented files (`moof`/`traf`/`trun`)
//! - Raw elementary streams
//!
//! ### Elementary stream parsers
//! - MPEG-1/2 audio layers I, II and III
//! - AAC in ADTS framing
//! - MPEG-1/2 video
//! - VP9 frames and superframes, with hidden-frame tagging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vdkdemux::config::Config;
//! use vdkdemux::format::Registry;
//! use vdkdemux::io::{ByteReader, SeekableSource};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::with_defaults(Config::load()?);
//!
//!     let file = std::fs::File::open("movie.mp4")?;
//!     let reader = ByteReader::new(Box::new(SeekableSource::new(file)?));
//!     let mut demuxer = registry.open(reader)?;
//!
//!     for stream in demuxer.streams() {
//!         println!("stream {}: {:?}", stream.index, stream.format.codec);
//!     }
//!
//!     // Jump to the keyframe at or before 10 s
//!     demuxer.seek(10_000, 1000)?;
//!     while let Some(packet) = demuxer.read_packet()? {
//!         println!(
//!             "stream {} at {}/{}: {} bytes",
//!             packet.stream_index, packet.timestamp, packet.timescale, packet.size
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: packets, stream descriptions, the `Demuxer` trait and the seek index
//! - `codec`: elementary stream parsers sharing the `StreamParser` contract
//! - `format`: the demuxer registry, the MP4 reader and elementary stream demuxing
//! - `io`: buffered byte sources, seekable or forward-only
//! - `config`: tunables, from defaults, a config file and the environment
//! - `error`: the crate error type and `Result` alias
//! - `utils`: bit reading, CRC and byte buffers

/// Audio/Video base types and utilities
pub mod av;

/// Elementary stream parsers
pub mod codec;

/// Error types and utilities
pub mod error;

/// Container formats and the demuxer registry
pub mod format;

/// Byte sources and the buffered reader over them
pub mod io;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

pub use error::{Result, VdkError};
