//! MPEG-1 and MPEG-2 video elementary streams.
//!
//! Only start codes and the sequence and picture headers are read; the
//! slice layer is passed through untouched. Timestamps are in decode order
//! on the 90 kHz clock.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;
