//! MPEG-1, MPEG-2 and MPEG-2.5 audio (layers I, II and III).
//!
//! Frame boundaries come entirely from the four-byte header: bitrate,
//! sample rate and padding fix the frame length.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;
