//! VP9 frames as delivered by a container.
//!
//! The container frames the packets, so no byte-level sync is needed. A
//! packet may hold several frames behind a superframe index; hidden frames
//! among them are decoded but never displayed.

pub mod parser;
pub mod types;

pub use parser::Vp9Parser;
pub use types::*;
