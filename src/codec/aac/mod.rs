//! AAC audio carried in ADTS framing, plus the AudioSpecificConfig fields
//! MP4 sample descriptions use.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;
