//! # Utility Functions and Types
//!
//! This module provides common utility functions and types used throughout the vdkdemux library.
//! It includes implementations for:
//!
//! - Bit-level reading of codec headers
//! - CRC calculation and validation
//! - The rolling byte buffer elementary parsers scan
//!
//! ## Bit Operations
//!
//! ```rust
//! use vdkdemux::utils::BitReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//!
//! // Read specific number of bits
//! let value = reader.read_bits(3)?; // Reads first 3 bits (101)
//! assert_eq!(value, 0b101);
//! # Ok(())
//! # }
//! ```
//!
//! ## CRC Calculation
//!
//! The crc module provides the CRC-16 protecting MPEG audio frames:
//!
//! ```rust
//! use vdkdemux::utils::Crc16;
//!
//! # fn main() {
//! let crc = Crc16::new();
//! println!("CRC16: {:04x}", crc.calculate(&[b"Hello, world!"]));
//! # }
//! ```

/// Bit manipulation and bitstream reading utilities
pub mod bits;

/// Rolling buffer of unconsumed stream bytes
pub mod buffer;

/// CRC calculation implementations
pub mod crc;

// Re-export commonly used types
pub use bits::*;
pub use buffer::ByteBuffer;
pub use crc::Crc16;
