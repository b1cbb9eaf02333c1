use crate::error::{Result, VdkError};

/// A bit-level reader for parsing binary data streams.
///
/// Fields are read most-significant-bit first starting at a byte-aligned
/// position, which is how MPEG, ADTS and VP9 headers are laid out.
///
/// Example:
/// ```
/// use vdkdemux::utils::BitReader;
///
/// let data = [0b10110011];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit().unwrap(), true);   // 1
/// assert_eq!(reader.read_bits(3).unwrap(), 0b011); // 011
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    bit_offset: u8,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader from a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Reads a single bit from the stream.
    /// Returns true for 1, false for 0.
    ///
    /// Returns error if end of data is reached.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.byte_offset >= self.data.len() {
            return Err(VdkError::Codec("Reached end of data".into()));
        }

        let bit = (self.data[self.byte_offset] >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;

        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }

        Ok(bit == 1)
    }

    /// Alias of [`read_bit`](Self::read_bit) for one-bit syntax flags.
    pub fn read_flag(&mut self) -> Result<bool> {
        self.read_bit()
    }

    /// Reads n bits and returns them as a number.
    /// The bits are interpreted as big-endian.
    ///
    /// Returns error if n > 32 or end of data is reached. Nothing is
    /// consumed when the request cannot be satisfied.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(VdkError::Codec("Too many bits requested".into()));
        }
        if n as usize > self.available_bits() {
            return Err(VdkError::Codec("Reached end of data".into()));
        }

        let mut value = 0u64;
        let mut remaining = n;
        while remaining > 0 {
            let byte = self.data[self.byte_offset];
            let left_in_byte = 8 - self.bit_offset as u32;
            let take = remaining.min(left_in_byte);
            let shift = left_in_byte - take;
            let bits = (byte as u32 >> shift) & ((1u32 << take) - 1);
            value = (value << take) | bits as u64;
            remaining -= take;

            self.bit_offset += take as u8;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_offset += 1;
            }
        }

        Ok(value as u32)
    }

    /// Skips n bits in the stream.
    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        if n as usize > self.available_bits() {
            return Err(VdkError::Codec("Reached end of data".into()));
        }
        let total = self.bit_offset as usize + n as usize;
        self.byte_offset += total / 8;
        self.bit_offset = (total % 8) as u8;
        Ok(())
    }

    /// Aligns reader to next byte boundary by skipping remaining bits in current byte.
    pub fn align_byte(&mut self) {
        if self.bit_offset != 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    /// Number of bits consumed so far.
    pub fn bit_position(&self) -> usize {
        self.byte_offset * 8 + self.bit_offset as usize
    }

    /// Number of whole bytes touched so far (a partially read byte counts).
    pub fn byte_position(&self) -> usize {
        self.byte_offset + usize::from(self.bit_offset != 0)
    }

    /// Returns number of bits available to read.
    pub fn available_bits(&self) -> usize {
        (self.data.len().saturating_sub(self.byte_offset)) * 8 - self.bit_offset as usize
    }
}
