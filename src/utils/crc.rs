/// CRC-16 as used by MPEG audio error protection.
/// Based on ISO/IEC 11172-3 clause 2.4.3.1
/// Polynomial: x16 + x15 + x2 + 1
/// Initial value: 0xFFFF, no reflection, no final xor

const CRC16_MPEG_AUDIO: u16 = 0x8005;

/// CRC-16 calculator for validating protected MPEG audio frames
///
/// The checksum covers the last two header bytes followed by the layer's
/// side information; the result is compared against the 16-bit word that
/// follows the four-byte frame header.
pub struct Crc16 {
    /// Lookup table for fast CRC calculation
    table: [u16; 256],
}

impl Crc16 {
    /// Creates a new CRC16 calculator with pre-computed lookup table
    pub fn new() -> Self {
        let mut table = [0u16; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u16) << 8;
            for _ in 0..8 {
                crc = if (crc & 0x8000) != 0 {
                    (crc << 1) ^ CRC16_MPEG_AUDIO
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        Self { table }
    }

    /// Calculates the checksum over every slice in `parts`, in order
    ///
    /// # Examples
    ///
    /// ```
    /// use vdkdemux::utils::Crc16;
    ///
    /// let crc = Crc16::new();
    /// assert_eq!(crc.calculate(&[b"123456789"]), 0xAEE7);
    /// ```
    pub fn calculate(&self, parts: &[&[u8]]) -> u16 {
        let mut crc = 0xFFFFu16;
        for part in parts {
            for &byte in part.iter() {
                let index = ((crc >> 8) ^ byte as u16) & 0xFF;
                crc = (crc << 8) ^ self.table[index as usize];
            }
        }
        crc
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_crc16_check_value() {
        let crc = Crc16::new();
        // Standard check value for this parameter set ("CRC-16/CMS")
        assert_eq!(crc.calculate(&[b"123456789"]), 0xAEE7);
    }

    #[test]
    fn test_split_input_matches_contiguous() {
        let crc = Crc16::new();
        let whole = crc.calculate(&[&[0x90, 0x64, 1, 2, 3, 4, 5]]);
        let split = crc.calculate(&[&[0x90, 0x64], &[1, 2, 3], &[4, 5]]);
        assert_eq!(whole, split);
        assert_eq!(crc.calculate(&[]), 0xFFFF);
    }
}
