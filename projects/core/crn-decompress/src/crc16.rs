//! The CRC-16 variant used by CRN headers and data.
//!
//! A CCITT style polynomial computed without a table, starting from `!0` and
//! inverted at the end. Computing `crc16(b, crc16(a, 0))` equals `crc16(a ++ b, 0)`.

/// Updates a running CRC-16 with `data`.
///
/// Start with `crc = 0` for a fresh checksum.
#[inline]
pub fn crc16(data: &[u8], crc: u16) -> u16 {
    let mut crc = !crc;
    for &byte in data {
        let q = (byte as u16) ^ (crc >> 8);
        crc <<= 8;
        let mut r = (q >> 4) ^ q;
        crc ^= r;
        r <<= 5;
        crc ^= r;
        r <<= 7;
        crc ^= r;
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_keeps_seed() {
        assert_eq!(crc16(&[], 0), 0);
        assert_eq!(crc16(&[], 0x1234), 0x1234);
    }

    #[test]
    fn matches_ccitt_false_check_value() {
        // With the !0 seed and final inversion cancelling, this is CRC-16/CCITT-FALSE
        // seeded with 0xFFFF, whose check value for "123456789" is 0x29B1.
        assert_eq!(crc16(b"123456789", 0), !0x29B1u16);
    }

    #[test]
    fn can_be_computed_incrementally() {
        let data = b"crunched texture data";
        let (a, b) = data.split_at(7);
        assert_eq!(crc16(b, crc16(a, 0)), crc16(data, 0));
    }

    #[test]
    fn detects_single_bit_flips() {
        let data = [0x48u8, 0x78, 0x00, 0x4A, 0x12, 0x34];
        let reference = crc16(&data, 0);
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc16(&flipped, 0), reference);
            }
        }
    }
}
