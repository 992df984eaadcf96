/// MSB-first bit reader over a byte slice.
///
/// Reading past the end of the slice yields zero bits.
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buf: u64,
    bit_count: u32,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_buf: 0,
            bit_count: 0,
        }
    }

    #[inline(always)]
    fn refill(&mut self) {
        while self.bit_count <= 56 {
            let byte = match self.data.get(self.pos) {
                Some(&byte) => {
                    self.pos += 1;
                    byte
                }
                None => 0,
            };
            self.bit_buf |= (byte as u64) << (56 - self.bit_count);
            self.bit_count += 8;
        }
    }

    /// Returns the next `num_bits` (1..=32) bits without consuming them.
    #[inline(always)]
    pub(crate) fn peek(&mut self, num_bits: u32) -> u32 {
        debug_assert!((1..=32).contains(&num_bits));
        if self.bit_count < num_bits {
            self.refill();
        }
        (self.bit_buf >> (64 - num_bits)) as u32
    }

    /// Drops `num_bits` previously returned by [`Self::peek`].
    #[inline(always)]
    pub(crate) fn consume(&mut self, num_bits: u32) {
        debug_assert!(num_bits <= self.bit_count);
        self.bit_buf <<= num_bits;
        self.bit_count -= num_bits;
    }

    /// Reads `num_bits` (0..=32) bits.
    #[inline(always)]
    pub(crate) fn read_bits(&mut self, num_bits: u32) -> u32 {
        if num_bits == 0 {
            return 0;
        }
        let value = self.peek(num_bits);
        self.consume(num_bits);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn reads_msb_first() {
        let mut reader = BitReader::new(&[0b1010_0000, 0xFF]);
        assert_eq!(reader.read_bits(1), 1);
        assert_eq!(reader.read_bits(1), 0);
        assert_eq!(reader.read_bits(2), 0b10);
        assert_eq!(reader.read_bits(8), 0b0000_1111);
        assert_eq!(reader.read_bits(4), 0b1111);
    }

    #[test]
    fn zero_fills_past_end() {
        let mut reader = BitReader::new(&[0xFF]);
        assert_eq!(reader.read_bits(4), 0xF);
        assert_eq!(reader.read_bits(8), 0xF0);
        assert_eq!(reader.read_bits(32), 0);
    }

    #[rstest]
    #[case(32)]
    #[case(17)]
    #[case(9)]
    fn reads_wide_values_across_bytes(#[case] num_bits: u32) {
        let data = 0xDEAD_BEEF_u32.to_be_bytes();
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(num_bits), 0xDEAD_BEEF >> (32 - num_bits));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut reader = BitReader::new(&[0xC3]);
        assert_eq!(reader.peek(2), 0b11);
        assert_eq!(reader.peek(8), 0xC3);
        reader.consume(6);
        assert_eq!(reader.read_bits(2), 0b11);
    }
}
