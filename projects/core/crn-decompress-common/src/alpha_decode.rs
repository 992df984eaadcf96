//! Decoding of the interpolated single channel blocks: DXT5 (BC3) alpha,
//! DXT5A (BC4) and DXN (BC5).
//!
//! Uses the 'ideal' rounding described in the DX9/DX10 docs
//! <https://learn.microsoft.com/en-us/windows/win32/direct3d10/d3d10-graphics-programming-guide-resources-block-compression#bc3>.

use crate::{
    bc1_decode::decode_color_block, color_8888::Color8888, decoded_4x4_block::Decoded4x4Block,
};

/// Size of a DXT5 block in bytes.
pub const BC3_BLOCK_SIZE: usize = 16;
/// Size of a DXT5A block in bytes.
pub const BC4_BLOCK_SIZE: usize = 8;
/// Size of a DXN block in bytes.
pub const BC5_BLOCK_SIZE: usize = 16;

/// Decodes an 8 byte single channel block into its 16 values (row-major).
#[allow(clippy::identity_op)]
#[inline(always)]
pub fn decode_alpha_values(block: &[u8; 8]) -> [u8; 16] {
    let a0 = block[0] as u16;
    let a1 = block[1] as u16;

    let mut palette = [0u8; 8];
    palette[0] = a0 as u8;
    palette[1] = a1 as u8;

    // a0 > a1: 8 interpolated values, otherwise 6 + fully transparent and opaque
    if a0 > a1 {
        palette[2] = ((6 * a0 + 1 * a1) / 7) as u8;
        palette[3] = ((5 * a0 + 2 * a1) / 7) as u8;
        palette[4] = ((4 * a0 + 3 * a1) / 7) as u8;
        palette[5] = ((3 * a0 + 4 * a1) / 7) as u8;
        palette[6] = ((2 * a0 + 5 * a1) / 7) as u8;
        palette[7] = ((1 * a0 + 6 * a1) / 7) as u8;
    } else {
        palette[2] = ((4 * a0 + 1 * a1) / 5) as u8;
        palette[3] = ((3 * a0 + 2 * a1) / 5) as u8;
        palette[4] = ((2 * a0 + 3 * a1) / 5) as u8;
        palette[5] = ((1 * a0 + 4 * a1) / 5) as u8;
        palette[6] = 0;
        palette[7] = 255;
    }

    // 48 bits of 3-bit indices, little endian
    let mut bits = [0u8; 8];
    bits[..6].copy_from_slice(&block[2..8]);
    let indices = u64::from_le_bytes(bits);

    let mut values = [0u8; 16];
    for (x, value) in values.iter_mut().enumerate() {
        *value = palette[((indices >> (x * 3)) & 0b111) as usize];
    }
    values
}

#[inline(always)]
fn split_16(block: &[u8; 16]) -> ([u8; 8], [u8; 8]) {
    let mut first = [0u8; 8];
    let mut second = [0u8; 8];
    first.copy_from_slice(&block[..8]);
    second.copy_from_slice(&block[8..]);
    (first, second)
}

/// Decodes a DXT5 block (alpha block followed by a 4 colour DXT1 block).
#[inline(always)]
pub fn decode_bc3(block: &[u8; 16]) -> Decoded4x4Block {
    let (alpha, color) = split_16(block);
    let mut result = decode_color_block(&color, true);
    let alphas = decode_alpha_values(&alpha);
    for (pixel, alpha) in result.pixels.iter_mut().zip(alphas) {
        pixel.a = alpha;
    }
    result
}

/// Decodes a DXT5A block; the value is replicated into the colour channels.
#[inline(always)]
pub fn decode_bc4(block: &[u8; 8]) -> Decoded4x4Block {
    let values = decode_alpha_values(block);
    let mut result = Decoded4x4Block::new(Color8888::default());
    for (pixel, value) in result.pixels.iter_mut().zip(values) {
        *pixel = Color8888::splat_opaque(value);
    }
    result
}

/// Decodes a DXN block; the first half goes to red, the second to green.
#[inline(always)]
pub fn decode_bc5(block: &[u8; 16]) -> Decoded4x4Block {
    let (x_block, y_block) = split_16(block);
    let xs = decode_alpha_values(&x_block);
    let ys = decode_alpha_values(&y_block);
    let mut result = Decoded4x4Block::new(Color8888::default());
    for (x, pixel) in result.pixels.iter_mut().enumerate() {
        *pixel = Color8888::new(xs[x], ys[x], 0, 255);
    }
    result
}

/// Decodes a DXT5 block into a structured representation of pixels
///
/// # Safety
///
/// The caller must ensure that `src` points to at least 16 bytes of valid memory.
#[inline(always)]
pub unsafe fn decode_bc3_block(src: *const u8) -> Decoded4x4Block {
    let block = unsafe { src.cast::<[u8; 16]>().read_unaligned() };
    decode_bc3(&block)
}

/// Safe wrapper around [`decode_bc3_block`] for slices.
///
/// # Returns
///
/// A decoded block, else [`None`] if the slice is too short.
#[inline(always)]
pub fn decode_bc3_block_from_slice(src: &[u8]) -> Option<Decoded4x4Block> {
    let block: &[u8; 16] = src.get(..BC3_BLOCK_SIZE)?.try_into().ok()?;
    Some(decode_bc3(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alpha_block(a0: u8, a1: u8, index: u64) -> [u8; 8] {
        let indices = (0..16).fold(0u64, |acc, x| acc | (index << (x * 3)));
        let bytes = indices.to_le_bytes();
        [a0, a1, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]]
    }

    #[rstest]
    #[case::endpoint_0(255, 0, 0, 255)]
    #[case::endpoint_1(255, 0, 1, 0)]
    #[case::eight_value_interp(255, 0, 2, 218)] // (6*255)/7
    #[case::eight_value_last(255, 0, 7, 36)] // 255/7
    #[case::six_value_interp(0, 255, 2, 51)] // 255/5
    #[case::six_value_transparent(0, 255, 6, 0)]
    #[case::six_value_opaque(0, 255, 7, 255)]
    fn decodes_alpha_palette(
        #[case] a0: u8,
        #[case] a1: u8,
        #[case] index: u64,
        #[case] expected: u8,
    ) {
        let values = decode_alpha_values(&alpha_block(a0, a1, index));
        assert!(values.iter().all(|&v| v == expected));
    }

    #[test]
    fn decodes_mixed_indices_in_row_major_order() {
        // index x for pixel x (mod 8)
        let indices = (0..16u64).fold(0u64, |acc, x| acc | ((x % 8) << (x * 3)));
        let bytes = indices.to_le_bytes();
        let block = [70, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]];
        let values = decode_alpha_values(&block);
        assert_eq!(&values[..8], &[70, 0, 60, 50, 40, 30, 20, 10]);
        assert_eq!(&values[..8], &values[8..]);
    }

    #[test]
    fn bc3_combines_alpha_and_four_color_block() {
        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&alpha_block(128, 0, 0));
        // c0 = black, c1 = white; BC3 still uses 4 colour mode, index 3
        block[8..12].copy_from_slice(&[0x00, 0x00, 0xFF, 0xFF]);
        block[12..].copy_from_slice(&[0xFF; 4]);

        let decoded = decode_bc3_block_from_slice(&block).unwrap();
        assert!(decoded
            .pixels
            .iter()
            .all(|&p| p == Color8888::new(170, 170, 170, 128)));
    }

    #[test]
    fn bc4_and_bc5_fill_expected_channels() {
        let bc4 = decode_bc4(&alpha_block(90, 0, 0));
        assert!(bc4.pixels.iter().all(|&p| p == Color8888::new(90, 90, 90, 255)));

        let mut bc5 = [0u8; 16];
        bc5[..8].copy_from_slice(&alpha_block(10, 0, 0));
        bc5[8..].copy_from_slice(&alpha_block(20, 0, 0));
        let decoded = decode_bc5(&bc5);
        assert!(decoded.pixels.iter().all(|&p| p == Color8888::new(10, 20, 0, 255)));
    }
}
