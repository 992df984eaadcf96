//! DXT1 (BC1) block decoding.
//!
//! Uses the 'ideal' rounding described in the DX9 docs
//! <https://learn.microsoft.com/en-us/windows/win32/direct3d9/opaque-and-1-bit-alpha-textures>,
//! as opposed to the DX10, AMD or Nvidia methods.

use crate::{color_565::Color565, color_8888::Color8888, decoded_4x4_block::Decoded4x4Block};

/// Size of a DXT1 block in bytes.
pub const BC1_BLOCK_SIZE: usize = 8;

/// Builds the 4 entry colour palette for a DXT1 colour block.
///
/// When `always_four_colors` is set (the colour half of a DXT5 block), the
/// `c0 <= c1` three colour + transparent mode is never used.
#[inline(always)]
pub(crate) fn bc1_palette(c0: Color565, c1: Color565, always_four_colors: bool) -> [Color8888; 4] {
    let (r0, g0, b0) = (c0.red() as u32, c0.green() as u32, c0.blue() as u32);
    let (r1, g1, b1) = (c1.red() as u32, c1.green() as u32, c1.blue() as u32);

    let mut dict = [Color8888::default(); 4];
    dict[0] = c0.to_color_8888();
    dict[1] = c1.to_color_8888();

    if always_four_colors || c0.greater_than(&c1) {
        dict[2] = Color8888::new(
            ((2 * r0 + r1) / 3) as u8,
            ((2 * g0 + g1) / 3) as u8,
            ((2 * b0 + b1) / 3) as u8,
            255,
        );
        dict[3] = Color8888::new(
            ((r0 + 2 * r1) / 3) as u8,
            ((g0 + 2 * g1) / 3) as u8,
            ((b0 + 2 * b1) / 3) as u8,
            255,
        );
    } else {
        dict[2] = Color8888::new(
            ((r0 + r1) / 2) as u8,
            ((g0 + g1) / 2) as u8,
            ((b0 + b1) / 2) as u8,
            255,
        );
        // Transparent black
        dict[3] = Color8888::new(0, 0, 0, 0);
    }

    dict
}

/// Decodes the colour half of a block: 2 endpoints followed by 32 bits of 2-bit indices.
#[inline(always)]
pub(crate) fn decode_color_block(block: &[u8; 8], always_four_colors: bool) -> Decoded4x4Block {
    let c0 = Color565::from_raw(u16::from_le_bytes([block[0], block[1]]));
    let c1 = Color565::from_raw(u16::from_le_bytes([block[2], block[3]]));
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let dict = bc1_palette(c0, c1, always_four_colors);

    let mut result = Decoded4x4Block::new(Color8888::default());
    for (x, pixel) in result.pixels.iter_mut().enumerate() {
        *pixel = dict[((indices >> (x * 2)) & 0b11) as usize];
    }
    result
}

/// Decodes a DXT1 block into a structured representation of pixels
///
/// # Parameters
///
/// - `src`: Pointer to the source DXT1 block
///
/// # Safety
///
/// The caller must ensure that `src` points to at least 8 bytes of valid memory.
///
/// # Example
///
/// ```
/// use crn_decompress_common::bc1_decode::decode_bc1_block;
///
/// let bc1_block = [0u8; 8];
/// let decoded = unsafe { decode_bc1_block(bc1_block.as_ptr()) };
/// let pixel_at_0_0 = unsafe { decoded.get_pixel_unchecked(0, 0) };
/// ```
#[inline(always)]
pub unsafe fn decode_bc1_block(src: *const u8) -> Decoded4x4Block {
    let block = unsafe { src.cast::<[u8; 8]>().read_unaligned() };
    decode_color_block(&block, false)
}

/// Safe wrapper around [`decode_bc1_block`] for slices.
///
/// # Returns
///
/// A decoded block, else [`None`] if the slice is too short.
#[inline(always)]
pub fn decode_bc1_block_from_slice(src: &[u8]) -> Option<Decoded4x4Block> {
    let block: &[u8; 8] = src.get(..BC1_BLOCK_SIZE)?.try_into().ok()?;
    Some(decode_color_block(block, false))
}
