//! Expansion of a whole level of DXT blocks into a tightly packed RGBA8888 image.
//!
//! The block loop is compiled for several x86 feature levels through
//! [`mod@multiversion`]; other architectures use the generic build.

use crate::{
    alpha_decode::{decode_bc3, decode_bc4, decode_bc5},
    bc1_decode::decode_color_block,
    decoded_4x4_block::Decoded4x4Block,
};
use multiversion::multiversion;
use thiserror::Error;

/// The kind of block stored in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// DXT1 colour block with optional 1-bit alpha.
    Bc1,
    /// DXT5 alpha + colour block.
    Bc3,
    /// DXT5A single channel block.
    Bc4,
    /// DXN two channel block.
    Bc5,
}

impl BlockKind {
    /// Size of one block of this kind in bytes.
    #[inline]
    pub const fn bytes_per_block(self) -> usize {
        match self {
            BlockKind::Bc1 | BlockKind::Bc4 => 8,
            BlockKind::Bc3 | BlockKind::Bc5 => 16,
        }
    }

    /// Decodes one block of this kind.
    ///
    /// # Returns
    ///
    /// The decoded block, or [`None`] if `src` is shorter than a block.
    #[inline(always)]
    pub fn decode(self, src: &[u8]) -> Option<Decoded4x4Block> {
        Some(match self {
            BlockKind::Bc1 => decode_color_block(src.get(..8)?.try_into().ok()?, false),
            BlockKind::Bc3 => decode_bc3(src.get(..16)?.try_into().ok()?),
            BlockKind::Bc4 => decode_bc4(src.get(..8)?.try_into().ok()?),
            BlockKind::Bc5 => decode_bc5(src.get(..16)?.try_into().ok()?),
        })
    }
}

/// Errors from [`expand_blocks_to_rgba`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The block data does not cover the image.
    #[error("Block data too small: need {needed} bytes, but only {actual} bytes available.")]
    InputTooSmall {
        /// The required size in bytes
        needed: usize,
        /// The actual size in bytes
        actual: usize,
    },

    /// The RGBA output buffer is too small.
    #[error("Output buffer too small: need {needed} bytes, but only {actual} bytes available.")]
    OutputBufferTooSmall {
        /// The required size in bytes
        needed: usize,
        /// The actual size in bytes
        actual: usize,
    },
}

/// Number of bytes needed to hold a `width` x `height` RGBA8888 image.
#[inline]
pub const fn rgba_size(width: usize, height: usize) -> usize {
    width * height * 4
}

/// Decodes tightly packed blocks (`ceil(width / 4)` per row) into an RGBA8888 image.
///
/// # Parameters
///
/// - `blocks`: Source blocks, row-major
/// - `kind`: The kind of block in `blocks`
/// - `width`, `height`: Dimensions of the image in pixels
/// - `dst`: Output image, `width * 4` bytes per row
pub fn expand_blocks_to_rgba(
    blocks: &[u8],
    kind: BlockKind,
    width: usize,
    height: usize,
    dst: &mut [u8],
) -> Result<(), ExpandError> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let needed = blocks_x * blocks_y * kind.bytes_per_block();
    if blocks.len() < needed {
        return Err(ExpandError::InputTooSmall {
            needed,
            actual: blocks.len(),
        });
    }

    let needed = rgba_size(width, height);
    if dst.len() < needed {
        return Err(ExpandError::OutputBufferTooSmall {
            needed,
            actual: dst.len(),
        });
    }

    expand(blocks, kind, width, height, dst);
    Ok(())
}

#[cfg_attr(
    not(feature = "nightly"),
    multiversion(targets(
        // x86-64-v3 without lahfsahf
        "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v2 without lahfsahf
        "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    ))
)]
#[cfg_attr(
    feature = "nightly",
    multiversion(targets(
        // x86-64-v4 without lahfsahf
        "x86_64+avx+avx2+avx512bw+avx512cd+avx512dq+avx512f+avx512vl+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v3 without lahfsahf
        "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v2 without lahfsahf
        "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    ))
)]
fn expand(blocks: &[u8], kind: BlockKind, width: usize, height: usize, dst: &mut [u8]) {
    let blocks_x = width.div_ceil(4);
    let block_size = kind.bytes_per_block();

    for (index, src) in blocks
        .chunks_exact(block_size)
        .take(blocks_x * height.div_ceil(4))
        .enumerate()
    {
        if let Some(block) = kind.decode(src) {
            block.write_rgba(dst, width, height, index % blocks_x, index / blocks_x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_8888::Color8888;
    use rstest::rstest;

    fn solid_bc1(raw: u16) -> [u8; 8] {
        let c = raw.to_le_bytes();
        [c[0], c[1], c[0], c[1], 0, 0, 0, 0]
    }

    #[rstest]
    #[case::single_block(4, 4)]
    #[case::odd_size(5, 3)]
    #[case::one_pixel(1, 1)]
    #[case::wide(13, 6)]
    fn expands_solid_bc1_image(#[case] width: usize, #[case] height: usize) {
        let num_blocks = width.div_ceil(4) * height.div_ceil(4);
        let blocks: Vec<u8> = (0..num_blocks).flat_map(|_| solid_bc1(0xF800)).collect();
        let mut image = vec![0u8; rgba_size(width, height)];

        expand_blocks_to_rgba(&blocks, BlockKind::Bc1, width, height, &mut image).unwrap();
        assert!(image
            .chunks_exact(4)
            .all(|p| p == Color8888::new(255, 0, 0, 255).to_bytes()));
    }

    #[test]
    fn blocks_land_in_their_own_tile() {
        // 2x1 blocks: red then blue
        let mut blocks = solid_bc1(0xF800).to_vec();
        blocks.extend_from_slice(&solid_bc1(0x001F));
        let mut image = vec![0u8; rgba_size(8, 4)];

        expand_blocks_to_rgba(&blocks, BlockKind::Bc1, 8, 4, &mut image).unwrap();
        assert_eq!(&image[0..4], &[255, 0, 0, 255]);
        assert_eq!(&image[4 * 4..4 * 4 + 4], &[0, 0, 255, 255]);
        let last_row = 3 * 8 * 4;
        assert_eq!(&image[last_row + 7 * 4..last_row + 8 * 4], &[0, 0, 255, 255]);
    }

    #[test]
    fn rejects_short_buffers() {
        let blocks = [0u8; 8];
        let mut image = vec![0u8; rgba_size(8, 4)];
        assert_eq!(
            expand_blocks_to_rgba(&blocks, BlockKind::Bc1, 8, 4, &mut image),
            Err(ExpandError::InputTooSmall {
                needed: 16,
                actual: 8
            })
        );

        let mut small = [0u8; 4];
        assert_eq!(
            expand_blocks_to_rgba(&blocks, BlockKind::Bc1, 4, 4, &mut small),
            Err(ExpandError::OutputBufferTooSmall {
                needed: 64,
                actual: 4
            })
        );
    }
}
