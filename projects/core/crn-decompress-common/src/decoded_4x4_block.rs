//! # Decoded 4x4 Block
//!
//! This module provides the [`Decoded4x4Block`] structure for representing decompressed
//! 4x4 pixel blocks of DXT/BC texture data.
//!
//! The pixels are stored in row-major order:
//! ```text
//! [ 0] [ 1] [ 2] [ 3]
//! [ 4] [ 5] [ 6] [ 7]
//! [ 8] [ 9] [10] [11]
//! [12] [13] [14] [15]
//! ```
//!
//! ## Usage
//!
//! ```
//! use crn_decompress_common::color_8888::Color8888;
//! use crn_decompress_common::decoded_4x4_block::Decoded4x4Block;
//!
//! let red_pixel = Color8888::new(255, 0, 0, 255);
//! let block = Decoded4x4Block::new(red_pixel);
//! assert_eq!(block.pixel(3, 3), Some(red_pixel));
//! ```
//!
//! ## Safety
//!
//! The unsafe accessors (`get_pixel_unchecked`, `set_pixel_unchecked`) skip bounds
//! checking for hot loops; the caller must keep coordinates within 0-3.

use crate::color_8888::Color8888;

/// Represents a decoded 4x4 block of BC pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded4x4Block {
    /// The 16 pixels in the block (row-major order)
    /// (i.e. `pixels[0]` is top-left, `pixels[3]` is top-right, etc.)
    pub pixels: [Color8888; 16],
}

impl Decoded4x4Block {
    /// Constructs a new decoded block initialised with 16 copies of the provided pixel.
    pub fn new(pixel: Color8888) -> Self {
        Self {
            pixels: [pixel; 16],
        }
    }

    /// Gets a pixel at the specified coordinates (0-3, 0-3) without bounds checking
    ///
    /// # Safety
    ///
    /// The caller must ensure that `x < 4` and `y < 4`.
    #[inline]
    pub unsafe fn get_pixel_unchecked(&self, x: usize, y: usize) -> Color8888 {
        *self.pixels.get_unchecked(y * 4 + x)
    }

    /// Sets a pixel at the specified coordinates (0-3, 0-3) without bounds checking
    ///
    /// # Safety
    ///
    /// The caller must ensure that `x < 4` and `y < 4`.
    #[inline]
    pub unsafe fn set_pixel_unchecked(&mut self, x: usize, y: usize, pixel: Color8888) {
        *self.pixels.get_unchecked_mut(y * 4 + x) = pixel;
    }

    /// Gets a pixel at the specified coordinates, or [`None`] if out of range.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color8888> {
        if x < 4 && y < 4 {
            Some(self.pixels[y * 4 + x])
        } else {
            None
        }
    }

    /// Copies the visible part of this block into an RGBA8888 image.
    ///
    /// # Parameters
    ///
    /// - `dst`: The image, tightly packed, `image_width * 4` bytes per row
    /// - `image_width`, `image_height`: Dimensions of the image in pixels
    /// - `block_x`, `block_y`: Position of this block, in blocks
    ///
    /// Pixels which fall outside the image (partial blocks on the right/bottom edge)
    /// are skipped.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than `image_width * image_height * 4` bytes.
    #[inline]
    pub fn write_rgba(
        &self,
        dst: &mut [u8],
        image_width: usize,
        image_height: usize,
        block_x: usize,
        block_y: usize,
    ) {
        let x0 = block_x * 4;
        let y0 = block_y * 4;
        let visible_w = image_width.saturating_sub(x0).min(4);
        let visible_h = image_height.saturating_sub(y0).min(4);

        for y in 0..visible_h {
            let row_start = ((y0 + y) * image_width + x0) * 4;
            let row = &mut dst[row_start..row_start + visible_w * 4];
            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                out.copy_from_slice(&self.pixels[y * 4 + x].to_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gradient_block() -> Decoded4x4Block {
        let mut block = Decoded4x4Block::new(Color8888::default());
        for (x, pixel) in block.pixels.iter_mut().enumerate() {
            *pixel = Color8888::new(x as u8, 0, 0, 255);
        }
        block
    }

    #[test]
    fn pixel_returns_none_out_of_bounds() {
        let block = gradient_block();
        assert_eq!(block.pixel(4, 0), None);
        assert_eq!(block.pixel(0, 4), None);
        assert_eq!(block.pixel(1, 2), Some(Color8888::new(9, 0, 0, 255)));
    }

    #[rstest]
    #[case::full_block(4, 4)]
    #[case::partial_width(3, 4)]
    #[case::partial_both(1, 2)]
    fn write_rgba_clips_to_image(#[case] width: usize, #[case] height: usize) {
        let block = gradient_block();
        let mut image = vec![0xAAu8; width * height * 4];
        block.write_rgba(&mut image, width, height, 0, 0);

        for y in 0..height {
            for x in 0..width {
                let offset = (y * width + x) * 4;
                assert_eq!(image[offset], (y * 4 + x) as u8);
                assert_eq!(image[offset + 3], 255);
            }
        }
    }

    #[test]
    fn write_rgba_places_block_by_position() {
        let block = Decoded4x4Block::new(Color8888::new(1, 2, 3, 4));
        let (width, height) = (8, 8);
        let mut image = vec![0u8; width * height * 4];
        block.write_rgba(&mut image, width, height, 1, 1);

        // Top left quadrant untouched, bottom right written.
        assert_eq!(&image[0..4], &[0, 0, 0, 0]);
        let offset = (4 * width + 4) * 4;
        assert_eq!(&image[offset..offset + 4], &[1, 2, 3, 4]);
    }
}
