//! A checked CRN file together with its unpack context.

use crate::error::CrnApiError;
use alloc::vec;
use alloc::vec::Vec;
use crn_decompress::{CrnFormat, LevelInfo, TextureInfo, Unpacker};
use crn_decompress_common::allocate::allocate_align_64;
use crn_decompress_common::rgba::{BlockKind, expand_blocks_to_rgba, rgba_size};
use safe_allocator_api::RawAlloc;

/// A CRN file ready for unpacking.
///
/// Creating it parses the header and decodes the shared tables and palettes; the
/// context is released when the value is dropped. The compressed data is borrowed,
/// never copied.
#[derive(Debug, Clone)]
pub struct CrunchedData<'a> {
    unpacker: Unpacker<'a>,
}

impl<'a> CrunchedData<'a> {
    /// Starts an unpack context over `data`.
    ///
    /// # Errors
    ///
    /// Fails if the header, tables or palettes are malformed.
    pub fn new(data: &'a [u8]) -> Result<Self, CrnApiError> {
        Ok(Self {
            unpacker: Unpacker::new(data)?,
        })
    }

    /// The compressed data.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.unpacker.data()
    }

    /// The underlying unpacker.
    #[inline]
    pub fn unpacker(&self) -> &Unpacker<'a> {
        &self.unpacker
    }

    /// Description of the texture.
    #[inline]
    pub fn texture_info(&self) -> TextureInfo {
        self.unpacker.texture_info()
    }

    /// Description of one level.
    pub fn level_info(&self, level_index: u32) -> Result<LevelInfo, CrnApiError> {
        Ok(self.unpacker.level_info(level_index)?)
    }

    /// Unpacks a level into a new buffer, tightly packed, faces one after another.
    pub fn decode_level(&self, level_index: u32) -> Result<Vec<u8>, CrnApiError> {
        let info = self.level_info(level_index)?;
        let mut output = vec![0u8; info.face_size() * info.faces as usize];
        self.unpack_faces(&mut output, &info, level_index)?;
        Ok(output)
    }

    /// Unpacks a level into a 64 byte aligned allocation, laid out as [`Self::decode_level`].
    pub fn decode_level_allocating(&self, level_index: u32) -> Result<RawAlloc, CrnApiError> {
        let info = self.level_info(level_index)?;
        let mut output = allocate_align_64(info.face_size() * info.faces as usize)?;
        self.unpack_faces(output.as_mut_slice(), &info, level_index)?;
        Ok(output)
    }

    /// Unpacks a level into caller provided buffers, one per face.
    ///
    /// See [`Unpacker::unpack_level`] for the meaning of `row_pitch`.
    pub fn decode_level_into(
        &self,
        dst: &mut [&mut [u8]],
        row_pitch: u32,
        level_index: u32,
    ) -> Result<(), CrnApiError> {
        Ok(self.unpacker.unpack_level(dst, row_pitch, level_index)?)
    }

    /// Unpacks one face of a level and decodes it to a `width * height` RGBA8888 image.
    ///
    /// DXN stores X in red and Y in green, with blue 0 and alpha 255. DXT5A is
    /// written as grey with alpha 255. Swizzled DXT5 variants are decoded as plain DXT5.
    pub fn decode_level_rgba(&self, level_index: u32, face: u32) -> Result<Vec<u8>, CrnApiError> {
        let info = self.level_info(level_index)?;
        if face >= info.faces {
            return Err(CrnApiError::InvalidFaceIndex {
                index: face,
                faces: info.faces,
            });
        }
        let kind = rgba_block_kind(info.format)?;

        let mut blocks = self.decode_level(level_index)?;
        let face_size = info.face_size();
        let blocks = &mut blocks[face as usize * face_size..][..face_size];
        if info.format == CrnFormat::DxnYX {
            for block in blocks.chunks_exact_mut(16) {
                let (y, x) = block.split_at_mut(8);
                y.swap_with_slice(x);
            }
        }

        let (width, height) = (info.width as usize, info.height as usize);
        let mut rgba = vec![0u8; rgba_size(width, height)];
        expand_blocks_to_rgba(blocks, kind, width, height, &mut rgba)?;
        Ok(rgba)
    }

    fn unpack_faces(
        &self,
        output: &mut [u8],
        info: &LevelInfo,
        level_index: u32,
    ) -> Result<(), CrnApiError> {
        let mut faces: Vec<&mut [u8]> = output.chunks_exact_mut(info.face_size()).collect();
        Ok(self.unpacker.unpack_level(&mut faces, 0, level_index)?)
    }
}

fn rgba_block_kind(format: CrnFormat) -> Result<BlockKind, CrnApiError> {
    Ok(match format {
        CrnFormat::Dxt1 => BlockKind::Bc1,
        CrnFormat::Dxt5
        | CrnFormat::Dxt5CCxY
        | CrnFormat::Dxt5xGxR
        | CrnFormat::Dxt5xGBR
        | CrnFormat::Dxt5AGBR => BlockKind::Bc3,
        CrnFormat::Dxt5A => BlockKind::Bc4,
        CrnFormat::DxnXY | CrnFormat::DxnYX => BlockKind::Bc5,
        CrnFormat::Dxt3 | CrnFormat::Etc1 => return Err(CrnApiError::RgbaUnsupported(format)),
    })
}
