//! Unpacking of CRN levels into DXT blocks.
//!
//! An [`Unpacker`] decodes the Huffman tables and palettes of a file once; each
//! [`Unpacker::unpack_level`] call then only walks that level's chunk data.
//!
//! # Examples
//!
//! ```ignore
//! use crn_decompress::Unpacker;
//!
//! let unpacker = Unpacker::new(&crn_bytes)?;
//! let info = unpacker.level_info(0)?;
//! let mut face = vec![0u8; info.face_size()];
//! unpacker.unpack_level(&mut [&mut face[..]], 0, 0)?;
//! ```

mod blocks;
mod layout;

#[cfg(any(test, feature = "test-utils"))]
pub(crate) use blocks::{block_slots, Component, CHUNK_ENCODING_NUM_TILES, CHUNK_TILE_INDICES};

use crate::codec::{HuffmanModel, SymbolDecoder};
use crate::error::CrnDecompressError;
use crate::format::CrnFormat;
use crate::header::CrnHeader;
use crate::info::{LevelInfo, TextureInfo};
use crate::palette::Palettes;
use layout::LevelLayout;

/// The Huffman models shared by every level of a file.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) chunk_encoding: HuffmanModel,
    /// Index 0: colour, index 1: alpha.
    pub(crate) endpoint_delta: [HuffmanModel; 2],
    /// Index 0: colour, index 1: alpha.
    pub(crate) selector_delta: [HuffmanModel; 2],
}

impl Tables {
    fn decode(header: &CrnHeader, data: &[u8]) -> Result<Self, CrnDecompressError> {
        let start = header.tables_offset as usize;
        let bytes = data
            .get(start..start + header.tables_size as usize)
            .ok_or(CrnDecompressError::InvalidHeader("tables out of range"))?;
        let mut decoder = SymbolDecoder::new(bytes)?;

        let mut tables = Tables {
            chunk_encoding: decoder.receive_static_model()?,
            ..Tables::default()
        };

        let has_color = header.color_endpoints.num != 0;
        let has_alpha = header.alpha_endpoints.num != 0;
        if !has_color && !has_alpha {
            return Err(CrnDecompressError::InvalidHeader("no endpoint palettes"));
        }
        if has_color {
            tables.endpoint_delta[0] = decoder.receive_static_model()?;
            tables.selector_delta[0] = decoder.receive_static_model()?;
        }
        if has_alpha {
            tables.endpoint_delta[1] = decoder.receive_static_model()?;
            tables.selector_delta[1] = decoder.receive_static_model()?;
        }
        Ok(tables)
    }
}

/// Decoder state for one CRN file.
///
/// Borrows the compressed data for its lifetime and owns the decoded tables and
/// palettes. Unpacking only reads this state, so one [`Unpacker`] can serve
/// several threads, each unpacking into its own buffers.
#[derive(Debug, Clone)]
pub struct Unpacker<'a> {
    data: &'a [u8],
    header: CrnHeader,
    format: CrnFormat,
    tables: Tables,
    palettes: Palettes,
}

impl<'a> Unpacker<'a> {
    /// Parses and checks the header, then decodes the Huffman tables and palettes.
    ///
    /// Checksums are not verified; call [`validate_file`](crate::validate_file) first
    /// for untrusted input where that matters. Corrupt data is still rejected
    /// with an error by every later call.
    pub fn new(data: &'a [u8]) -> Result<Self, CrnDecompressError> {
        let header = CrnHeader::parse(data)?;
        header.check_limits()?;
        let format = header.crn_format()?;
        for level in 0..header.levels as u32 {
            header.level_range(level, data.len())?;
        }

        let tables = Tables::decode(&header, data)?;
        let palettes = Palettes::decode(&header, data)?;

        if format.has_color_block()
            && (palettes.color_endpoints.is_empty() || palettes.color_selectors.is_empty())
        {
            return Err(CrnDecompressError::InvalidHeader("missing colour palettes"));
        }
        if format.alpha_block_count() != 0
            && (palettes.alpha_endpoints.is_empty() || palettes.alpha_selectors.is_empty())
        {
            return Err(CrnDecompressError::InvalidHeader("missing alpha palettes"));
        }

        Ok(Self {
            data,
            header,
            format,
            tables,
            palettes,
        })
    }

    /// The compressed data this unpacker reads from.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The parsed header.
    #[inline]
    pub fn header(&self) -> &CrnHeader {
        &self.header
    }

    /// The format the texture unpacks to.
    #[inline]
    pub fn format(&self) -> CrnFormat {
        self.format
    }

    /// Description of the texture.
    pub fn texture_info(&self) -> TextureInfo {
        TextureInfo {
            width: self.header.width as u32,
            height: self.header.height as u32,
            levels: self.header.levels as u32,
            faces: self.header.faces as u32,
            bytes_per_block: self.format.bytes_per_block(),
            userdata0: self.header.userdata0,
            userdata1: self.header.userdata1,
            format: self.format,
        }
    }

    /// Description of level `level_index`.
    pub fn level_info(&self, level_index: u32) -> Result<LevelInfo, CrnDecompressError> {
        LevelInfo::from_header(&self.header, level_index)
    }

    /// Unpacks one level into DXT blocks.
    ///
    /// # Parameters
    ///
    /// - `dst`: One buffer per face, each at least `row_pitch * blocks_y` bytes
    /// - `row_pitch`: Bytes between block rows; 0 for tightly packed rows.
    ///   Otherwise a multiple of 4 no smaller than `blocks_x * bytes_per_block`.
    /// - `level_index`: The level to unpack
    ///
    /// # Errors
    ///
    /// Invalid arguments are rejected before anything is written. On corrupt data,
    /// the destination may be partially written.
    pub fn unpack_level(
        &self,
        dst: &mut [&mut [u8]],
        row_pitch: u32,
        level_index: u32,
    ) -> Result<(), CrnDecompressError> {
        let info = self.level_info(level_index)?;
        if !self.format.can_unpack() {
            return Err(CrnDecompressError::UnsupportedFormat(self.format as u32));
        }

        let layout = LevelLayout::new(&info, row_pitch)?;
        layout.check_destination(info.faces, dst)?;

        let range = self.header.level_range(level_index, self.data.len())?;
        let mut decoder = SymbolDecoder::new(&self.data[range])?;
        blocks::unpack_level_blocks(
            &mut decoder,
            &self.tables,
            &self.palettes,
            self.format,
            &layout,
            dst,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;
    use rstest::rstest;

    fn unpack_all_faces(unpacker: &Unpacker, level: u32, row_pitch: u32) -> Vec<Vec<u8>> {
        let info = unpacker.level_info(level).unwrap();
        let pitch = if row_pitch == 0 { info.row_pitch() } else { row_pitch };
        let face_size = pitch as usize * info.blocks_y as usize;
        let mut faces = vec![vec![0xCDu8; face_size]; info.faces as usize];
        let mut dst: Vec<&mut [u8]> = faces.iter_mut().map(|f| &mut f[..]).collect();
        unpacker.unpack_level(&mut dst, row_pitch, level).unwrap();
        faces
    }

    #[rstest]
    #[case::dxt1(CrnFormat::Dxt1)]
    #[case::dxt5(CrnFormat::Dxt5)]
    #[case::dxt5_ccxy(CrnFormat::Dxt5CCxY)]
    #[case::dxt5_xgxr(CrnFormat::Dxt5xGxR)]
    #[case::dxt5_xgbr(CrnFormat::Dxt5xGBR)]
    #[case::dxt5_agbr(CrnFormat::Dxt5AGBR)]
    #[case::dxn_xy(CrnFormat::DxnXY)]
    #[case::dxn_yx(CrnFormat::DxnYX)]
    #[case::dxt5a(CrnFormat::Dxt5A)]
    fn unpacks_every_format(#[case] format: CrnFormat) {
        let builder = CrnBuilder::patterned(format, 24, 20, 0x1234);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        assert_eq!(unpacker.format(), format);
        assert_eq!(unpack_all_faces(&unpacker, 0, 0), builder.expected_level(0));
    }

    #[rstest]
    #[case::single_block(4, 4)]
    #[case::odd_blocks_x(12, 8)]
    #[case::odd_blocks_both(20, 12)]
    #[case::partial_pixels(13, 7)]
    #[case::tall(4, 36)]
    #[case::one_pixel(1, 1)]
    fn unpacks_odd_dimensions(#[case] width: u16, #[case] height: u16) {
        let seed = width as u32 * 31 + height as u32;
        let builder = CrnBuilder::patterned(CrnFormat::Dxt5, width, height, seed);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        assert_eq!(unpack_all_faces(&unpacker, 0, 0), builder.expected_level(0));
    }

    #[test]
    fn unpacks_every_mip_level() {
        let builder = CrnBuilder::patterned(CrnFormat::Dxt1, 40, 24, 99).with_mip_levels(6);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        for level in 0..6 {
            assert_eq!(
                unpack_all_faces(&unpacker, level, 0),
                builder.expected_level(level),
                "level {level}"
            );
        }
    }

    #[test]
    fn unpacks_cubemap_faces() {
        let builder = CrnBuilder::patterned(CrnFormat::DxnXY, 16, 16, 7).with_faces(6);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        let faces = unpack_all_faces(&unpacker, 0, 0);
        assert_eq!(faces.len(), 6);
        assert_eq!(faces, builder.expected_level(0));
        assert_ne!(faces[0], faces[1]);
    }

    #[rstest]
    #[case::single_tile(0)]
    #[case::horizontal_halves(1)]
    #[case::vertical_halves(2)]
    #[case::three_tiles_top(3)]
    #[case::three_tiles_bottom(4)]
    #[case::three_tiles_left(5)]
    #[case::three_tiles_right(6)]
    #[case::four_tiles(7)]
    fn unpacks_every_chunk_encoding(#[case] encoding: u8) {
        let mut builder = CrnBuilder::patterned(CrnFormat::Dxt5, 20, 20, 3 + encoding as u32);
        builder.chunk_encodings = vec![encoding];
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        assert_eq!(unpack_all_faces(&unpacker, 0, 0), builder.expected_level(0));
    }

    #[rstest]
    #[case::nine_chunks(CrnFormat::Dxt5, 20, 20, 1, 1)]
    #[case::odd_chunk_rows(CrnFormat::Dxt1, 28, 12, 1, 1)]
    #[case::per_level_reset(CrnFormat::Dxt1, 40, 24, 1, 4)]
    #[case::cubemap(CrnFormat::DxnXY, 12, 12, 6, 1)]
    #[case::cubemap_mips(CrnFormat::Dxt5A, 24, 24, 6, 3)]
    fn unpacks_mixed_chunk_encodings(
        #[case] format: CrnFormat,
        #[case] width: u16,
        #[case] height: u16,
        #[case] faces: u8,
        #[case] levels: usize,
    ) {
        let mut builder = CrnBuilder::patterned(format, width, height, 41)
            .with_faces(faces)
            .with_mip_levels(levels);
        // Not a multiple of 3, so every position in a symbol sees every encoding.
        builder.chunk_encodings = vec![1, 4, 6, 0, 7, 2, 5, 3];
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        for level in 0..levels as u32 {
            assert_eq!(
                unpack_all_faces(&unpacker, level, 0),
                builder.expected_level(level),
                "level {level}"
            );
        }
    }

    #[test]
    fn chunk_encoding_symbol_spans_faces() {
        // 2x2 chunks per face: the symbol read at chunk 3 covers chunk 3 of face 0
        // and chunks 0 and 1 of face 1.
        let mut builder = CrnBuilder::patterned(CrnFormat::Dxt5, 12, 12, 8).with_faces(6);
        builder.chunk_encodings = vec![0, 3, 7, 5, 1, 6, 2];
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        let info = unpacker.level_info(0).unwrap();
        assert_eq!((info.blocks_x, info.blocks_y), (3, 3));

        let faces = unpack_all_faces(&unpacker, 0, 0);
        assert_eq!(faces, builder.expected_level(0));

        // The encoding order decides which blocks share endpoints.
        let mut reversed = builder.clone();
        reversed.chunk_encodings = vec![5, 7, 3, 0, 2, 6, 1];
        assert_ne!(reversed.expected_level(0), faces);
    }

    #[rstest]
    #[case(CrnFormat::Dxt1)]
    #[case(CrnFormat::Dxt5)]
    #[case(CrnFormat::DxnYX)]
    #[case(CrnFormat::Dxt5A)]
    fn unpacks_with_mixed_code_lengths(#[case] format: CrnFormat) {
        let mut builder = CrnBuilder::patterned(format, 36, 28, 23).with_mip_levels(2);
        builder.chunk_encodings = vec![2, 7, 0, 5];
        let uniform = builder.build();
        builder.varied_code_lengths = true;
        let data = builder.build();
        assert_ne!(data, uniform);

        let unpacker = Unpacker::new(&data).unwrap();
        for level in 0..2 {
            assert_eq!(unpack_all_faces(&unpacker, level, 0), builder.expected_level(level));
        }
    }

    #[test]
    fn honours_row_pitch() {
        let builder = CrnBuilder::patterned(CrnFormat::Dxt1, 12, 8, 5);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();

        let packed = &builder.expected_level(0)[0];
        let padded = &unpack_all_faces(&unpacker, 0, 32)[0];
        let minimal = 3 * 8;
        for row in 0..2 {
            assert_eq!(
                &padded[row * 32..row * 32 + minimal],
                &packed[row * minimal..(row + 1) * minimal]
            );
            assert!(padded[row * 32 + minimal..(row + 1) * 32]
                .iter()
                .all(|&b| b == 0xCD));
        }
    }

    #[test]
    fn unpacker_can_be_shared_between_threads() {
        let builder = CrnBuilder::patterned(CrnFormat::Dxt5, 32, 32, 11).with_mip_levels(3);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|level| {
                    let unpacker = &unpacker;
                    scope.spawn(move || unpack_all_faces(unpacker, level, 0))
                })
                .collect();
            for (level, handle) in handles.into_iter().enumerate() {
                assert_eq!(handle.join().unwrap(), builder.expected_level(level as u32));
            }
        });
    }

    #[test]
    fn rejects_invalid_arguments() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        let unpacker = Unpacker::new(&data).unwrap();
        let mut face = vec![0u8; 32];

        assert_eq!(
            unpacker.unpack_level(&mut [&mut face[..]], 0, 1),
            Err(CrnDecompressError::InvalidLevelIndex {
                index: 1,
                levels: 1
            })
        );
        assert_eq!(
            unpacker.unpack_level(&mut [&mut face[..]], 6, 0),
            Err(CrnDecompressError::InvalidRowPitch {
                pitch: 6,
                minimum: 16
            })
        );
        assert_eq!(
            unpacker.unpack_level(&mut [&mut face[..16]], 20, 0),
            Err(CrnDecompressError::DestinationTooSmall {
                needed: 40,
                actual: 16
            })
        );
        assert_eq!(
            unpacker.unpack_level(&mut [], 0, 0),
            Err(CrnDecompressError::FaceCountMismatch {
                expected: 1,
                actual: 0
            })
        );
    }

    #[rstest]
    #[case(CrnFormat::Dxt3)]
    #[case(CrnFormat::Etc1)]
    fn unsupported_formats_fail_to_unpack(#[case] format: CrnFormat) {
        let data = CrnBuilder::solid(format, 8, 8).build();
        let unpacker = Unpacker::new(&data).unwrap();
        let mut face = vec![0u8; 64];
        assert_eq!(
            unpacker.unpack_level(&mut [&mut face[..]], 0, 0),
            Err(CrnDecompressError::UnsupportedFormat(format as u32))
        );
    }

    #[test]
    fn rejects_missing_endpoint_palettes() {
        let mut builder = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8);
        builder.color_endpoints.clear();
        let data = builder.build();
        assert_eq!(
            Unpacker::new(&data).unwrap_err(),
            CrnDecompressError::InvalidHeader("no endpoint palettes")
        );
    }

    #[test]
    fn rejects_format_without_its_palettes() {
        // Colour palettes only, but DXT5 also needs alpha.
        let mut builder = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8);
        builder.format = CrnFormat::Dxt5;
        let data = builder.build();
        assert_eq!(
            Unpacker::new(&data).unwrap_err(),
            CrnDecompressError::InvalidHeader("missing alpha palettes")
        );
    }

    #[test]
    fn corrupt_level_data_is_an_error_not_a_panic() {
        let builder = CrnBuilder::patterned(CrnFormat::Dxt5, 32, 32, 17);
        let data = builder.build();
        let header = CrnHeader::parse(&data).unwrap();
        let level_start = header.level_offsets[0] as usize;

        // Flip bits through the level and make sure nothing panics.
        for offset in level_start..data.len() {
            let mut corrupted = data.clone();
            corrupted[offset] ^= 0xA5;
            let unpacker = Unpacker::new(&corrupted).unwrap();
            let mut face = vec![0u8; 8 * 8 * 16];
            let _ = unpacker.unpack_level(&mut [&mut face[..]], 0, 0);
        }
    }

    #[test]
    fn out_of_range_palette_index_is_reported() {
        // Endpoint delta model with more symbols than palette entries.
        let mut builder = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8);
        builder.endpoint_delta_syms = Some(4);
        builder.first_endpoint_delta = Some(3);
        let data = builder.build();
        let unpacker = Unpacker::new(&data).unwrap();
        let mut face = vec![0u8; 32];
        assert_eq!(
            unpacker.unpack_level(&mut [&mut face[..]], 0, 0),
            Err(CrnDecompressError::PaletteIndexOutOfRange { index: 2, size: 1 })
        );
    }

    #[test]
    fn rejects_truncated_tables() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        let mut broken = data.clone();
        // Point the tables past the end of the file.
        let ofs = (data.len() as u32).to_be_bytes();
        broken[67..70].copy_from_slice(&ofs[1..]);
        assert_eq!(
            Unpacker::new(&broken).unwrap_err(),
            CrnDecompressError::InvalidHeader("tables out of range")
        );
    }
}
