//! Header level queries: texture info, level info and full file validation.

use crate::error::CrnDecompressError;
use crate::format::CrnFormat;
use crate::header::{CrnHeader, CRN_HEADER_MIN_SIZE, CRN_MAX_LEVELS};

/// Description of the whole texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width of the top level in pixels.
    pub width: u32,
    /// Height of the top level in pixels.
    pub height: u32,
    /// Number of mip levels.
    pub levels: u32,
    /// Number of faces; 6 for cubemaps.
    pub faces: u32,
    /// Bytes per DXT block.
    pub bytes_per_block: u32,
    /// User data value 0.
    pub userdata0: u32,
    /// User data value 1.
    pub userdata1: u32,
    /// The DXT format the texture unpacks to.
    pub format: CrnFormat,
}

impl TextureInfo {
    /// Builds the texture info from a parsed header.
    pub fn from_header(header: &CrnHeader) -> Result<Self, CrnDecompressError> {
        let format = header.crn_format()?;
        Ok(Self {
            width: header.width as u32,
            height: header.height as u32,
            levels: header.levels as u32,
            faces: header.faces as u32,
            bytes_per_block: format.bytes_per_block(),
            userdata0: header.userdata0,
            userdata1: header.userdata1,
            format,
        })
    }
}

/// Description of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    /// Width in pixels, at least 1.
    pub width: u32,
    /// Height in pixels, at least 1.
    pub height: u32,
    /// Number of faces.
    pub faces: u32,
    /// Number of blocks per row.
    pub blocks_x: u32,
    /// Number of block rows.
    pub blocks_y: u32,
    /// Bytes per DXT block.
    pub bytes_per_block: u32,
    /// The DXT format the level unpacks to.
    pub format: CrnFormat,
}

impl LevelInfo {
    /// Builds the info of level `level_index` from a parsed header.
    pub fn from_header(header: &CrnHeader, level_index: u32) -> Result<Self, CrnDecompressError> {
        let levels = header.levels as u32;
        if level_index >= levels {
            return Err(CrnDecompressError::InvalidLevelIndex {
                index: level_index,
                levels,
            });
        }
        let format = header.crn_format()?;
        let width = (header.width as u32 >> level_index).max(1);
        let height = (header.height as u32 >> level_index).max(1);

        Ok(Self {
            width,
            height,
            faces: header.faces as u32,
            blocks_x: width.div_ceil(4),
            blocks_y: height.div_ceil(4),
            bytes_per_block: format.bytes_per_block(),
            format,
        })
    }

    /// Tightly packed row pitch in bytes.
    #[inline]
    pub fn row_pitch(&self) -> u32 {
        self.blocks_x * self.bytes_per_block
    }

    /// Size of one face of this level in bytes, tightly packed.
    #[inline]
    pub fn face_size(&self) -> usize {
        self.row_pitch() as usize * self.blocks_y as usize
    }
}

/// Layout summary of a validated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileInfo {
    /// File size declared in the header.
    pub actual_data_size: u32,
    /// Header size in bytes.
    pub header_size: u32,
    /// Combined size of the four compressed palettes.
    pub total_palette_size: u32,
    /// Size of the Huffman tables.
    pub tables_size: u32,
    /// Number of levels.
    pub levels: u32,
    /// Compressed size of each level; entries past `levels` are 0.
    pub level_compressed_size: [u32; CRN_MAX_LEVELS],
    /// Entries in the colour endpoint palette.
    pub color_endpoint_palette_entries: u32,
    /// Entries in the colour selector palette.
    pub color_selector_palette_entries: u32,
    /// Entries in the alpha endpoint palette.
    pub alpha_endpoint_palette_entries: u32,
    /// Entries in the alpha selector palette.
    pub alpha_selector_palette_entries: u32,
}

/// Reads the texture description from the header.
///
/// Checksums are not verified; use [`validate_file`] for that.
///
/// # Examples
///
/// ```ignore
/// let info = crn_decompress::get_texture_info(&crn_bytes)?;
/// println!("{}x{} {} ({} levels)", info.width, info.height, info.format, info.levels);
/// ```
pub fn get_texture_info(data: &[u8]) -> Result<TextureInfo, CrnDecompressError> {
    TextureInfo::from_header(&CrnHeader::parse(data)?)
}

/// Reads the description of level `level_index` from the header.
pub fn get_level_info(data: &[u8], level_index: u32) -> Result<LevelInfo, CrnDecompressError> {
    LevelInfo::from_header(&CrnHeader::parse(data)?, level_index)
}

/// Fully validates a file: header, both checksums, limits and level offsets.
pub fn validate_file(data: &[u8]) -> Result<FileInfo, CrnDecompressError> {
    if data.len() < CRN_HEADER_MIN_SIZE {
        return Err(CrnDecompressError::DataTooSmall {
            needed: CRN_HEADER_MIN_SIZE,
            actual: data.len(),
        });
    }
    let header = CrnHeader::parse(data)?;

    let computed = header.compute_header_crc16(data);
    if computed != header.header_crc16 {
        return Err(CrnDecompressError::HeaderCrcMismatch {
            stored: header.header_crc16,
            computed,
        });
    }
    let computed = header.compute_data_crc16(data);
    if computed != header.data_crc16 {
        return Err(CrnDecompressError::DataCrcMismatch {
            stored: header.data_crc16,
            computed,
        });
    }

    header.check_limits()?;

    let mut level_compressed_size = [0u32; CRN_MAX_LEVELS];
    for (level, size) in level_compressed_size
        .iter_mut()
        .take(header.levels as usize)
        .enumerate()
    {
        *size = header.level_range(level as u32, header.data_size as usize)?.len() as u32;
    }

    Ok(FileInfo {
        actual_data_size: header.data_size,
        header_size: header.header_size as u32,
        total_palette_size: header.color_endpoints.size
            + header.color_selectors.size
            + header.alpha_endpoints.size
            + header.alpha_selectors.size,
        tables_size: header.tables_size as u32,
        levels: header.levels as u32,
        level_compressed_size,
        color_endpoint_palette_entries: header.color_endpoints.num as u32,
        color_selector_palette_entries: header.color_selectors.num as u32,
        alpha_endpoint_palette_entries: header.alpha_endpoints.num as u32,
        alpha_selector_palette_entries: header.alpha_selectors.num as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;
    use rstest::rstest;

    #[test]
    fn texture_info_reflects_header() {
        let mut builder = CrnBuilder::solid(CrnFormat::Dxt5, 64, 32).with_mip_levels(4);
        builder.userdata0 = 0xDEAD_BEEF;
        builder.userdata1 = 7;
        let data = builder.build();

        let info = get_texture_info(&data).unwrap();
        assert_eq!(
            info,
            TextureInfo {
                width: 64,
                height: 32,
                levels: 4,
                faces: 1,
                bytes_per_block: 16,
                userdata0: 0xDEAD_BEEF,
                userdata1: 7,
                format: CrnFormat::Dxt5,
            }
        );
    }

    #[test]
    fn texture_info_does_not_check_crc() {
        let mut data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        data[4] ^= 0xFF;
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        assert!(get_texture_info(&data).is_ok());
        assert!(validate_file(&data).is_err());
    }

    #[rstest]
    #[case::level_0(0, 37, 21, 10, 6)]
    #[case::level_1(1, 18, 10, 5, 3)]
    #[case::level_2(2, 9, 5, 3, 2)]
    #[case::level_5(5, 1, 1, 1, 1)]
    fn level_info_dimensions(
        #[case] level: u32,
        #[case] width: u32,
        #[case] height: u32,
        #[case] blocks_x: u32,
        #[case] blocks_y: u32,
    ) {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 37, 21)
            .with_mip_levels(6)
            .build();
        let info = get_level_info(&data, level).unwrap();
        assert_eq!((info.width, info.height), (width, height));
        assert_eq!((info.blocks_x, info.blocks_y), (blocks_x, blocks_y));
        assert_eq!(info.bytes_per_block, 8);
        assert_eq!(info.face_size(), (blocks_x * blocks_y * 8) as usize);
    }

    #[test]
    fn level_info_rejects_missing_level() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        assert_eq!(
            get_level_info(&data, 1),
            Err(CrnDecompressError::InvalidLevelIndex {
                index: 1,
                levels: 1
            })
        );
    }

    #[test]
    fn validate_reports_layout() {
        let data = CrnBuilder::solid(CrnFormat::Dxt5, 16, 16)
            .with_mip_levels(3)
            .build();
        let header = CrnHeader::parse(&data).unwrap();
        let info = validate_file(&data).unwrap();

        assert_eq!(info.actual_data_size as usize, data.len());
        assert_eq!(info.header_size, header.header_size as u32);
        assert_eq!(info.levels, 3);
        assert_eq!(info.tables_size, header.tables_size as u32);
        assert_eq!(info.color_endpoint_palette_entries, 1);
        assert_eq!(info.alpha_selector_palette_entries, 1);
        let levels_total: u32 = info.level_compressed_size.iter().sum();
        assert_eq!(
            info.header_size + info.tables_size + info.total_palette_size + levels_total,
            info.actual_data_size
        );
        assert_eq!(info.level_compressed_size[3], 0);
    }

    #[test]
    fn validate_detects_header_corruption() {
        let mut data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        data[25] ^= 1; // userdata0
        assert!(matches!(
            validate_file(&data),
            Err(CrnDecompressError::HeaderCrcMismatch { .. })
        ));
    }

    #[test]
    fn validate_detects_data_corruption() {
        let mut data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        let last = data.len() - 1;
        data[last] ^= 0x80;
        assert!(matches!(
            validate_file(&data),
            Err(CrnDecompressError::DataCrcMismatch { .. })
        ));
    }

    #[test]
    fn validate_checks_limits_after_crc() {
        let mut data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        data[17] = 3; // faces
        rewrite_checksums(&mut data);
        assert!(matches!(
            validate_file(&data),
            Err(CrnDecompressError::InvalidHeader(_))
        ));
    }
}
