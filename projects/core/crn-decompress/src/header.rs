//! The CRN file header.
//!
//! All multi-byte fields are big endian and unaligned:
//!
//! ```text
//! 0   sig 'Hx'        2   header_size     4   header_crc16    6   data_size (u32)
//! 10  data_crc16      12  width           14  height          16  levels (u8)
//! 17  faces (u8)      18  format (u8)     19  flags           21  reserved (u32)
//! 25  userdata0       29  userdata1       33  4 palettes (ofs:3, size:3, num:2)
//! 65  tables_size     67  tables_ofs (u24) 70 level_ofs (u32 * levels)
//! ```

use crate::crc16::crc16;
use crate::error::CrnDecompressError;
use crate::format::CrnFormat;

/// Signature at the start of every CRN file, `"Hx"`.
pub const CRN_SIGNATURE: u16 = 0x4878;
/// Size of the header without the level offsets.
pub const CRN_HEADER_FIXED_SIZE: usize = 70;
/// Smallest valid header, with a single level offset.
pub const CRN_HEADER_MIN_SIZE: usize = CRN_HEADER_FIXED_SIZE + 4;
/// Maximum number of mip levels.
pub const CRN_MAX_LEVELS: usize = 16;
/// Maximum width/height of the top level.
pub const CRN_MAX_LEVEL_RESOLUTION: u32 = 4096;
/// Header flag: the file is segmented.
pub const CRN_FLAG_SEGMENTED: u16 = 1;

/// Location and entry count of one palette inside the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrnPalette {
    /// Offset of the compressed palette from the start of the file.
    pub offset: u32,
    /// Size of the compressed palette in bytes.
    pub size: u32,
    /// Number of entries.
    pub num: u16,
}

impl CrnPalette {
    fn read(bytes: &[u8]) -> Self {
        Self {
            offset: read_be(&bytes[0..3]),
            size: read_be(&bytes[3..6]),
            num: read_be(&bytes[6..8]) as u16,
        }
    }

    /// Byte range of the compressed palette.
    #[inline]
    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.size as usize
    }
}

/// A parsed CRN header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrnHeader {
    /// Size of the header in bytes.
    pub header_size: u16,
    /// CRC-16 of bytes `6..header_size`.
    pub header_crc16: u16,
    /// Size of the whole file in bytes.
    pub data_size: u32,
    /// CRC-16 of bytes `header_size..data_size`.
    pub data_crc16: u16,
    /// Width of the top level in pixels.
    pub width: u16,
    /// Height of the top level in pixels.
    pub height: u16,
    /// Number of mip levels.
    pub levels: u8,
    /// Number of faces; 1, or 6 for cubemaps.
    pub faces: u8,
    /// Raw format tag, see [`CrnFormat`].
    pub format: u8,
    /// Header flags, see [`CRN_FLAG_SEGMENTED`].
    pub flags: u16,
    /// User data value 0.
    pub userdata0: u32,
    /// User data value 1.
    pub userdata1: u32,
    /// Colour endpoint palette.
    pub color_endpoints: CrnPalette,
    /// Colour selector palette.
    pub color_selectors: CrnPalette,
    /// Alpha endpoint palette.
    pub alpha_endpoints: CrnPalette,
    /// Alpha selector palette.
    pub alpha_selectors: CrnPalette,
    /// Size of the Huffman tables in bytes.
    pub tables_size: u16,
    /// Offset of the Huffman tables from the start of the file.
    pub tables_offset: u32,
    /// Offsets of the compressed levels, only the first `levels` are used.
    pub level_offsets: [u32; CRN_MAX_LEVELS],
}

#[inline]
fn read_be(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

impl CrnHeader {
    /// Parses the header at the start of `data`.
    ///
    /// Checks the signature, that the declared header size fits the level offsets,
    /// and that `data` is at least as large as the declared file size.
    /// Checksums and texture limits are not verified, see [`validate_file`](crate::validate_file)
    /// and [`CrnHeader::check_limits`].
    pub fn parse(data: &[u8]) -> Result<Self, CrnDecompressError> {
        if data.len() < CRN_HEADER_MIN_SIZE {
            return Err(CrnDecompressError::DataTooSmall {
                needed: CRN_HEADER_MIN_SIZE,
                actual: data.len(),
            });
        }

        let signature = read_be(&data[0..2]) as u16;
        if signature != CRN_SIGNATURE {
            return Err(CrnDecompressError::InvalidSignature(signature));
        }

        let header_size = read_be(&data[2..4]) as u16;
        if (header_size as usize) < CRN_HEADER_MIN_SIZE {
            return Err(CrnDecompressError::InvalidHeader(
                "header size below minimum",
            ));
        }

        let data_size = read_be(&data[6..10]);
        if data.len() < data_size as usize {
            return Err(CrnDecompressError::DataTooSmall {
                needed: data_size as usize,
                actual: data.len(),
            });
        }
        if data.len() < header_size as usize {
            return Err(CrnDecompressError::DataTooSmall {
                needed: header_size as usize,
                actual: data.len(),
            });
        }

        let levels = data[16];
        if levels as usize > CRN_MAX_LEVELS {
            return Err(CrnDecompressError::InvalidHeader("too many levels"));
        }
        if (header_size as usize) < CRN_HEADER_FIXED_SIZE + 4 * levels as usize {
            return Err(CrnDecompressError::InvalidHeader(
                "header too small for its level offsets",
            ));
        }

        let mut level_offsets = [0u32; CRN_MAX_LEVELS];
        for (x, offset) in level_offsets.iter_mut().take(levels as usize).enumerate() {
            let start = CRN_HEADER_FIXED_SIZE + x * 4;
            *offset = read_be(&data[start..start + 4]);
        }

        Ok(Self {
            header_size,
            header_crc16: read_be(&data[4..6]) as u16,
            data_size,
            data_crc16: read_be(&data[10..12]) as u16,
            width: read_be(&data[12..14]) as u16,
            height: read_be(&data[14..16]) as u16,
            levels,
            faces: data[17],
            format: data[18],
            flags: read_be(&data[19..21]) as u16,
            userdata0: read_be(&data[25..29]),
            userdata1: read_be(&data[29..33]),
            color_endpoints: CrnPalette::read(&data[33..41]),
            color_selectors: CrnPalette::read(&data[41..49]),
            alpha_endpoints: CrnPalette::read(&data[49..57]),
            alpha_selectors: CrnPalette::read(&data[57..65]),
            tables_size: read_be(&data[65..67]) as u16,
            tables_offset: read_be(&data[67..70]),
            level_offsets,
        })
    }

    /// The texture format, or [`CrnDecompressError::UnsupportedFormat`] for unknown tags.
    #[inline]
    pub fn crn_format(&self) -> Result<CrnFormat, CrnDecompressError> {
        CrnFormat::from_raw(self.format as u32)
            .ok_or(CrnDecompressError::UnsupportedFormat(self.format as u32))
    }

    /// Whether the file is segmented.
    #[inline]
    pub fn is_segmented(&self) -> bool {
        self.flags & CRN_FLAG_SEGMENTED != 0
    }

    /// Checks the face count, dimensions, level count and format against their limits.
    pub fn check_limits(&self) -> Result<(), CrnDecompressError> {
        if self.faces != 1 && self.faces != 6 {
            return Err(CrnDecompressError::InvalidHeader(
                "face count must be 1 or 6",
            ));
        }
        let (width, height) = (self.width as u32, self.height as u32);
        if !(1..=CRN_MAX_LEVEL_RESOLUTION).contains(&width)
            || !(1..=CRN_MAX_LEVEL_RESOLUTION).contains(&height)
        {
            return Err(CrnDecompressError::InvalidHeader("dimensions out of range"));
        }
        if self.levels < 1 || self.levels as u32 > compute_max_mips(width, height) {
            return Err(CrnDecompressError::InvalidHeader(
                "level count out of range",
            ));
        }
        self.crn_format()?;
        Ok(())
    }

    /// Byte range of a compressed level.
    ///
    /// A level runs up to the next level's offset; the last level runs to the end of the file.
    pub fn level_range(
        &self,
        level_index: u32,
        data_len: usize,
    ) -> Result<core::ops::Range<usize>, CrnDecompressError> {
        let levels = self.levels as u32;
        if level_index >= levels {
            return Err(CrnDecompressError::InvalidLevelIndex {
                index: level_index,
                levels,
            });
        }
        let start = self.level_offsets[level_index as usize] as usize;
        let end = if level_index + 1 < levels {
            self.level_offsets[level_index as usize + 1] as usize
        } else {
            data_len
        };
        if start < self.header_size as usize || start >= end || end > data_len {
            return Err(CrnDecompressError::InvalidHeader(
                "level offset out of range",
            ));
        }
        Ok(start..end)
    }

    /// Computes the header CRC-16 over bytes `6..header_size` of `data`.
    pub fn compute_header_crc16(&self, data: &[u8]) -> u16 {
        crc16(&data[6..self.header_size as usize], 0)
    }

    /// Computes the data CRC-16 over bytes `header_size..data_size` of `data`.
    pub fn compute_data_crc16(&self, data: &[u8]) -> u16 {
        let start = (self.header_size as usize).min(self.data_size as usize);
        crc16(&data[start..self.data_size as usize], 0)
    }
}

/// Number of levels in a full mip chain for the given dimensions.
///
/// Halves both dimensions until they reach 1, counting the top level.
pub fn compute_max_mips(width: u32, height: u32) -> u32 {
    let (mut width, mut height) = (width, height);
    let mut levels = 1;
    while width > 1 || height > 1 {
        width >>= 1;
        height >>= 1;
        levels += 1;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;
    use rstest::rstest;

    fn dxt1_file() -> Vec<u8> {
        CrnBuilder::solid(CrnFormat::Dxt1, 16, 8).build()
    }

    #[test]
    fn parses_builder_output() {
        let data = dxt1_file();
        let header = CrnHeader::parse(&data).unwrap();
        assert_eq!(header.width, 16);
        assert_eq!(header.height, 8);
        assert_eq!(header.levels, 1);
        assert_eq!(header.faces, 1);
        assert_eq!(header.crn_format(), Ok(CrnFormat::Dxt1));
        assert_eq!(header.data_size as usize, data.len());
        assert_eq!(header.header_size as usize, CRN_HEADER_MIN_SIZE);
        assert!(header.check_limits().is_ok());
    }

    #[test]
    fn rejects_truncated_header() {
        let data = dxt1_file();
        assert_eq!(
            CrnHeader::parse(&data[..CRN_HEADER_MIN_SIZE - 1]),
            Err(CrnDecompressError::DataTooSmall {
                needed: CRN_HEADER_MIN_SIZE,
                actual: CRN_HEADER_MIN_SIZE - 1
            })
        );
    }

    #[test]
    fn rejects_truncated_data() {
        let data = dxt1_file();
        let truncated = &data[..data.len() - 1];
        assert_eq!(
            CrnHeader::parse(truncated),
            Err(CrnDecompressError::DataTooSmall {
                needed: data.len(),
                actual: data.len() - 1
            })
        );
    }

    #[test]
    fn rejects_bad_signature() {
        let mut data = dxt1_file();
        data[0] = b'X';
        assert_eq!(
            CrnHeader::parse(&data),
            Err(CrnDecompressError::InvalidSignature(0x5878))
        );
    }

    #[test]
    fn rejects_small_header_size() {
        let mut data = dxt1_file();
        data[2..4].copy_from_slice(&(CRN_HEADER_MIN_SIZE as u16 - 1).to_be_bytes());
        assert!(matches!(
            CrnHeader::parse(&data),
            Err(CrnDecompressError::InvalidHeader(_))
        ));
    }

    #[rstest]
    #[case::faces_zero(17, 0)]
    #[case::faces_two(17, 2)]
    #[case::levels_zero(16, 0)]
    #[case::format_unknown(18, 11)]
    fn check_limits_rejects(#[case] offset: usize, #[case] value: u8) {
        let mut data = dxt1_file();
        data[offset] = value;
        let header = CrnHeader::parse(&data).unwrap();
        assert!(header.check_limits().is_err());
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(2, 1, 2)]
    #[case(4, 4, 3)]
    #[case(5, 3, 3)]
    #[case(256, 64, 9)]
    #[case(4096, 4096, 13)]
    fn max_mips(#[case] width: u32, #[case] height: u32, #[case] expected: u32) {
        assert_eq!(compute_max_mips(width, height), expected);
    }

    #[test]
    fn level_ranges_cover_file() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 16, 16)
            .with_mip_levels(3)
            .build();
        let header = CrnHeader::parse(&data).unwrap();
        let ranges: Vec<_> = (0..3)
            .map(|level| header.level_range(level, data.len()).unwrap())
            .collect();
        assert_eq!(ranges[0].end, ranges[1].start);
        assert_eq!(ranges[1].end, ranges[2].start);
        assert_eq!(ranges[2].end, data.len());
        assert_eq!(
            header.level_range(3, data.len()),
            Err(CrnDecompressError::InvalidLevelIndex {
                index: 3,
                levels: 3
            })
        );
    }

    #[test]
    fn stored_checksums_match() {
        let data = dxt1_file();
        let header = CrnHeader::parse(&data).unwrap();
        assert_eq!(header.compute_header_crc16(&data), header.header_crc16);
        assert_eq!(header.compute_data_crc16(&data), header.data_crc16);
    }
}
