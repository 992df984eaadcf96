//! Texture formats a CRN file can decode to.

use derive_enum_all_values::AllValues;

/// Value used for an unknown/unset format at the C boundary.
pub const CRN_FORMAT_INVALID: u32 = 0xFFFF_FFFF;

/// Builds a little endian FourCC code.
const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

/// The DXT format stored in a CRN file.
///
/// The discriminants match the format tag in the file header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
#[repr(u32)]
pub enum CrnFormat {
    /// DXT1 (BC1), 8 bytes per block.
    Dxt1 = 0,
    /// DXT3 (BC2). Can be described, but not unpacked.
    Dxt3 = 1,
    /// DXT5 (BC3).
    Dxt5 = 2,
    /// DXT5 with a YCoCg colour space swizzle.
    Dxt5CCxY = 3,
    /// DXT5 with a swizzled normal map (green in colour, red in alpha).
    Dxt5xGxR = 4,
    /// DXT5 with red moved to alpha.
    Dxt5xGBR = 5,
    /// DXT5 with alpha moved to red.
    Dxt5AGBR = 6,
    /// DXN with X in the first block and Y in the second.
    DxnXY = 7,
    /// DXN with Y in the first block and X in the second.
    DxnYX = 8,
    /// DXT5A (BC4), a single alpha block.
    Dxt5A = 9,
    /// ETC1. Can be described, but not unpacked.
    Etc1 = 10,
}

impl CrnFormat {
    /// Converts the raw format tag from a header or the C API.
    ///
    /// # Returns
    ///
    /// [`None`] for unknown tags (including [`CRN_FORMAT_INVALID`]).
    #[inline]
    pub const fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0 => CrnFormat::Dxt1,
            1 => CrnFormat::Dxt3,
            2 => CrnFormat::Dxt5,
            3 => CrnFormat::Dxt5CCxY,
            4 => CrnFormat::Dxt5xGxR,
            5 => CrnFormat::Dxt5xGBR,
            6 => CrnFormat::Dxt5AGBR,
            7 => CrnFormat::DxnXY,
            8 => CrnFormat::DxnYX,
            9 => CrnFormat::Dxt5A,
            10 => CrnFormat::Etc1,
            _ => return None,
        })
    }

    /// Bytes per 4x4 block: 8 for DXT1, DXT5A and ETC1, 16 for the rest.
    #[inline]
    pub const fn bytes_per_block(self) -> u32 {
        match self {
            CrnFormat::Dxt1 | CrnFormat::Dxt5A | CrnFormat::Etc1 => 8,
            _ => 16,
        }
    }

    /// The DDS FourCC used to store this format.
    pub const fn fourcc(self) -> u32 {
        match self {
            CrnFormat::Dxt1 => fourcc(b"DXT1"),
            CrnFormat::Dxt3 => fourcc(b"DXT3"),
            CrnFormat::Dxt5 => fourcc(b"DXT5"),
            CrnFormat::Dxt5CCxY => fourcc(b"CCxY"),
            CrnFormat::Dxt5xGxR => fourcc(b"xGxR"),
            CrnFormat::Dxt5xGBR => fourcc(b"xGBR"),
            CrnFormat::Dxt5AGBR => fourcc(b"AGBR"),
            CrnFormat::DxnXY => fourcc(b"A2XY"),
            CrnFormat::DxnYX => fourcc(b"ATI2"),
            CrnFormat::Dxt5A => fourcc(b"ATI1"),
            CrnFormat::Etc1 => fourcc(b"ETC1"),
        }
    }

    /// Whether [`Unpacker::unpack_level`](crate::Unpacker::unpack_level) supports this format.
    #[inline]
    pub const fn can_unpack(self) -> bool {
        !matches!(self, CrnFormat::Dxt3 | CrnFormat::Etc1)
    }

    /// Whether blocks of this format carry a DXT1 style colour block.
    #[inline]
    pub const fn has_color_block(self) -> bool {
        matches!(
            self,
            CrnFormat::Dxt1
                | CrnFormat::Dxt5
                | CrnFormat::Dxt5CCxY
                | CrnFormat::Dxt5xGxR
                | CrnFormat::Dxt5xGBR
                | CrnFormat::Dxt5AGBR
        )
    }

    /// Number of DXT5 style alpha blocks per block of this format.
    #[inline]
    pub const fn alpha_block_count(self) -> u32 {
        match self {
            CrnFormat::Dxt1 | CrnFormat::Dxt3 | CrnFormat::Etc1 => 0,
            CrnFormat::DxnXY | CrnFormat::DxnYX => 2,
            _ => 1,
        }
    }

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            CrnFormat::Dxt1 => "DXT1",
            CrnFormat::Dxt3 => "DXT3",
            CrnFormat::Dxt5 => "DXT5",
            CrnFormat::Dxt5CCxY => "DXT5_CCxY",
            CrnFormat::Dxt5xGxR => "DXT5_xGxR",
            CrnFormat::Dxt5xGBR => "DXT5_xGBR",
            CrnFormat::Dxt5AGBR => "DXT5_AGBR",
            CrnFormat::DxnXY => "DXN_XY",
            CrnFormat::DxnYX => "DXN_YX",
            CrnFormat::Dxt5A => "DXT5A",
            CrnFormat::Etc1 => "ETC1",
        }
    }
}

impl core::fmt::Display for CrnFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
