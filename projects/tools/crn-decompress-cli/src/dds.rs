//! Minimal DDS writer for unpacked CRN levels.
//!
//! Output is a legacy (non DX10) DDS header followed by the level data,
//! ordered face by face, each face holding its full mip chain.

use crn_decompress_api::{LevelInfo, TextureInfo};
use endian_writer::{EndianWriter, LittleEndianWriter};

pub(crate) const DDS_MAGIC: u32 = 0x44445320_u32.to_be();
pub(crate) const DDS_HEADER_SIZE: usize = 0x80;
/// Value of the `dwSize` field: the header without the magic.
pub(crate) const DDS_HEADER_STRUCT_SIZE: u32 = 124;
pub(crate) const DDS_PIXELFORMAT_STRUCT_SIZE: u32 = 32;

pub(crate) const DDS_SIZE_OFFSET: usize = 0x04;
pub(crate) const DDS_FLAGS_OFFSET: usize = 0x08;
pub(crate) const DDS_HEIGHT_OFFSET: usize = 0x0C;
pub(crate) const DDS_WIDTH_OFFSET: usize = 0x10;
pub(crate) const DDS_LINEAR_SIZE_OFFSET: usize = 0x14;
pub(crate) const DDS_MIPMAP_COUNT_OFFSET: usize = 0x1C;
pub(crate) const DDS_PIXELFORMAT_SIZE_OFFSET: usize = 0x4C;
pub(crate) const DDS_PIXELFORMAT_FLAGS_OFFSET: usize = 0x50;
pub(crate) const DDS_FOURCC_OFFSET: usize = 0x54;
pub(crate) const DDS_CAPS_OFFSET: usize = 0x6C;
pub(crate) const DDS_CAPS2_OFFSET: usize = 0x70;

pub(crate) const DDSD_CAPS: u32 = 0x1;
pub(crate) const DDSD_HEIGHT: u32 = 0x2;
pub(crate) const DDSD_WIDTH: u32 = 0x4;
pub(crate) const DDSD_PIXELFORMAT: u32 = 0x1000;
pub(crate) const DDSD_MIPMAPCOUNT: u32 = 0x20000;
pub(crate) const DDSD_LINEARSIZE: u32 = 0x80000;

pub(crate) const DDPF_FOURCC: u32 = 0x4;

pub(crate) const DDSCAPS_COMPLEX: u32 = 0x8;
pub(crate) const DDSCAPS_TEXTURE: u32 = 0x1000;
pub(crate) const DDSCAPS_MIPMAP: u32 = 0x400000;

/// Cubemap flag plus all six face flags.
pub(crate) const DDSCAPS2_CUBEMAP_ALL_FACES: u32 = 0xFE00;

/// Byte layout of a texture once written as DDS.
#[derive(Debug, Clone)]
pub struct DdsLayout {
    /// Info of every level, top level first.
    pub levels: Vec<LevelInfo>,
    /// Number of faces.
    pub faces: usize,
}

impl DdsLayout {
    pub fn new(levels: Vec<LevelInfo>, faces: u32) -> Self {
        Self {
            levels,
            faces: faces as usize,
        }
    }

    /// Bytes taken by one face and all of its mips.
    pub fn face_stride(&self) -> usize {
        self.levels.iter().map(LevelInfo::face_size).sum()
    }

    /// Size of the whole file, header included.
    pub fn file_size(&self) -> usize {
        DDS_HEADER_SIZE + self.face_stride() * self.faces
    }

    /// Splits the data section of a DDS file into per level destinations,
    /// each holding one slice per face, as [`CrunchedData::decode_level_into`] expects.
    ///
    /// [`CrunchedData::decode_level_into`]: crn_decompress_api::CrunchedData::decode_level_into
    pub fn split_levels<'a>(&self, body: &'a mut [u8]) -> Vec<Vec<&'a mut [u8]>> {
        let mut by_level: Vec<Vec<&'a mut [u8]>> = (0..self.levels.len())
            .map(|_| Vec::with_capacity(self.faces))
            .collect();

        let stride = self.face_stride();
        if stride == 0 {
            return by_level;
        }
        for mut face in body.chunks_exact_mut(stride).take(self.faces) {
            for (info, level) in self.levels.iter().zip(by_level.iter_mut()) {
                let (data, rest) = core::mem::take(&mut face).split_at_mut(info.face_size());
                level.push(data);
                face = rest;
            }
        }
        by_level
    }
}

/// Writes the DDS header for `texture` into the first [`DDS_HEADER_SIZE`] bytes of `dst`.
///
/// # Panics
///
/// If `dst` is shorter than [`DDS_HEADER_SIZE`].
pub fn write_dds_header(dst: &mut [u8], texture: &TextureInfo, layout: &DdsLayout) {
    let header = &mut dst[..DDS_HEADER_SIZE];
    header.fill(0);

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE;
    let mut caps = DDSCAPS_TEXTURE;
    if texture.levels > 1 {
        flags |= DDSD_MIPMAPCOUNT;
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }
    let caps2 = if texture.faces == 6 {
        caps |= DDSCAPS_COMPLEX;
        DDSCAPS2_CUBEMAP_ALL_FACES
    } else {
        0
    };
    let linear_size = layout.levels.first().map_or(0, LevelInfo::face_size) as u32;

    // SAFETY: every offset below is within the DDS_HEADER_SIZE bytes of `header`.
    unsafe {
        let mut writer = LittleEndianWriter::new(header.as_mut_ptr());
        writer.write_u32_at(DDS_MAGIC, 0);
        writer.write_u32_at(DDS_HEADER_STRUCT_SIZE, DDS_SIZE_OFFSET as isize);
        writer.write_u32_at(flags, DDS_FLAGS_OFFSET as isize);
        writer.write_u32_at(texture.height, DDS_HEIGHT_OFFSET as isize);
        writer.write_u32_at(texture.width, DDS_WIDTH_OFFSET as isize);
        writer.write_u32_at(linear_size, DDS_LINEAR_SIZE_OFFSET as isize);
        writer.write_u32_at(texture.levels, DDS_MIPMAP_COUNT_OFFSET as isize);
        writer.write_u32_at(
            DDS_PIXELFORMAT_STRUCT_SIZE,
            DDS_PIXELFORMAT_SIZE_OFFSET as isize,
        );
        writer.write_u32_at(DDPF_FOURCC, DDS_PIXELFORMAT_FLAGS_OFFSET as isize);
        writer.write_u32_at(texture.format.fourcc(), DDS_FOURCC_OFFSET as isize);
        writer.write_u32_at(caps, DDS_CAPS_OFFSET as isize);
        writer.write_u32_at(caps2, DDS_CAPS2_OFFSET as isize);
    }
}
