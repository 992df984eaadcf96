//! Header queries for the C API.

use super::error::CrndErrorCode;
use core::ffi::c_void;
use core::mem::size_of;
use core::slice;
use crn_decompress::format::CRN_FORMAT_INVALID;
use crn_decompress::header::CRN_MAX_LEVELS;
use crn_decompress::{CrnFormat, FileInfo, LevelInfo, TextureInfo};

/// Description of a texture.
///
/// Set `struct_size` to `sizeof(CrndTextureInfo)` before passing it in.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrndTextureInfo {
    /// Size of this struct in bytes.
    pub struct_size: u32,
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
    /// The format, as [`CrnFormat`] discriminant.
    pub format: u32,
}

impl Default for CrndTextureInfo {
    fn default() -> Self {
        Self {
            struct_size: size_of::<Self>() as u32,
            width: 0,
            height: 0,
            levels: 0,
            faces: 0,
            bytes_per_block: 0,
            userdata0: 0,
            userdata1: 0,
            format: CRN_FORMAT_INVALID,
        }
    }
}

impl From<TextureInfo> for CrndTextureInfo {
    fn from(info: TextureInfo) -> Self {
        Self {
            struct_size: size_of::<Self>() as u32,
            width: info.width,
            height: info.height,
            levels: info.levels,
            faces: info.faces,
            bytes_per_block: info.bytes_per_block,
            userdata0: info.userdata0,
            userdata1: info.userdata1,
            format: info.format as u32,
        }
    }
}

/// Description of one mip level.
///
/// Set `struct_size` to `sizeof(CrndLevelInfo)` before passing it in.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrndLevelInfo {
    /// Size of this struct in bytes.
    pub struct_size: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of faces.
    pub faces: u32,
    /// Blocks per row.
    pub blocks_x: u32,
    /// Block rows.
    pub blocks_y: u32,
    /// Bytes per DXT block.
    pub bytes_per_block: u32,
    /// The format, as [`CrnFormat`] discriminant.
    pub format: u32,
}

impl Default for CrndLevelInfo {
    fn default() -> Self {
        Self {
            struct_size: size_of::<Self>() as u32,
            width: 0,
            height: 0,
            faces: 0,
            blocks_x: 0,
            blocks_y: 0,
            bytes_per_block: 0,
            format: CRN_FORMAT_INVALID,
        }
    }
}

impl From<LevelInfo> for CrndLevelInfo {
    fn from(info: LevelInfo) -> Self {
        Self {
            struct_size: size_of::<Self>() as u32,
            width: info.width,
            height: info.height,
            faces: info.faces,
            blocks_x: info.blocks_x,
            blocks_y: info.blocks_y,
            bytes_per_block: info.bytes_per_block,
            format: info.format as u32,
        }
    }
}

/// Layout summary of a validated file.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrndFileInfo {
    /// Size of this struct in bytes.
    pub struct_size: u32,
    /// File size declared in the header.
    pub actual_data_size: u32,
    /// Header size in bytes.
    pub header_size: u32,
    /// Combined size of the compressed palettes.
    pub total_palette_size: u32,
    /// Size of the Huffman tables.
    pub tables_size: u32,
    /// Number of levels.
    pub levels: u32,
    /// Compressed size of each level.
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

impl From<FileInfo> for CrndFileInfo {
    fn from(info: FileInfo) -> Self {
        Self {
            struct_size: size_of::<Self>() as u32,
            actual_data_size: info.actual_data_size,
            header_size: info.header_size,
            total_palette_size: info.total_palette_size,
            tables_size: info.tables_size,
            levels: info.levels,
            level_compressed_size: info.level_compressed_size,
            color_endpoint_palette_entries: info.color_endpoint_palette_entries,
            color_selector_palette_entries: info.color_selector_palette_entries,
            alpha_endpoint_palette_entries: info.alpha_endpoint_palette_entries,
            alpha_selector_palette_entries: info.alpha_selector_palette_entries,
        }
    }
}

/// Borrows `size` bytes at `data`.
///
/// # Safety
///
/// - `data` must be null or valid for reads of `size` bytes for `'a`
pub(crate) unsafe fn data_slice<'a>(
    data: *const c_void,
    size: u32,
) -> Result<&'a [u8], CrndErrorCode> {
    if data.is_null() {
        return Err(CrndErrorCode::NullDataPointer);
    }
    Ok(unsafe { slice::from_raw_parts(data as *const u8, size as usize) })
}

/// Checks `out` and its `struct_size` field, the first field of every info struct.
///
/// # Safety
///
/// - `out` must be null or valid for reads of a `T`
unsafe fn check_out_struct<T>(out: *const T) -> Result<(), CrndErrorCode> {
    if out.is_null() {
        return Err(CrndErrorCode::NullOutputPointer);
    }
    let struct_size = unsafe { (out as *const u32).read() };
    if struct_size as usize != size_of::<T>() {
        return Err(CrndErrorCode::InvalidStructSize);
    }
    Ok(())
}

/// Reads the texture description into `out`, without verifying checksums.
///
/// # Returns
///
/// `true` on success. On failure `out` is left untouched.
///
/// # Safety
///
/// - `data` must be valid for reads of `size` bytes
/// - `out` must point to a [`CrndTextureInfo`] whose `struct_size` is set
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_get_texture_info(
    data: *const c_void,
    size: u32,
    out: *mut CrndTextureInfo,
) -> bool {
    unsafe { get_texture_info(data, size, out) }.is_ok()
}

unsafe fn get_texture_info(
    data: *const c_void,
    size: u32,
    out: *mut CrndTextureInfo,
) -> Result<(), CrndErrorCode> {
    let data = unsafe { data_slice(data, size)? };
    unsafe { check_out_struct(out)? };
    let info = crn_decompress::get_texture_info(data)?;
    unsafe { out.write(info.into()) };
    Ok(())
}

/// Reads the description of level `level_index` into `out`.
///
/// # Returns
///
/// `true` on success. On failure `out` is left untouched.
///
/// # Safety
///
/// - `data` must be valid for reads of `size` bytes
/// - `out` must point to a [`CrndLevelInfo`] whose `struct_size` is set
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_get_level_info(
    data: *const c_void,
    size: u32,
    level_index: u32,
    out: *mut CrndLevelInfo,
) -> bool {
    unsafe { get_level_info(data, size, level_index, out) }.is_ok()
}

unsafe fn get_level_info(
    data: *const c_void,
    size: u32,
    level_index: u32,
    out: *mut CrndLevelInfo,
) -> Result<(), CrndErrorCode> {
    let data = unsafe { data_slice(data, size)? };
    unsafe { check_out_struct(out)? };
    let info = crn_decompress::get_level_info(data, level_index)?;
    unsafe { out.write(info.into()) };
    Ok(())
}

/// Fully validates a file, including both checksums.
///
/// # Parameters
///
/// - `out`: Receives the file layout on success; may be null
///
/// # Safety
///
/// - `data` must be valid for reads of `size` bytes
/// - `out` must be null or point to a [`CrndFileInfo`] whose `struct_size` is set
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_validate_file(
    data: *const c_void,
    size: u32,
    out: *mut CrndFileInfo,
) -> bool {
    let Ok(data) = (unsafe { data_slice(data, size) }) else {
        return false;
    };
    if !out.is_null() && unsafe { check_out_struct(out) }.is_err() {
        return false;
    }
    match crn_decompress::validate_file(data) {
        Ok(info) => {
            if !out.is_null() {
                unsafe { out.write(info.into()) };
            }
            true
        }
        Err(_) => false,
    }
}

/// Bytes per DXT block of a format; 0 for unknown formats.
#[unsafe(no_mangle)]
pub extern "C" fn crnd_get_bytes_per_dxt_block(format: u32) -> u32 {
    CrnFormat::from_raw(format).map_or(0, CrnFormat::bytes_per_block)
}

/// DDS FourCC of a format; 0 for unknown formats.
#[unsafe(no_mangle)]
pub extern "C" fn crnd_crn_format_to_fourcc(format: u32) -> u32 {
    CrnFormat::from_raw(format).map_or(0, CrnFormat::fourcc)
}
