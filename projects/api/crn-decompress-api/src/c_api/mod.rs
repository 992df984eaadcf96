//! # C API (FFI)
//!
//! *Note: The C API is only available when the `c-exports` feature is enabled.*
//!
//! The five core functions report failure as `false` or null, like crunch's own
//! `crnd` interface:
//!
//! - [`crnd_get_texture_info`] / [`crnd_get_level_info`]: header queries
//! - [`crnd_unpack_begin`] / [`crnd_unpack_end`]: unpack context lifecycle
//! - [`crnd_unpack_level`]: unpack one level into DXT blocks
//!
//! The extra functions report a [`CrndErrorCode`] ([`crnd_unpack_level_with_error`],
//! with [`crnd_error_message`] for a description), validate a whole file
//! ([`crnd_validate_file`]) or describe a format ([`crnd_get_bytes_per_dxt_block`],
//! [`crnd_crn_format_to_fourcc`]).
//!
//! ## Example Usage
//!
//! ```c
//! CrndTextureInfo tex = { sizeof(CrndTextureInfo) };
//! if (!crnd_get_texture_info(data, size, &tex))
//!     return false;
//!
//! void* context = crnd_unpack_begin(data, size);
//! if (!context)
//!     return false;
//!
//! for (uint32_t level = 0; level < tex.levels; level++) {
//!     CrndLevelInfo info = { sizeof(CrndLevelInfo) };
//!     crnd_get_level_info(data, size, level, &info);
//!
//!     uint32_t face_size = info.blocks_x * info.blocks_y * info.bytes_per_block;
//!     void* faces[6];
//!     for (uint32_t face = 0; face < info.faces; face++)
//!         faces[face] = malloc(face_size);
//!
//!     if (!crnd_unpack_level(context, faces, face_size, 0, level)) {
//!         // corrupt data
//!     }
//! }
//!
//! crnd_unpack_end(context);
//! ```

pub mod error;
pub mod info;
pub mod unpack_context;

pub use error::*;
pub use info::*;
pub use unpack_context::*;
