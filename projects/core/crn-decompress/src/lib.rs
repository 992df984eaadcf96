#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub(crate) mod codec;
pub mod crc16;
pub mod error;
pub mod format;
pub mod header;
pub mod info;
pub(crate) mod palette;
pub mod unpack;

pub use error::CrnDecompressError;
pub use format::CrnFormat;
pub use header::CrnHeader;
pub use info::{
    get_level_info, get_texture_info, validate_file, FileInfo, LevelInfo, TextureInfo,
};
pub use unpack::Unpacker;

/// Synthetic CRN writer, used to build test inputs.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_prelude;
