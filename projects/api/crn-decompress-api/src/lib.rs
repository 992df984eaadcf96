#![doc = include_str!("../README.MD")]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod crunched_data;
pub mod error;

#[cfg(feature = "c-exports")]
pub mod c_api;

pub use crunched_data::CrunchedData;
pub use error::CrnApiError;

pub use crn_decompress::{
    get_level_info, get_texture_info, validate_file, CrnDecompressError, CrnFormat, FileInfo,
    LevelInfo, TextureInfo,
};
