#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod allocate;
pub mod alpha_decode;
pub mod bc1_decode;
pub mod color_565;
pub mod color_8888;
pub mod decoded_4x4_block;
pub mod rgba;
