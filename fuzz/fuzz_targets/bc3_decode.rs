#![no_main]

// Compares the DXT5 decoder against rgbcx-sys.
// The colour half is DXT1 data in 4 colour mode; the alpha half is a DXT5A block.

use core::mem;
use crn_decompress_common::alpha_decode::decode_bc3;
use crn_decompress_common::decoded_4x4_block::Decoded4x4Block;
use crn_decompress_common::{color_565::Color565, color_8888::Color8888};
use libfuzzer_sys::{arbitrary, fuzz_target};
use rgbcx_sys::root::rgbcx;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Bc3Block {
    pub bytes: [u8; 16],
}

fuzz_target!(|block: Bc3Block| {
    // c0 <= c1 in a DXT5 colour block is undefined on some GPUs.
    let c0 = Color565::from_raw(u16::from_le_bytes([block.bytes[8], block.bytes[9]]));
    let c1 = Color565::from_raw(u16::from_le_bytes([block.bytes[10], block.bytes[11]]));
    if !c0.greater_than(&c1) {
        return;
    }

    let ours = decode_bc3(&block.bytes);
    let reference = rgbcx_decode_bc3_to_block(&block.bytes);
    assert_eq!(ours, reference, "Decoded blocks don't match");
});

fn rgbcx_decode_bc3_to_block(bc3_block: &[u8]) -> Decoded4x4Block {
    let mut rgba_buffer = [0u8; 4 * 16];

    unsafe {
        rgbcx::unpack_bc3(
            bc3_block.as_ptr() as *const core::ffi::c_void,
            rgba_buffer.as_mut_ptr() as *mut core::ffi::c_void,
            rgbcx::bc1_approx_mode::cBC1Ideal,
        );
    }

    // RGBA byte order matches the Color8888 layout in little endian.
    let pixels: [Color8888; 16] = unsafe { mem::transmute(rgba_buffer) };
    Decoded4x4Block { pixels }
}
