#![no_main]

// Compares the DXT1 decoder against rgbcx-sys using the Ideal method.
// Extra reading: https://fgiesen.wordpress.com/2021/10/04/gpu-bcn-decoding/

use core::mem;
use crn_decompress_common::bc1_decode::decode_bc1_block_from_slice;
use crn_decompress_common::color_8888::Color8888;
use crn_decompress_common::decoded_4x4_block::Decoded4x4Block;
use libfuzzer_sys::{arbitrary, fuzz_target};
use rgbcx_sys::root::rgbcx;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Bc1Block {
    pub bytes: [u8; 8],
}

fuzz_target!(|color: Bc1Block| {
    let ours = decode_bc1_block_from_slice(&color.bytes).unwrap();
    let reference = rgbcx_decode_bc1_to_block(&color.bytes);
    assert_eq!(ours, reference, "Decoded blocks don't match");
});

fn rgbcx_decode_bc1_to_block(bc1_block: &[u8]) -> Decoded4x4Block {
    let mut rgba_buffer = [0u8; 4 * 16];

    unsafe {
        rgbcx::unpack_bc1(
            bc1_block.as_ptr() as *const ::std::os::raw::c_void,
            rgba_buffer.as_mut_ptr() as *mut ::std::os::raw::c_void,
            true, // set_alpha
            rgbcx::bc1_approx_mode::cBC1Ideal,
        );
    }

    // RGBA byte order matches the Color8888 layout.
    let pixels: [Color8888; 16] = unsafe { mem::transmute(rgba_buffer) };
    Decoded4x4Block { pixels }
}
