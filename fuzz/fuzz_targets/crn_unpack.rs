#![no_main]

// Arbitrary bytes through the full unpack path: errors are fine, panics are not.

use crn_decompress_api::CrunchedData;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(texture) = CrunchedData::new(data) else {
        return;
    };

    for level in 0..texture.texture_info().levels {
        let _ = texture.decode_level(level);
    }
});
