#![no_main]

// Header queries must never panic, and must agree with each other on valid headers.

use crn_decompress::{get_level_info, get_texture_info, validate_file};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(texture) = get_texture_info(data) else {
        return;
    };

    for level in 0..texture.levels {
        let info = get_level_info(data, level).unwrap();
        assert_eq!(info.width, (texture.width >> level).max(1));
        assert_eq!(info.height, (texture.height >> level).max(1));
        assert_eq!(info.faces, texture.faces);
    }
    assert!(get_level_info(data, texture.levels).is_err());

    if let Ok(file) = validate_file(data) {
        assert_eq!(file.levels, texture.levels);
    }
});
