#![no_main]

// Starts from a well formed file, corrupts bytes past the header and then fixes
// the checksums, so the corruption reaches the Huffman and palette decoders.

use crn_decompress::test_prelude::{rewrite_checksums, CrnBuilder};
use crn_decompress::{CrnFormat, CrnHeader};
use crn_decompress_api::CrunchedData;
use libfuzzer_sys::{arbitrary, fuzz_target};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Input {
    pub format: u8,
    pub width: u8,
    pub height: u8,
    pub seed: u32,
    pub mutations: Vec<(u16, u8)>,
}

fuzz_target!(|input: Input| {
    let formats = [
        CrnFormat::Dxt1,
        CrnFormat::Dxt5,
        CrnFormat::Dxt5xGxR,
        CrnFormat::DxnXY,
        CrnFormat::DxnYX,
        CrnFormat::Dxt5A,
    ];
    let format = formats[input.format as usize % formats.len()];
    let width = (input.width as u16 % 64) + 1;
    let height = (input.height as u16 % 64) + 1;

    let mut data = CrnBuilder::patterned(format, width, height, input.seed).build();
    let header_size = CrnHeader::parse(&data).unwrap().header_size as usize;
    let body = data.len() - header_size;
    for (offset, value) in input.mutations {
        data[header_size + offset as usize % body] ^= value;
    }
    rewrite_checksums(&mut data);

    let Ok(texture) = CrunchedData::new(&data) else {
        return;
    };
    let _ = texture.decode_level(0);
    let _ = texture.decode_level_rgba(0, 0);
});
