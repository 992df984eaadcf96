//! Decoding of the four palettes referenced by the level data.
//!
//! Every palette is delta coded against the previous entry. Colour endpoints are
//! stored as `c0 | c1 << 16` (two RGB565 colours); colour selectors as 16 2-bit DXT1
//! indices; alpha endpoints as `a0 | a1 << 8`; alpha selectors as three `u16` holding
//! 16 3-bit DXT5 indices.

use crate::codec::SymbolDecoder;
use crate::error::CrnDecompressError;
use crate::header::{CrnHeader, CrnPalette};
use alloc::vec::Vec;

/// Maps a linear 2-bit selector (0 = first endpoint .. 3 = second) to its DXT1 index.
pub(crate) const DXT1_FROM_LINEAR: [u8; 4] = [0, 2, 3, 1];
/// Maps a linear 3-bit selector to its DXT5 alpha index.
pub(crate) const DXT5_FROM_LINEAR: [u8; 8] = [0, 2, 3, 4, 5, 6, 7, 1];

/// Alphabet size of the colour selector delta model, 7x7 deltas.
pub(crate) const NUM_COLOR_SELECTOR_SYMS: u32 = 49;
/// Alphabet size of the alpha selector delta model, 15x15 deltas.
pub(crate) const NUM_ALPHA_SELECTOR_SYMS: u32 = 225;

/// The decoded palettes of one file.
#[derive(Debug, Clone, Default)]
pub(crate) struct Palettes {
    pub(crate) color_endpoints: Vec<u32>,
    pub(crate) color_selectors: Vec<u32>,
    pub(crate) alpha_endpoints: Vec<u16>,
    /// 3 values per selector.
    pub(crate) alpha_selectors: Vec<u16>,
}

impl Palettes {
    /// Decodes all palettes present in the file.
    pub(crate) fn decode(header: &CrnHeader, data: &[u8]) -> Result<Self, CrnDecompressError> {
        Ok(Self {
            color_endpoints: decode_color_endpoints(palette_stream(
                &header.color_endpoints,
                data,
            )?)?,
            color_selectors: decode_color_selectors(palette_stream(
                &header.color_selectors,
                data,
            )?)?,
            alpha_endpoints: decode_alpha_endpoints(palette_stream(
                &header.alpha_endpoints,
                data,
            )?)?,
            alpha_selectors: decode_alpha_selectors(palette_stream(
                &header.alpha_selectors,
                data,
            )?)?,
        })
    }

    /// Number of alpha selector entries.
    #[inline]
    pub(crate) fn num_alpha_selectors(&self) -> usize {
        self.alpha_selectors.len() / 3
    }
}

/// A palette's compressed bytes and entry count; [`None`] data for absent palettes.
struct PaletteStream<'a> {
    data: Option<&'a [u8]>,
    num: usize,
}

fn palette_stream<'a>(
    palette: &CrnPalette,
    data: &'a [u8],
) -> Result<PaletteStream<'a>, CrnDecompressError> {
    if palette.num == 0 {
        return Ok(PaletteStream { data: None, num: 0 });
    }
    let bytes = data
        .get(palette.range())
        .ok_or(CrnDecompressError::InvalidHeader("palette out of range"))?;
    Ok(PaletteStream {
        data: Some(bytes),
        num: palette.num as usize,
    })
}

fn decode_color_endpoints(stream: PaletteStream) -> Result<Vec<u32>, CrnDecompressError> {
    let Some(bytes) = stream.data else {
        return Ok(Vec::new());
    };
    let mut decoder = SymbolDecoder::new(bytes)?;
    let dm0 = decoder.receive_static_model()?;
    let dm1 = decoder.receive_static_model()?;

    let (mut a, mut b, mut c) = (0u32, 0u32, 0u32);
    let (mut d, mut e, mut f) = (0u32, 0u32, 0u32);
    let mut endpoints = Vec::with_capacity(stream.num);
    for _ in 0..stream.num {
        a = (a + decoder.decode(&dm0)?) & 31;
        b = (b + decoder.decode(&dm1)?) & 63;
        c = (c + decoder.decode(&dm0)?) & 31;
        d = (d + decoder.decode(&dm0)?) & 31;
        e = (e + decoder.decode(&dm1)?) & 63;
        f = (f + decoder.decode(&dm0)?) & 31;
        endpoints.push(c | (b << 5) | (a << 11) | (f << 16) | (e << 21) | (d << 27));
    }
    Ok(endpoints)
}

fn decode_color_selectors(stream: PaletteStream) -> Result<Vec<u32>, CrnDecompressError> {
    let Some(bytes) = stream.data else {
        return Ok(Vec::new());
    };
    let mut decoder = SymbolDecoder::new(bytes)?;
    let dm = decoder.receive_static_model()?;

    let mut current = [0u8; 16];
    let mut selectors = Vec::with_capacity(stream.num);
    for _ in 0..stream.num {
        for pair in current.chunks_exact_mut(2) {
            let symbol = decoder.decode(&dm)?;
            if symbol >= NUM_COLOR_SELECTOR_SYMS {
                return Err(CrnDecompressError::CorruptStream(
                    "colour selector delta out of range",
                ));
            }
            // Deltas in -3..=3, stored as symbol = (d0 + 3) + (d1 + 3) * 7
            let delta0 = (symbol % 7) as i32 - 3;
            let delta1 = (symbol / 7) as i32 - 3;
            pair[0] = ((pair[0] as i32 + delta0) & 3) as u8;
            pair[1] = ((pair[1] as i32 + delta1) & 3) as u8;
        }

        let selector = current
            .iter()
            .enumerate()
            .fold(0u32, |acc, (x, &s)| {
                acc | ((DXT1_FROM_LINEAR[s as usize] as u32) << (x * 2))
            });
        selectors.push(selector);
    }
    Ok(selectors)
}

fn decode_alpha_endpoints(stream: PaletteStream) -> Result<Vec<u16>, CrnDecompressError> {
    let Some(bytes) = stream.data else {
        return Ok(Vec::new());
    };
    let mut decoder = SymbolDecoder::new(bytes)?;
    let dm = decoder.receive_static_model()?;

    let (mut a, mut b) = (0u32, 0u32);
    let mut endpoints = Vec::with_capacity(stream.num);
    for _ in 0..stream.num {
        a = (a + decoder.decode(&dm)?) & 255;
        b = (b + decoder.decode(&dm)?) & 255;
        endpoints.push((a | (b << 8)) as u16);
    }
    Ok(endpoints)
}

fn decode_alpha_selectors(stream: PaletteStream) -> Result<Vec<u16>, CrnDecompressError> {
    let Some(bytes) = stream.data else {
        return Ok(Vec::new());
    };
    let mut decoder = SymbolDecoder::new(bytes)?;
    let dm = decoder.receive_static_model()?;

    let mut current = [0u8; 16];
    let mut selectors = Vec::with_capacity(stream.num * 3);
    for _ in 0..stream.num {
        for pair in current.chunks_exact_mut(2) {
            let symbol = decoder.decode(&dm)?;
            if symbol >= NUM_ALPHA_SELECTOR_SYMS {
                return Err(CrnDecompressError::CorruptStream(
                    "alpha selector delta out of range",
                ));
            }
            // Deltas in -7..=7, stored as symbol = (d0 + 7) + (d1 + 7) * 15
            let delta0 = (symbol % 15) as i32 - 7;
            let delta1 = (symbol / 15) as i32 - 7;
            pair[0] = ((pair[0] as i32 + delta0) & 7) as u8;
            pair[1] = ((pair[1] as i32 + delta1) & 7) as u8;
        }

        // 48 bits of DXT5 indices, split over three u16
        let bits = current
            .iter()
            .enumerate()
            .fold(0u64, |acc, (x, &s)| {
                acc | ((DXT5_FROM_LINEAR[s as usize] as u64) << (x * 3))
            });
        selectors.push(bits as u16);
        selectors.push((bits >> 16) as u16);
        selectors.push((bits >> 32) as u16);
    }
    Ok(selectors)
}
