//! Walks the chunks of one level and writes the DXT blocks they describe.
//!
//! A chunk is 2x2 blocks. Its encoding (3 bits, three chunks per symbol) splits the
//! chunk into 1-4 tiles that share an endpoint pair. For each block component (colour,
//! then up to two alpha channels) the level stores an endpoint index delta per tile,
//! then a selector index delta per block. Chunk rows alternate direction, odd rows
//! running right to left.

use super::layout::LevelLayout;
use super::Tables;
use crate::codec::{HuffmanModel, SymbolDecoder};
use crate::error::CrnDecompressError;
use crate::format::CrnFormat;
use crate::palette::Palettes;
use likely_stable::unlikely;

/// Number of tiles for each chunk encoding.
pub(crate) const CHUNK_ENCODING_NUM_TILES: [usize; 8] = [1, 2, 2, 3, 3, 3, 3, 4];

/// Tile of each block of the chunk, blocks ordered (0,0), (1,0), (0,1), (1,1).
pub(crate) const CHUNK_TILE_INDICES: [[usize; 4]; 8] = [
    [0, 0, 0, 0],
    [0, 0, 1, 1],
    [0, 1, 0, 1],
    [0, 0, 1, 2],
    [1, 2, 0, 0],
    [0, 1, 0, 2],
    [1, 0, 2, 0],
    [0, 1, 2, 3],
];

/// Marker bit above three 3-bit chunk encodings; `bits == 1` means all were used.
const CHUNK_ENCODING_SENTINEL: u32 = 1 << 9;

/// What one part of a DXT block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Component {
    /// DXT1 colour block: endpoints `u32`, selectors `u32`.
    Color,
    /// DXT5 alpha block: endpoints `u16`, selectors `3 x u16`.
    Alpha,
}

/// A component and where it lives inside the output block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) component: Component,
    pub(crate) byte_offset: usize,
}

/// The components of `format` in stream order; colour first, then alpha.
///
/// # Returns
///
/// The slots, and how many of them are used.
pub(crate) const fn block_slots(format: CrnFormat) -> ([Slot; 2], usize) {
    const fn slot(component: Component, byte_offset: usize) -> Slot {
        Slot {
            component,
            byte_offset,
        }
    }
    const UNUSED: Slot = slot(Component::Alpha, 0);

    match format {
        CrnFormat::Dxt1 => ([slot(Component::Color, 0), UNUSED], 1),
        CrnFormat::Dxt5A => ([slot(Component::Alpha, 0), UNUSED], 1),
        CrnFormat::DxnXY | CrnFormat::DxnYX => (
            [slot(Component::Alpha, 0), slot(Component::Alpha, 8)],
            2,
        ),
        // DXT5 family; alpha block first in memory, colour decoded first.
        _ => ([slot(Component::Color, 8), slot(Component::Alpha, 0)], 2),
    }
}

/// Applies a palette index delta, wrapping once around the palette.
#[inline(always)]
fn next_index(prev: u32, delta: u32, size: u32) -> Result<u32, CrnDecompressError> {
    let mut index = prev + delta;
    if index >= size {
        index -= size;
    }
    if unlikely(index >= size) {
        return Err(CrnDecompressError::PaletteIndexOutOfRange { index, size });
    }
    Ok(index)
}

/// Per component decoding state, carried over the whole level.
#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    prev_endpoint: u32,
    prev_selector: u32,
    tile_endpoints: [u32; 4],
}

struct SlotModels<'m> {
    endpoint_delta: &'m HuffmanModel,
    selector_delta: &'m HuffmanModel,
    num_endpoints: u32,
    num_selectors: u32,
}

fn slot_models<'m>(
    component: Component,
    tables: &'m Tables,
    palettes: &Palettes,
) -> SlotModels<'m> {
    match component {
        Component::Color => SlotModels {
            endpoint_delta: &tables.endpoint_delta[0],
            selector_delta: &tables.selector_delta[0],
            num_endpoints: palettes.color_endpoints.len() as u32,
            num_selectors: palettes.color_selectors.len() as u32,
        },
        Component::Alpha => SlotModels {
            endpoint_delta: &tables.endpoint_delta[1],
            selector_delta: &tables.selector_delta[1],
            num_endpoints: palettes.alpha_endpoints.len() as u32,
            num_selectors: palettes.num_alpha_selectors() as u32,
        },
    }
}

#[inline(always)]
fn write_component(
    out: &mut [u8],
    component: Component,
    palettes: &Palettes,
    endpoint: u32,
    selector: u32,
) {
    match component {
        Component::Color => {
            let endpoints = palettes.color_endpoints[endpoint as usize];
            let selectors = palettes.color_selectors[selector as usize];
            out[0..4].copy_from_slice(&endpoints.to_le_bytes());
            out[4..8].copy_from_slice(&selectors.to_le_bytes());
        }
        Component::Alpha => {
            let endpoints = palettes.alpha_endpoints[endpoint as usize];
            let selectors = &palettes.alpha_selectors[selector as usize * 3..][..3];
            out[0..2].copy_from_slice(&endpoints.to_le_bytes());
            out[2..4].copy_from_slice(&selectors[0].to_le_bytes());
            out[4..6].copy_from_slice(&selectors[1].to_le_bytes());
            out[6..8].copy_from_slice(&selectors[2].to_le_bytes());
        }
    }
}

/// Decodes every chunk of a level into `faces`.
///
/// `faces` must have been checked against `layout` (one buffer per face, each at least
/// `row_pitch * blocks_y` bytes).
pub(crate) fn unpack_level_blocks(
    decoder: &mut SymbolDecoder,
    tables: &Tables,
    palettes: &Palettes,
    format: CrnFormat,
    layout: &LevelLayout,
    faces: &mut [&mut [u8]],
) -> Result<(), CrnDecompressError> {
    let (slots, num_slots) = block_slots(format);
    let slots = &slots[..num_slots];
    let models = [
        slot_models(slots[0].component, tables, palettes),
        slot_models(slots[num_slots - 1].component, tables, palettes),
    ];
    let mut state = [SlotState::default(); 2];
    let mut chunk_encoding_bits = 1u32;

    for face in faces.iter_mut() {
        for chunk_y in 0..layout.chunks_y {
            let reverse = chunk_y & 1 == 1;
            for x in 0..layout.chunks_x {
                let chunk_x = if reverse { layout.chunks_x - 1 - x } else { x };

                if chunk_encoding_bits == 1 {
                    let symbol = decoder.decode(&tables.chunk_encoding)?;
                    if unlikely(symbol >= CHUNK_ENCODING_SENTINEL) {
                        return Err(CrnDecompressError::CorruptStream(
                            "chunk encoding symbol out of range",
                        ));
                    }
                    chunk_encoding_bits = symbol | CHUNK_ENCODING_SENTINEL;
                }
                let encoding = (chunk_encoding_bits & 7) as usize;
                chunk_encoding_bits >>= 3;

                for (slot_state, models) in state.iter_mut().zip(&models).take(num_slots) {
                    for tile in 0..CHUNK_ENCODING_NUM_TILES[encoding] {
                        let delta = decoder.decode(models.endpoint_delta)?;
                        slot_state.prev_endpoint =
                            next_index(slot_state.prev_endpoint, delta, models.num_endpoints)?;
                        slot_state.tile_endpoints[tile] = slot_state.prev_endpoint;
                    }
                }

                for (block, &tile) in CHUNK_TILE_INDICES[encoding].iter().enumerate() {
                    let block_x = chunk_x * 2 + (block & 1);
                    let block_y = chunk_y * 2 + (block >> 1);
                    let visible = block_x < layout.blocks_x && block_y < layout.blocks_y;
                    let block_offset = block_y * layout.row_pitch + block_x * layout.block_size;

                    for ((slot, slot_state), models) in
                        slots.iter().zip(state.iter_mut()).zip(&models)
                    {
                        let delta = decoder.decode(models.selector_delta)?;
                        slot_state.prev_selector =
                            next_index(slot_state.prev_selector, delta, models.num_selectors)?;

                        if visible {
                            let start = block_offset + slot.byte_offset;
                            write_component(
                                &mut face[start..start + 8],
                                slot.component,
                                palettes,
                                slot_state.tile_endpoints[tile],
                                slot_state.prev_selector,
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
