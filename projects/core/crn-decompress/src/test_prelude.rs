//! Writes small CRN files from explicit palettes and block references.
//!
//! Huffman models are written with equal code lengths by default, so a symbol is
//! just its index in a fixed number of bits. [`CrnBuilder::varied_code_lengths`]
//! switches every model to a complete canonical code with mixed lengths.

use crate::codec::{MAX_CODE_SIZE, MOST_PROBABLE_CODELENGTH_CODES};
use crate::crc16::crc16;
use crate::format::CrnFormat;
use crate::header::CRN_HEADER_FIXED_SIZE;
use crate::palette::{DXT1_FROM_LINEAR, DXT5_FROM_LINEAR};
use crate::unpack::{block_slots, Component, CHUNK_ENCODING_NUM_TILES, CHUNK_TILE_INDICES};
use alloc::vec;
use alloc::vec::Vec;

/// MSB-first bit writer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    acc: u64,
    count: u32,
}

impl BitWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `num_bits` (0..=32) bits of `value`.
    pub fn write_bits(&mut self, value: u32, num_bits: u32) {
        if num_bits == 0 {
            return;
        }
        let mask = (1u64 << num_bits) - 1;
        self.acc = (self.acc << num_bits) | (value as u64 & mask);
        self.count += num_bits;
        while self.count >= 8 {
            self.count -= 8;
            self.bytes.push((self.acc >> self.count) as u8);
        }
    }

    /// Pads the last byte with zero bits and returns the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.count > 0 {
            self.bytes.push((self.acc << (8 - self.count)) as u8);
        }
        self.bytes
    }
}

/// Packs linear 2-bit selectors (0 = first endpoint, 3 = second) into DXT1 selector bits.
pub fn dxt1_selector_bits(linear: &[u8; 16]) -> u32 {
    linear.iter().enumerate().fold(0, |acc, (x, &s)| {
        acc | ((DXT1_FROM_LINEAR[s as usize & 3] as u32) << (x * 2))
    })
}

/// Packs linear 3-bit selectors into the 48 DXT5 alpha selector bits.
pub fn dxt5_selector_bits(linear: &[u8; 16]) -> u64 {
    linear.iter().enumerate().fold(0, |acc, (x, &s)| {
        acc | ((DXT5_FROM_LINEAR[s as usize & 7] as u64) << (x * 3))
    })
}

/// Recomputes both checksums after the caller edited `data`.
pub fn rewrite_checksums(data: &mut [u8]) {
    let header_size = u16::from_be_bytes([data[2], data[3]]) as usize;
    let data_size = u32::from_be_bytes([data[6], data[7], data[8], data[9]]) as usize;
    let data_crc = crc16(&data[header_size..data_size], 0);
    data[10..12].copy_from_slice(&data_crc.to_be_bytes());
    let header_crc = crc16(&data[6..header_size], 0);
    data[4..6].copy_from_slice(&header_crc.to_be_bytes());
}

/// Palette entries used by one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRefs {
    /// Index into the colour endpoint palette.
    pub color_endpoint: usize,
    /// Index into the colour selector palette.
    pub color_selector: usize,
    /// Indices into the alpha endpoint palette, per alpha block.
    pub alpha_endpoints: [usize; 2],
    /// Indices into the alpha selector palette, per alpha block.
    pub alpha_selectors: [usize; 2],
}

/// Builds a CRN file.
///
/// Blocks of a tile share one endpoint pair; the writer uses the endpoint
/// of the tile's first visible block and [`CrnBuilder::expected_level`] mirrors that.
#[derive(Debug, Clone)]
pub struct CrnBuilder {
    /// Width of the top level.
    pub width: u16,
    /// Height of the top level.
    pub height: u16,
    /// 1, or 6 for cubemaps.
    pub faces: u8,
    /// Format tag written to the header.
    pub format: CrnFormat,
    /// User data value 0.
    pub userdata0: u32,
    /// User data value 1.
    pub userdata1: u32,
    /// Colour endpoints, `c0 | c1 << 16`.
    pub color_endpoints: Vec<u32>,
    /// Colour selectors, linear 0..=3.
    pub color_selectors: Vec<[u8; 16]>,
    /// Alpha endpoints `(a0, a1)`.
    pub alpha_endpoints: Vec<(u8, u8)>,
    /// Alpha selectors, linear 0..=7.
    pub alpha_selectors: Vec<[u8; 16]>,
    /// Block references, indexed `[level][face][block_y * blocks_x + block_x]`.
    pub levels: Vec<Vec<Vec<BlockRefs>>>,
    /// Chunk encodings 0..=7, cycled over the chunks of each level in decode order.
    pub chunk_encodings: Vec<u8>,
    /// Writes every Huffman model with mixed code lengths instead of equal ones.
    pub varied_code_lengths: bool,
    /// Alphabet size of the endpoint delta models; the palette size when [`None`].
    pub endpoint_delta_syms: Option<u32>,
    /// Replaces the first endpoint delta written for each level.
    pub first_endpoint_delta: Option<u32>,
    seed: Option<u64>,
}

/// Linear congruential generator for patterned textures.
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    fn below(&mut self, n: usize) -> usize {
        self.next() as usize % n
    }
}

fn level_blocks(width: u16, height: u16, level: usize) -> (usize, usize) {
    let width = ((width as usize) >> level).max(1);
    let height = ((height as usize) >> level).max(1);
    (width.div_ceil(4), height.div_ceil(4))
}

/// Code length used for every symbol of an alphabet of `num_syms`.
fn uniform_code_size(num_syms: u32) -> u32 {
    (u32::BITS - num_syms.saturating_sub(1).leading_zeros()).max(1)
}

/// Code lengths of a complete code for `num_syms` symbols that mixes lengths.
///
/// The first symbols form a chain of lengths 1, 2, 3; the rest share the remaining
/// subtree as evenly as possible. Alphabets of up to two symbols stay uniform.
fn varied_code_sizes(num_syms: u32) -> Vec<u8> {
    if num_syms <= 2 {
        return vec![uniform_code_size(num_syms) as u8; num_syms as usize];
    }
    let chain = 3.min(num_syms - 1);
    let rest = num_syms - chain;
    let mut sizes: Vec<u8> = (1..=chain as u8).collect();
    if rest == 1 {
        sizes.push(chain as u8);
    } else {
        let depth = uniform_code_size(rest);
        let short = (1 << depth) - rest;
        sizes.extend((0..rest).map(|x| (chain + depth - (x < short) as u32) as u8));
    }
    sizes
}

/// Canonical `(code, length)` pairs, assigned by length then symbol.
fn canonical_codes(code_sizes: &[u8]) -> Vec<(u32, u32)> {
    let mut count = [0u32; MAX_CODE_SIZE as usize + 1];
    for &size in code_sizes {
        count[size as usize] += 1;
    }
    count[0] = 0;

    let mut next_code = [0u32; MAX_CODE_SIZE as usize + 1];
    let mut code = 0;
    for len in 1..=MAX_CODE_SIZE as usize {
        code = (code + count[len - 1]) << 1;
        next_code[len] = code;
    }

    code_sizes
        .iter()
        .map(|&size| {
            let code = next_code[size as usize];
            next_code[size as usize] += 1;
            (code, size as u32)
        })
        .collect()
}

/// A transmitted model and the code of each of its symbols.
#[derive(Debug, Clone)]
struct CodedModel {
    codes: Vec<(u32, u32)>,
}

impl CodedModel {
    /// Transmits a model with the given code lengths; an empty alphabet only
    /// writes the symbol count.
    fn write(writer: &mut BitWriter, code_sizes: &[u8]) -> Option<Self> {
        writer.write_bits(code_sizes.len() as u32, 14);
        if code_sizes.is_empty() {
            return None;
        }

        // Each distinct length gets an equal length code, so codes follow symbol order.
        let mut lengths = code_sizes.to_vec();
        lengths.sort_unstable();
        lengths.dedup();
        let codelength_size = uniform_code_size(lengths.len() as u32);

        let last = MOST_PROBABLE_CODELENGTH_CODES
            .iter()
            .rposition(|symbol| lengths.contains(symbol))
            .unwrap_or(0);
        writer.write_bits(last as u32 + 1, 5);
        for symbol in &MOST_PROBABLE_CODELENGTH_CODES[..=last] {
            writer.write_bits(lengths.contains(symbol) as u32 * codelength_size, 3);
        }
        for size in code_sizes {
            let code = lengths.binary_search(size).unwrap_or(0);
            writer.write_bits(code as u32, codelength_size);
        }

        Some(Self {
            codes: canonical_codes(code_sizes),
        })
    }

    fn write_symbol(&self, writer: &mut BitWriter, symbol: u32) {
        let (code, len) = self.codes[symbol as usize];
        writer.write_bits(code, len);
    }
}

fn write_symbol(model: &Option<CodedModel>, writer: &mut BitWriter, symbol: u32) {
    if let Some(model) = model {
        model.write_symbol(writer, symbol);
    }
}

/// `(target - prev) mod size`, 0 for an empty palette.
fn wrapping_delta(target: usize, prev: usize, size: usize) -> u32 {
    if size == 0 {
        return 0;
    }
    ((target % size + size - prev % size) % size) as u32
}

/// The models and per level state of one block component slot.
#[derive(Debug, Clone, Copy)]
struct SlotWriter {
    component: Component,
    /// Which alpha block this is, for alpha slots.
    alpha_index: usize,
    byte_offset: usize,
    num_endpoints: usize,
    num_selectors: usize,
    prev_endpoint: usize,
    prev_selector: usize,
}

impl SlotWriter {
    fn endpoint(&self, refs: &BlockRefs) -> usize {
        match self.component {
            Component::Color => refs.color_endpoint,
            Component::Alpha => refs.alpha_endpoints[self.alpha_index],
        }
    }

    fn selector(&self, refs: &BlockRefs) -> usize {
        match self.component {
            Component::Color => refs.color_selector,
            Component::Alpha => refs.alpha_selectors[self.alpha_index],
        }
    }
}

/// The endpoint and selector delta models of a component.
fn component_models(
    models: &[Option<CodedModel>; 5],
    component: Component,
) -> (&Option<CodedModel>, &Option<CodedModel>) {
    match component {
        Component::Color => (&models[1], &models[2]),
        Component::Alpha => (&models[3], &models[4]),
    }
}

/// Endpoint references of each tile of a chunk: those of the tile's first visible block.
fn tile_refs(
    refs: &[BlockRefs],
    blocks: (usize, usize),
    chunk: (usize, usize),
    encoding: usize,
) -> [Option<BlockRefs>; 4] {
    let mut tiles = [None; 4];
    for (block, &tile) in CHUNK_TILE_INDICES[encoding].iter().enumerate() {
        let block_x = chunk.0 * 2 + (block & 1);
        let block_y = chunk.1 * 2 + (block >> 1);
        if block_x < blocks.0 && block_y < blocks.1 && tiles[tile].is_none() {
            tiles[tile] = Some(refs[block_y * blocks.0 + block_x]);
        }
    }
    tiles
}

/// Position of `chunk` of face `face` in the serpentine decode order of a level.
fn decode_order(chunks: (usize, usize), face: usize, chunk: (usize, usize)) -> usize {
    let x = if chunk.1 & 1 == 1 { chunks.0 - 1 - chunk.0 } else { chunk.0 };
    face * chunks.0 * chunks.1 + chunk.1 * chunks.0 + x
}

impl CrnBuilder {
    fn empty(format: CrnFormat, width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            faces: 1,
            format,
            userdata0: 0,
            userdata1: 0,
            color_endpoints: Vec::new(),
            color_selectors: Vec::new(),
            alpha_endpoints: Vec::new(),
            alpha_selectors: Vec::new(),
            levels: Vec::new(),
            chunk_encodings: vec![7],
            varied_code_lengths: false,
            endpoint_delta_syms: None,
            first_endpoint_delta: None,
            seed: None,
        }
    }

    fn uses(format: CrnFormat) -> (bool, bool) {
        let (slots, num_slots) = block_slots(format);
        let has = |component| slots[..num_slots].iter().any(|s| s.component == component);
        (has(Component::Color), has(Component::Alpha))
    }

    /// A single level texture where every block uses palette entry 0.
    ///
    /// Palettes are created for the components `format` needs: a red/blue colour
    /// endpoint pair and an opaque/transparent alpha pair, both with all selectors 0.
    pub fn solid(format: CrnFormat, width: u16, height: u16) -> Self {
        let mut builder = Self::empty(format, width, height);
        let (color, alpha) = Self::uses(format);
        if color {
            builder.color_endpoints = vec![0xF800_001F];
            builder.color_selectors = vec![[0; 16]];
        }
        if alpha {
            builder.alpha_endpoints = vec![(255, 0)];
            builder.alpha_selectors = vec![[0; 16]];
        }
        builder.fill_levels(1);
        builder
    }

    /// A single level texture with pseudo random palettes and block references.
    pub fn patterned(format: CrnFormat, width: u16, height: u16, seed: u32) -> Self {
        let mut builder = Self::empty(format, width, height);
        let mut rng = Lcg(seed as u64 ^ 0x9E37_79B9_7F4A_7C15);
        let (color, alpha) = Self::uses(format);
        if color {
            builder.color_endpoints = (0..3 + rng.below(14)).map(|_| rng.next()).collect();
            builder.color_selectors = (0..2 + rng.below(10))
                .map(|_| core::array::from_fn(|_| rng.below(4) as u8))
                .collect();
        }
        if alpha {
            builder.alpha_endpoints = (0..3 + rng.below(14))
                .map(|_| (rng.next() as u8, rng.next() as u8))
                .collect();
            builder.alpha_selectors = (0..2 + rng.below(10))
                .map(|_| core::array::from_fn(|_| rng.below(8) as u8))
                .collect();
        }
        builder.seed = Some(rng.0);
        builder.fill_levels(1);
        builder
    }

    /// Uses `levels` mip levels, regenerating the block references.
    pub fn with_mip_levels(mut self, levels: usize) -> Self {
        self.fill_levels(levels);
        self
    }

    /// Uses `faces` faces, regenerating the block references.
    pub fn with_faces(mut self, faces: u8) -> Self {
        self.faces = faces;
        self.fill_levels(self.levels.len().max(1));
        self
    }

    fn fill_levels(&mut self, num_levels: usize) {
        let mut rng = self.seed.map(Lcg);
        let sizes = (
            self.color_endpoints.len().max(1),
            self.color_selectors.len().max(1),
            self.alpha_endpoints.len().max(1),
            self.alpha_selectors.len().max(1),
        );

        self.levels = (0..num_levels)
            .map(|level| {
                let (blocks_x, blocks_y) = level_blocks(self.width, self.height, level);
                (0..self.faces)
                    .map(|_| {
                        (0..blocks_x * blocks_y)
                            .map(|_| match rng.as_mut() {
                                None => BlockRefs::default(),
                                Some(rng) => BlockRefs {
                                    color_endpoint: rng.below(sizes.0),
                                    color_selector: rng.below(sizes.1),
                                    alpha_endpoints: [rng.below(sizes.2), rng.below(sizes.2)],
                                    alpha_selectors: [rng.below(sizes.3), rng.below(sizes.3)],
                                },
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();
    }

    fn slot_writers(&self) -> Vec<SlotWriter> {
        let (slots, num_slots) = block_slots(self.format);
        let mut alpha_index = 0;
        slots[..num_slots]
            .iter()
            .map(|slot| {
                let (num_endpoints, num_selectors, index) = match slot.component {
                    Component::Color => {
                        (self.color_endpoints.len(), self.color_selectors.len(), 0)
                    }
                    Component::Alpha => {
                        alpha_index += 1;
                        (
                            self.alpha_endpoints.len(),
                            self.alpha_selectors.len(),
                            alpha_index - 1,
                        )
                    }
                };
                SlotWriter {
                    component: slot.component,
                    alpha_index: index,
                    byte_offset: slot.byte_offset,
                    num_endpoints,
                    num_selectors,
                    prev_endpoint: 0,
                    prev_selector: 0,
                }
            })
            .collect()
    }

    fn endpoint_model_syms(&self, palette_len: usize) -> u32 {
        self.endpoint_delta_syms.unwrap_or(palette_len as u32)
    }

    fn write_model(&self, writer: &mut BitWriter, num_syms: u32) -> Option<CodedModel> {
        let code_sizes = match self.varied_code_lengths {
            true => varied_code_sizes(num_syms),
            false => vec![uniform_code_size(num_syms) as u8; num_syms as usize],
        };
        CodedModel::write(writer, &code_sizes)
    }

    /// Encoding of the `index`th chunk of a level, counted in decode order across faces.
    fn chunk_encoding(&self, index: usize) -> usize {
        match self.chunk_encodings.len() {
            0 => 7,
            len => self.chunk_encodings[index % len] as usize & 7,
        }
    }

    /// Writes the Huffman tables.
    ///
    /// # Returns
    ///
    /// The stream, plus the chunk encoding, colour and alpha models.
    fn write_tables(&self) -> (Vec<u8>, [Option<CodedModel>; 5]) {
        let mut writer = BitWriter::new();
        let mut models: [Option<CodedModel>; 5] = Default::default();
        models[0] = self.write_model(&mut writer, 512);
        if !self.color_endpoints.is_empty() {
            models[1] = self.write_model(
                &mut writer,
                self.endpoint_model_syms(self.color_endpoints.len()),
            );
            models[2] = self.write_model(&mut writer, self.color_selectors.len() as u32);
        }
        if !self.alpha_endpoints.is_empty() {
            models[3] = self.write_model(
                &mut writer,
                self.endpoint_model_syms(self.alpha_endpoints.len()),
            );
            models[4] = self.write_model(&mut writer, self.alpha_selectors.len() as u32);
        }
        (writer.finish(), models)
    }

    fn write_color_endpoints(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        let dm0 = self.write_model(&mut writer, 32);
        let dm1 = self.write_model(&mut writer, 64);
        let mut prev = [0u32; 6];
        for &endpoint in &self.color_endpoints {
            // Decode order: a, b, c, d, e, f
            let fields = [
                ((endpoint >> 11) & 31, &dm0, 31),
                ((endpoint >> 5) & 63, &dm1, 63),
                (endpoint & 31, &dm0, 31),
                ((endpoint >> 27) & 31, &dm0, 31),
                ((endpoint >> 21) & 63, &dm1, 63),
                ((endpoint >> 16) & 31, &dm0, 31),
            ];
            for (prev, (value, model, mask)) in prev.iter_mut().zip(fields) {
                write_symbol(model, &mut writer, value.wrapping_sub(*prev) & mask);
                *prev = value;
            }
        }
        writer.finish()
    }

    fn write_selectors(
        &self,
        selectors: &[[u8; 16]],
        num_syms: u32,
        mask: u8,
        bias: i32,
    ) -> Vec<u8> {
        let mut writer = BitWriter::new();
        let model = self.write_model(&mut writer, num_syms);
        let radix = bias as u32 * 2 + 1;
        let mut current = [0u8; 16];
        for selector in selectors {
            for (cur, target) in current.chunks_exact_mut(2).zip(selector.chunks_exact(2)) {
                let delta0 = (target[0].wrapping_sub(cur[0]) & mask) as u32;
                let delta1 = (target[1].wrapping_sub(cur[1]) & mask) as u32;
                // Deltas are written as 0..=mask, never above the bias.
                let symbol = (delta0 + bias as u32) + (delta1 + bias as u32) * radix;
                write_symbol(&model, &mut writer, symbol);
                cur[0] = target[0] & mask;
                cur[1] = target[1] & mask;
            }
        }
        writer.finish()
    }

    fn write_alpha_endpoints(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        let model = self.write_model(&mut writer, 256);
        let (mut prev_a, mut prev_b) = (0u8, 0u8);
        for &(a, b) in &self.alpha_endpoints {
            write_symbol(&model, &mut writer, a.wrapping_sub(prev_a) as u32);
            write_symbol(&model, &mut writer, b.wrapping_sub(prev_b) as u32);
            (prev_a, prev_b) = (a, b);
        }
        writer.finish()
    }

    fn write_level(&self, level: usize, models: &[Option<CodedModel>; 5]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        let mut slots = self.slot_writers();
        let blocks = level_blocks(self.width, self.height, level);
        let chunks = (blocks.0.div_ceil(2), blocks.1.div_ceil(2));
        let mut first_endpoint_delta = self.first_endpoint_delta;
        let mut chunk_counter = 0usize;

        for refs in &self.levels[level] {
            for chunk_y in 0..chunks.1 {
                for x in 0..chunks.0 {
                    let chunk_x = if chunk_y & 1 == 1 { chunks.0 - 1 - x } else { x };

                    // One symbol carries the next three encodings, first chunk lowest.
                    if chunk_counter % 3 == 0 {
                        let symbol = (0..3).fold(0, |acc, x| {
                            acc | self.chunk_encoding(chunk_counter + x) << (x * 3)
                        });
                        write_symbol(&models[0], &mut writer, symbol as u32);
                    }
                    let encoding = self.chunk_encoding(chunk_counter);
                    chunk_counter += 1;

                    let tiles = tile_refs(refs, blocks, (chunk_x, chunk_y), encoding);
                    for slot in slots.iter_mut() {
                        let (endpoint_model, _) = component_models(models, slot.component);
                        for tile in &tiles[..CHUNK_ENCODING_NUM_TILES[encoding]] {
                            let target = tile.map_or(slot.prev_endpoint, |r| slot.endpoint(&r));
                            let delta = match first_endpoint_delta.take() {
                                Some(forced) => forced,
                                None => {
                                    wrapping_delta(target, slot.prev_endpoint, slot.num_endpoints)
                                }
                            };
                            write_symbol(endpoint_model, &mut writer, delta);
                            slot.prev_endpoint = target;
                        }
                    }

                    for block in 0..4 {
                        let block_x = chunk_x * 2 + (block & 1);
                        let block_y = chunk_y * 2 + (block >> 1);
                        let visible = block_x < blocks.0 && block_y < blocks.1;
                        for slot in slots.iter_mut() {
                            let (_, selector_model) = component_models(models, slot.component);
                            let target = if visible {
                                slot.selector(&refs[block_y * blocks.0 + block_x])
                            } else {
                                slot.prev_selector
                            };
                            let delta =
                                wrapping_delta(target, slot.prev_selector, slot.num_selectors);
                            write_symbol(selector_model, &mut writer, delta);
                            slot.prev_selector = target;
                        }
                    }
                }
            }
        }
        writer.finish()
    }

    /// Serializes the file.
    ///
    /// Layout: header, Huffman tables, the four palettes, then the levels.
    pub fn build(&self) -> Vec<u8> {
        let num_levels = self.levels.len();
        let header_size = CRN_HEADER_FIXED_SIZE + 4 * num_levels;

        let (tables, models) = self.write_tables();
        let palettes = [
            (self.color_endpoints.len(), self.write_color_endpoints()),
            (
                self.color_selectors.len(),
                self.write_selectors(&self.color_selectors, 49, 3, 3),
            ),
            (self.alpha_endpoints.len(), self.write_alpha_endpoints()),
            (
                self.alpha_selectors.len(),
                self.write_selectors(&self.alpha_selectors, 225, 7, 7),
            ),
        ];

        let mut data = vec![0u8; header_size];
        let tables_offset = data.len();
        data.extend_from_slice(&tables);

        let mut palette_fields = [0u8; 32];
        for ((num, bytes), field) in palettes.iter().zip(palette_fields.chunks_exact_mut(8)) {
            if *num == 0 {
                continue;
            }
            field[0..3].copy_from_slice(&(data.len() as u32).to_be_bytes()[1..]);
            field[3..6].copy_from_slice(&(bytes.len() as u32).to_be_bytes()[1..]);
            field[6..8].copy_from_slice(&(*num as u16).to_be_bytes());
            data.extend_from_slice(bytes);
        }

        let mut level_offsets = Vec::with_capacity(num_levels);
        for level in 0..num_levels {
            level_offsets.push(data.len() as u32);
            let bytes = self.write_level(level, &models);
            data.extend_from_slice(&bytes);
        }

        let data_size = data.len() as u32;
        data[0..2].copy_from_slice(b"Hx");
        data[2..4].copy_from_slice(&(header_size as u16).to_be_bytes());
        data[6..10].copy_from_slice(&data_size.to_be_bytes());
        data[12..14].copy_from_slice(&self.width.to_be_bytes());
        data[14..16].copy_from_slice(&self.height.to_be_bytes());
        data[16] = num_levels as u8;
        data[17] = self.faces;
        data[18] = self.format as u32 as u8;
        data[25..29].copy_from_slice(&self.userdata0.to_be_bytes());
        data[29..33].copy_from_slice(&self.userdata1.to_be_bytes());
        data[33..65].copy_from_slice(&palette_fields);
        data[65..67].copy_from_slice(&(tables.len() as u16).to_be_bytes());
        data[67..70].copy_from_slice(&(tables_offset as u32).to_be_bytes()[1..]);
        for (x, offset) in level_offsets.iter().enumerate() {
            let start = CRN_HEADER_FIXED_SIZE + x * 4;
            data[start..start + 4].copy_from_slice(&offset.to_be_bytes());
        }

        rewrite_checksums(&mut data);
        data
    }

    /// The DXT blocks level `level` unpacks to, one tightly packed buffer per face.
    pub fn expected_level(&self, level: u32) -> Vec<Vec<u8>> {
        let level = level as usize;
        let slots = self.slot_writers();
        let blocks = level_blocks(self.width, self.height, level);
        let block_size = self.format.bytes_per_block() as usize;
        let chunks = (blocks.0.div_ceil(2), blocks.1.div_ceil(2));

        self.levels[level]
            .iter()
            .enumerate()
            .map(|(face_index, refs)| {
                let mut face = vec![0u8; blocks.0 * blocks.1 * block_size];
                for block_y in 0..blocks.1 {
                    for block_x in 0..blocks.0 {
                        let chunk = (block_x / 2, block_y / 2);
                        let encoding = self.chunk_encoding(decode_order(chunks, face_index, chunk));
                        let tiles = tile_refs(refs, blocks, chunk, encoding);
                        let local = (block_x & 1) | ((block_y & 1) << 1);
                        let tile = tiles[CHUNK_TILE_INDICES[encoding][local]].unwrap_or_default();
                        let own = refs[block_y * blocks.0 + block_x];
                        let offset = (block_y * blocks.0 + block_x) * block_size;

                        for slot in &slots {
                            let out = &mut face[offset + slot.byte_offset..][..8];
                            match slot.component {
                                Component::Color => {
                                    let endpoints = self.color_endpoints[slot.endpoint(&tile)];
                                    let selector = &self.color_selectors[slot.selector(&own)];
                                    let selectors = dxt1_selector_bits(selector);
                                    out[0..4].copy_from_slice(&endpoints.to_le_bytes());
                                    out[4..8].copy_from_slice(&selectors.to_le_bytes());
                                }
                                Component::Alpha => {
                                    let (a, b) = self.alpha_endpoints[slot.endpoint(&tile)];
                                    let selector = &self.alpha_selectors[slot.selector(&own)];
                                    let selectors = dxt5_selector_bits(selector);
                                    out[0] = a;
                                    out[1] = b;
                                    out[2..8].copy_from_slice(&selectors.to_le_bytes()[..6]);
                                }
                            }
                        }
                    }
                }
                face
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn bit_writer_is_msb_first() {
        let mut writer = BitWriter::new();
        writer.write_bits(1, 1);
        writer.write_bits(0, 1);
        writer.write_bits(0b10, 2);
        writer.write_bits(0xABC, 12);
        writer.write_bits(1, 1);
        assert_eq!(writer.finish(), vec![0b1010_1010, 0xBC, 0x80]);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 2)]
    #[case(32, 5)]
    #[case(49, 6)]
    #[case(225, 8)]
    #[case(512, 9)]
    fn uniform_code_sizes(#[case] num_syms: u32, #[case] expected: u32) {
        assert_eq!(uniform_code_size(num_syms), expected);
    }

    #[rstest]
    #[case(3, &[1, 2, 2])]
    #[case(4, &[1, 2, 3, 3])]
    #[case(5, &[1, 2, 3, 4, 4])]
    #[case(8, &[1, 2, 3, 5, 5, 5, 6, 6])]
    fn varied_code_sizes_mix_lengths(#[case] num_syms: u32, #[case] expected: &[u8]) {
        assert_eq!(varied_code_sizes(num_syms), expected);
    }

    #[rstest]
    #[case(3)]
    #[case(49)]
    #[case(225)]
    #[case(512)]
    fn varied_code_sizes_are_complete(#[case] num_syms: u32) {
        let sizes = varied_code_sizes(num_syms);
        assert_eq!(sizes.len(), num_syms as usize);
        let kraft: u32 = sizes
            .iter()
            .map(|&x| 1u32 << (MAX_CODE_SIZE - x as u32))
            .sum();
        assert_eq!(kraft, 1 << MAX_CODE_SIZE);
    }

    #[test]
    fn canonical_codes_follow_length_then_symbol() {
        assert_eq!(
            canonical_codes(&[3, 1, 0, 3, 2]),
            vec![(0b110, 3), (0b0, 1), (0, 0), (0b111, 3), (0b10, 2)]
        );
    }

    #[test]
    fn patterned_refs_stay_inside_palettes() {
        let builder = CrnBuilder::patterned(CrnFormat::DxnXY, 20, 12, 3).with_mip_levels(2);
        for face in builder.levels.iter().flatten() {
            for refs in face {
                assert!(refs.alpha_endpoints.iter().all(|&x| x < builder.alpha_endpoints.len()));
                assert!(refs.alpha_selectors.iter().all(|&x| x < builder.alpha_selectors.len()));
            }
        }
    }
}
