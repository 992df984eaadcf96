//! Canonical static Huffman models.
//!
//! Codes are assigned by increasing code length, then increasing symbol index.
//! Short codes are resolved with a single table lookup, longer ones by walking
//! the per-length code ranges.

use crate::error::CrnDecompressError;
use alloc::vec;
use alloc::vec::Vec;

/// Longest code length a model may use.
pub(crate) const MAX_CODE_SIZE: u32 = 16;
/// Largest alphabet a model may use.
pub(crate) const MAX_SUPPORTED_SYMS: u32 = 8192;
/// Codes up to this length are decoded with one table lookup.
const MAX_TABLE_BITS: u32 = 11;

#[derive(Debug, Clone, Copy, Default)]
struct TableEntry {
    symbol: u16,
    /// 0 when no code of length <= table bits has this prefix.
    len: u8,
}

/// A decoder for one canonical Huffman code.
#[derive(Debug, Clone, Default)]
pub(crate) struct HuffmanModel {
    max_code_size: u32,
    table_bits: u32,
    table: Vec<TableEntry>,
    /// First canonical code of each length.
    first_code: [u32; MAX_CODE_SIZE as usize + 1],
    /// Number of codes of each length.
    count: [u32; MAX_CODE_SIZE as usize + 1],
    /// Index into `sorted_symbols` of the first symbol of each length.
    first_index: [u32; MAX_CODE_SIZE as usize + 1],
    /// Symbols ordered by (code length, symbol).
    sorted_symbols: Vec<u16>,
}

impl HuffmanModel {
    /// Builds a model from per-symbol code lengths, 0 meaning the symbol is unused.
    ///
    /// An empty alphabet is allowed and gives a model that fails every decode.
    pub(crate) fn from_code_sizes(code_sizes: &[u8]) -> Result<Self, CrnDecompressError> {
        if code_sizes.len() > MAX_SUPPORTED_SYMS as usize {
            return Err(CrnDecompressError::InvalidHuffmanTable("too many symbols"));
        }

        let mut model = Self::default();

        for &size in code_sizes {
            if size as u32 > MAX_CODE_SIZE {
                return Err(CrnDecompressError::InvalidHuffmanTable(
                    "code size too long",
                ));
            }
            model.count[size as usize] += 1;
        }
        model.count[0] = 0;

        let used: u32 = model.count.iter().sum();
        if used == 0 {
            return Ok(model);
        }

        // Kraft inequality: reject oversubscribed code length sets.
        let kraft: u32 = (1..=MAX_CODE_SIZE)
            .map(|len| model.count[len as usize] << (MAX_CODE_SIZE - len))
            .sum();
        if kraft > 1 << MAX_CODE_SIZE {
            return Err(CrnDecompressError::InvalidHuffmanTable(
                "code lengths are oversubscribed",
            ));
        }

        let mut code = 0u32;
        let mut index = 0u32;
        for len in 1..=MAX_CODE_SIZE as usize {
            code <<= 1;
            model.first_code[len] = code;
            model.first_index[len] = index;
            code += model.count[len];
            index += model.count[len];
            if model.count[len] != 0 {
                model.max_code_size = len as u32;
            }
        }

        let mut next_slot = model.first_index;
        model.sorted_symbols = vec![0u16; used as usize];
        for (symbol, &size) in code_sizes.iter().enumerate() {
            if size != 0 {
                let slot = &mut next_slot[size as usize];
                model.sorted_symbols[*slot as usize] = symbol as u16;
                *slot += 1;
            }
        }

        model.table_bits = model.max_code_size.min(MAX_TABLE_BITS);
        model.table = vec![TableEntry::default(); 1 << model.table_bits];
        for len in 1..=model.table_bits {
            let first_index = model.first_index[len as usize];
            for offset in 0..model.count[len as usize] {
                let code = model.first_code[len as usize] + offset;
                let symbol = model.sorted_symbols[(first_index + offset) as usize];
                let shift = model.table_bits - len;
                let start = (code << shift) as usize;
                for entry in &mut model.table[start..start + (1 << shift)] {
                    *entry = TableEntry {
                        symbol,
                        len: len as u8,
                    };
                }
            }
        }

        Ok(model)
    }

    /// Whether no symbol has a code.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.sorted_symbols.is_empty()
    }

    /// Resolves the symbol whose code prefixes `bits`, the next 16 bits of the
    /// stream, MSB aligned.
    ///
    /// # Returns
    ///
    /// `(symbol, code_length)`, or [`None`] for an invalid code.
    #[inline(always)]
    pub(crate) fn decode_peeked(&self, bits: u32) -> Option<(u32, u32)> {
        if self.table_bits == 0 {
            return None;
        }

        let entry = self.table[(bits >> (MAX_CODE_SIZE - self.table_bits)) as usize];
        if entry.len != 0 {
            return Some((entry.symbol as u32, entry.len as u32));
        }

        for len in self.table_bits + 1..=self.max_code_size {
            let code = bits >> (MAX_CODE_SIZE - len);
            let offset = code.wrapping_sub(self.first_code[len as usize]);
            if offset < self.count[len as usize] {
                let index = self.first_index[len as usize] + offset;
                return Some((self.sorted_symbols[index as usize] as u32, len));
            }
        }
        None
    }
}
