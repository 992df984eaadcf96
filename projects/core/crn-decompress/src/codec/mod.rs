//! Bit level decoding: a zero padded MSB-first bit reader and the static
//! Huffman models transmitted inside CRN files.

mod bit_reader;
mod huffman;

pub(crate) use bit_reader::BitReader;
pub(crate) use huffman::{HuffmanModel, MAX_CODE_SIZE, MAX_SUPPORTED_SYMS};

use crate::error::CrnDecompressError;
use alloc::vec;
use likely_stable::unlikely;

/// Number of symbols in the code length alphabet.
pub(crate) const MAX_CODELENGTH_CODES: usize = 21;
/// Order in which the code length code sizes are transmitted.
pub(crate) const MOST_PROBABLE_CODELENGTH_CODES: [u8; MAX_CODELENGTH_CODES] = [
    17, 18, 19, 20, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15, 16,
];

/// Code length symbol: run of 3-10 zeros.
pub(crate) const SMALL_ZERO_RUN_CODE: u32 = 17;
/// Code length symbol: run of 11-138 zeros.
pub(crate) const LARGE_ZERO_RUN_CODE: u32 = 18;
/// Code length symbol: 3-6 repeats of the previous length.
pub(crate) const SMALL_REPEAT_CODE: u32 = 19;
/// Code length symbol: 7-70 repeats of the previous length.
pub(crate) const LARGE_REPEAT_CODE: u32 = 20;

pub(crate) const SMALL_ZERO_RUN_EXTRA_BITS: u32 = 3;
pub(crate) const SMALL_MIN_NON_ZERO_RUN_SIZE: u32 = 3;
pub(crate) const LARGE_ZERO_RUN_EXTRA_BITS: u32 = 7;
pub(crate) const LARGE_MIN_ZERO_RUN_SIZE: u32 = 11;
pub(crate) const SMALL_REPEAT_EXTRA_BITS: u32 = 2;
pub(crate) const SMALL_MIN_REPEAT_SIZE: u32 = 3;
pub(crate) const LARGE_REPEAT_EXTRA_BITS: u32 = 6;
pub(crate) const LARGE_MIN_REPEAT_SIZE: u32 = 7;

/// Reads raw bits and Huffman coded symbols from one compressed stream.
pub(crate) struct SymbolDecoder<'a> {
    bits: BitReader<'a>,
}

impl<'a> SymbolDecoder<'a> {
    /// Starts decoding `data`, which must not be empty.
    pub(crate) fn new(data: &'a [u8]) -> Result<Self, CrnDecompressError> {
        if data.is_empty() {
            return Err(CrnDecompressError::CorruptStream("empty stream"));
        }
        Ok(Self {
            bits: BitReader::new(data),
        })
    }

    /// Reads `num_bits` (0..=32) raw bits.
    #[inline(always)]
    pub(crate) fn decode_bits(&mut self, num_bits: u32) -> u32 {
        self.bits.read_bits(num_bits)
    }

    /// Decodes one symbol with `model`.
    #[inline(always)]
    pub(crate) fn decode(&mut self, model: &HuffmanModel) -> Result<u32, CrnDecompressError> {
        let peeked = self.bits.peek(MAX_CODE_SIZE);
        match model.decode_peeked(peeked) {
            Some((symbol, len)) => {
                self.bits.consume(len);
                Ok(symbol)
            }
            None => Err(CrnDecompressError::CorruptStream("invalid Huffman code")),
        }
    }

    /// Reads a static Huffman model from the stream.
    ///
    /// Layout: used symbol count (14 bits, 0 gives an empty model), number of code
    /// length code sizes (5 bits), the sizes (3 bits each) in
    /// [`MOST_PROBABLE_CODELENGTH_CODES`] order, then the run length coded code lengths.
    pub(crate) fn receive_static_model(&mut self) -> Result<HuffmanModel, CrnDecompressError> {
        let total_used_syms = self.decode_bits(14);
        if total_used_syms == 0 {
            return HuffmanModel::from_code_sizes(&[]);
        }
        if total_used_syms > MAX_SUPPORTED_SYMS {
            return Err(CrnDecompressError::InvalidHuffmanTable("too many symbols"));
        }

        let num_codelength_codes = self.decode_bits(5) as usize;
        if num_codelength_codes < 1 || num_codelength_codes > MAX_CODELENGTH_CODES {
            return Err(CrnDecompressError::InvalidHuffmanTable(
                "bad code length code count",
            ));
        }

        let mut codelength_sizes = [0u8; MAX_CODELENGTH_CODES];
        for &symbol in &MOST_PROBABLE_CODELENGTH_CODES[..num_codelength_codes] {
            codelength_sizes[symbol as usize] = self.decode_bits(3) as u8;
        }
        let codelength_model = HuffmanModel::from_code_sizes(&codelength_sizes)?;
        if codelength_model.is_empty() {
            return Err(CrnDecompressError::InvalidHuffmanTable(
                "empty code length model",
            ));
        }

        let total = total_used_syms as usize;
        let mut code_sizes = vec![0u8; total];
        let mut ofs = 0usize;
        while ofs < total {
            let remaining = total - ofs;
            let code = self.decode(&codelength_model)?;

            if code <= 16 {
                code_sizes[ofs] = code as u8;
                ofs += 1;
                continue;
            }

            let run = match code {
                SMALL_ZERO_RUN_CODE => {
                    self.decode_bits(SMALL_ZERO_RUN_EXTRA_BITS) + SMALL_MIN_NON_ZERO_RUN_SIZE
                }
                LARGE_ZERO_RUN_CODE => {
                    self.decode_bits(LARGE_ZERO_RUN_EXTRA_BITS) + LARGE_MIN_ZERO_RUN_SIZE
                }
                SMALL_REPEAT_CODE => {
                    self.decode_bits(SMALL_REPEAT_EXTRA_BITS) + SMALL_MIN_REPEAT_SIZE
                }
                LARGE_REPEAT_CODE => {
                    self.decode_bits(LARGE_REPEAT_EXTRA_BITS) + LARGE_MIN_REPEAT_SIZE
                }
                _ => {
                    return Err(CrnDecompressError::InvalidHuffmanTable(
                        "invalid code length symbol",
                    ))
                }
            } as usize;

            if unlikely(run > remaining) {
                return Err(CrnDecompressError::InvalidHuffmanTable(
                    "code length run overflows the alphabet",
                ));
            }

            if code == SMALL_ZERO_RUN_CODE || code == LARGE_ZERO_RUN_CODE {
                // Already zeroed.
                ofs += run;
                continue;
            }

            let prev = match ofs.checked_sub(1).map(|x| code_sizes[x]) {
                Some(prev) if prev != 0 => prev,
                _ => {
                    return Err(CrnDecompressError::InvalidHuffmanTable(
                        "repeat without a previous code length",
                    ))
                }
            };
            code_sizes[ofs..ofs + run].fill(prev);
            ofs += run;
        }

        HuffmanModel::from_code_sizes(&code_sizes)
    }
}
