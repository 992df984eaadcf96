//! Error type shared by every fallible operation of the decoder.

use thiserror::Error;

/// Errors that can occur while reading or unpacking a CRN file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrnDecompressError {
    /// The buffer is shorter than the header or the size it declares.
    #[error("Data too small: need {needed} bytes, but only {actual} bytes available.")]
    DataTooSmall {
        /// The required size in bytes
        needed: usize,
        /// The actual size in bytes
        actual: usize,
    },

    /// The file does not start with the `Hx` signature.
    #[error("Invalid signature: expected 0x4878 ('Hx'), found {0:#06x}.")]
    InvalidSignature(u16),

    /// A header field is out of range or references data outside the file.
    #[error("Invalid header: {0}")]
    InvalidHeader(&'static str),

    /// The header checksum does not match its contents.
    #[error("Header CRC mismatch: stored {stored:#06x}, computed {computed:#06x}.")]
    HeaderCrcMismatch {
        /// Checksum stored in the header
        stored: u16,
        /// Checksum computed over the header
        computed: u16,
    },

    /// The data checksum does not match the file contents.
    #[error("Data CRC mismatch: stored {stored:#06x}, computed {computed:#06x}.")]
    DataCrcMismatch {
        /// Checksum stored in the header
        stored: u16,
        /// Checksum computed over the data
        computed: u16,
    },

    /// The format tag is unknown, or the format can't be unpacked.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(u32),

    /// The requested level does not exist.
    #[error("Invalid level index {index}: texture has {levels} level(s).")]
    InvalidLevelIndex {
        /// The requested level
        index: u32,
        /// Number of levels in the texture
        levels: u32,
    },

    /// The destination row pitch is below the minimum or not a multiple of 4.
    #[error("Invalid row pitch {pitch}: must be 0 or a multiple of 4 of at least {minimum} bytes.")]
    InvalidRowPitch {
        /// The pitch provided by the caller
        pitch: u32,
        /// The smallest allowed pitch
        minimum: u32,
    },

    /// A destination face buffer can't hold the level.
    #[error("Destination too small: need {needed} bytes, but only {actual} bytes available.")]
    DestinationTooSmall {
        /// The required size in bytes
        needed: usize,
        /// The actual size in bytes
        actual: usize,
    },

    /// The number of destination buffers differs from the number of faces.
    #[error("Face count mismatch: texture has {expected} face(s), {actual} buffer(s) provided.")]
    FaceCountMismatch {
        /// Number of faces in the texture
        expected: u32,
        /// Number of buffers provided
        actual: usize,
    },

    /// A transmitted Huffman model is malformed.
    #[error("Invalid Huffman table: {0}")]
    InvalidHuffmanTable(&'static str),

    /// The bitstream contains an invalid code or symbol.
    #[error("Corrupt stream: {0}")]
    CorruptStream(&'static str),

    /// A decoded palette index points past the end of its palette.
    #[error("Palette index {index} out of range for palette of {size} entries.")]
    PaletteIndexOutOfRange {
        /// The decoded index
        index: u32,
        /// Number of entries in the palette
        size: u32,
    },
}
