//! Error type of the high level API.

use crn_decompress::{CrnDecompressError, CrnFormat};
use crn_decompress_common::allocate::AllocateError;
use crn_decompress_common::rgba::ExpandError;
use thiserror::Error;

/// Errors that can occur while decoding through [`CrunchedData`](crate::CrunchedData).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrnApiError {
    /// The file is invalid, or a level failed to unpack.
    #[error(transparent)]
    Decompress(#[from] CrnDecompressError),

    /// Memory allocation failed.
    #[error("Memory allocation failed: {0}")]
    AllocationFailed(#[from] AllocateError),

    /// Expanding blocks to RGBA failed.
    #[error(transparent)]
    Expand(#[from] ExpandError),

    /// The format has no RGBA decoder.
    #[error("Format {0} can't be decoded to RGBA.")]
    RgbaUnsupported(CrnFormat),

    /// The requested face does not exist.
    #[error("Invalid face index {index}: texture has {faces} face(s).")]
    InvalidFaceIndex {
        /// The requested face
        index: u32,
        /// Number of faces in the texture
        faces: u32,
    },
}
