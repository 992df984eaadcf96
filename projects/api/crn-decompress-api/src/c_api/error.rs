//! C API error codes.

use core::ffi::c_char;
use crn_decompress::CrnDecompressError;

/// C-compatible error codes, for callers that want more than a `bool`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrndErrorCode {
    /// Operation succeeded
    Success = 0,
    /// Null pointer provided for the data parameter
    NullDataPointer = 1,
    /// Null pointer provided for an output parameter
    NullOutputPointer = 2,
    /// The context is null, unknown or already released
    InvalidContext = 3,
    /// `struct_size` does not match the size of the struct
    InvalidStructSize = 4,
    /// The data is shorter than the header or its declared size
    DataTooSmall = 5,
    /// The data does not start with the CRN signature
    InvalidSignature = 6,
    /// A header field is invalid
    InvalidHeader = 7,
    /// The header checksum does not match
    HeaderCrcMismatch = 8,
    /// The data checksum does not match
    DataCrcMismatch = 9,
    /// The format is unknown or can't be unpacked
    UnsupportedFormat = 10,
    /// The level index is out of range
    InvalidLevelIndex = 11,
    /// The row pitch is invalid
    InvalidRowPitch = 12,
    /// A destination buffer is too small
    DestinationTooSmall = 13,
    /// The number of destination buffers does not match the number of faces
    FaceCountMismatch = 14,
    /// A Huffman table in the file is invalid
    InvalidHuffmanTable = 15,
    /// The compressed stream is corrupt
    CorruptStream = 16,
    /// A palette index is out of range
    PaletteIndexOutOfRange = 17,
}

impl From<CrnDecompressError> for CrndErrorCode {
    fn from(error: CrnDecompressError) -> Self {
        match error {
            CrnDecompressError::DataTooSmall { .. } => CrndErrorCode::DataTooSmall,
            CrnDecompressError::InvalidSignature(_) => CrndErrorCode::InvalidSignature,
            CrnDecompressError::InvalidHeader(_) => CrndErrorCode::InvalidHeader,
            CrnDecompressError::HeaderCrcMismatch { .. } => CrndErrorCode::HeaderCrcMismatch,
            CrnDecompressError::DataCrcMismatch { .. } => CrndErrorCode::DataCrcMismatch,
            CrnDecompressError::UnsupportedFormat(_) => CrndErrorCode::UnsupportedFormat,
            CrnDecompressError::InvalidLevelIndex { .. } => CrndErrorCode::InvalidLevelIndex,
            CrnDecompressError::InvalidRowPitch { .. } => CrndErrorCode::InvalidRowPitch,
            CrnDecompressError::DestinationTooSmall { .. } => CrndErrorCode::DestinationTooSmall,
            CrnDecompressError::FaceCountMismatch { .. } => CrndErrorCode::FaceCountMismatch,
            CrnDecompressError::InvalidHuffmanTable(_) => CrndErrorCode::InvalidHuffmanTable,
            CrnDecompressError::CorruptStream(_) => CrndErrorCode::CorruptStream,
            CrnDecompressError::PaletteIndexOutOfRange { .. } => {
                CrndErrorCode::PaletteIndexOutOfRange
            }
        }
    }
}

impl<T> From<Result<T, CrnDecompressError>> for CrndErrorCode {
    fn from(result: Result<T, CrnDecompressError>) -> Self {
        match result {
            Ok(_) => CrndErrorCode::Success,
            Err(e) => e.into(),
        }
    }
}

/// Get a null-terminated string description of the error code.
///
/// The returned string is a static string literal that does not need to be freed.
#[unsafe(no_mangle)]
pub extern "C" fn crnd_error_message(error_code: CrndErrorCode) -> *const c_char {
    let message = match error_code {
        CrndErrorCode::Success => c"Success",
        CrndErrorCode::NullDataPointer => c"Null pointer provided for data parameter",
        CrndErrorCode::NullOutputPointer => c"Null pointer provided for output parameter",
        CrndErrorCode::InvalidContext => c"Unpack context is null, unknown or already released",
        CrndErrorCode::InvalidStructSize => c"struct_size does not match the size of the struct",
        CrndErrorCode::DataTooSmall => c"Data is smaller than the CRN header or its declared size",
        CrndErrorCode::InvalidSignature => c"Data does not start with the CRN signature",
        CrndErrorCode::InvalidHeader => c"Invalid CRN header",
        CrndErrorCode::HeaderCrcMismatch => c"Header CRC mismatch",
        CrndErrorCode::DataCrcMismatch => c"Data CRC mismatch",
        CrndErrorCode::UnsupportedFormat => c"Unsupported texture format",
        CrndErrorCode::InvalidLevelIndex => c"Level index out of range",
        CrndErrorCode::InvalidRowPitch => {
            c"Invalid row pitch: must be 0 or a multiple of 4 no smaller than a row of blocks"
        }
        CrndErrorCode::DestinationTooSmall => c"Destination buffer too small for the level",
        CrndErrorCode::FaceCountMismatch => c"Wrong number of destination buffers",
        CrndErrorCode::InvalidHuffmanTable => c"Invalid Huffman table",
        CrndErrorCode::CorruptStream => c"Corrupt compressed stream",
        CrndErrorCode::PaletteIndexOutOfRange => c"Palette index out of range",
    };
    message.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ffi::CStr;
    use rstest::rstest;

    #[rstest]
    #[case(CrndErrorCode::Success, "Success")]
    #[case(CrndErrorCode::InvalidContext, "Unpack context is null, unknown or already released")]
    #[case(CrndErrorCode::CorruptStream, "Corrupt compressed stream")]
    fn error_message_is_static_c_string(#[case] code: CrndErrorCode, #[case] expected: &str) {
        let message_ptr = crnd_error_message(code);
        assert!(!message_ptr.is_null());
        let message = unsafe { CStr::from_ptr(message_ptr) }.to_str().unwrap();
        assert_eq!(message, expected);
    }

    #[test]
    fn maps_decompress_errors() {
        assert_eq!(
            CrndErrorCode::from(CrnDecompressError::InvalidLevelIndex {
                index: 3,
                levels: 1
            }),
            CrndErrorCode::InvalidLevelIndex
        );
        assert_eq!(
            CrndErrorCode::from(Ok::<(), CrnDecompressError>(())),
            CrndErrorCode::Success
        );
    }
}
