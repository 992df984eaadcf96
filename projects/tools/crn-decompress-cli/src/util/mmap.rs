use crate::error::CliError;
use lightweight_mmap::handles::*;
use lightweight_mmap::mmap::*;
use std::path::Path;

/// Memory maps `path` for reading and hands the contents to `f`.
///
/// The mapping is released once `f` returns.
pub fn with_mapped_file<T>(
    path: &Path,
    f: impl FnOnce(&[u8]) -> Result<T, CliError>,
) -> Result<T, CliError> {
    let handle =
        ReadOnlyFileHandle::open(path).map_err(|e| CliError::MmapError(e.to_string()))?;
    let size = handle
        .size()
        .map_err(|e| CliError::MmapError(e.to_string()))? as usize;
    if size == 0 {
        return f(&[]);
    }

    let mapping =
        ReadOnlyMmap::new(&handle, 0, size).map_err(|e| CliError::MmapError(e.to_string()))?;
    f(mapping.as_slice())
}

/// Creates `path` with `size` bytes preallocated and hands a writable mapping of it to `f`.
pub fn with_output_mapping<T>(
    path: &Path,
    size: usize,
    f: impl FnOnce(&mut [u8]) -> Result<T, CliError>,
) -> Result<T, CliError> {
    let handle = ReadWriteFileHandle::create_preallocated(path, size as i64)
        .map_err(|e| CliError::MmapError(e.to_string()))?;
    let mut mapping =
        ReadWriteMmap::new(&handle, 0, size).map_err(|e| CliError::MmapError(e.to_string()))?;
    f(mapping.as_mut_slice())
}
