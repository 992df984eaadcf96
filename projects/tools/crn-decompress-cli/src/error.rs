use crn_decompress_api::CrnApiError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Memory mapping failed: {0}")]
    MmapError(String),
    #[error("{}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: CrnApiError,
    },
    /// The file does not carry the `.crn` extension and was skipped.
    #[error("Not a CRN file")]
    IgnoredByFilter,
}

impl CliError {
    /// Wraps a decoder error with the path of the file being processed.
    pub fn decompress(path: impl Into<PathBuf>, source: impl Into<CrnApiError>) -> Self {
        Self::Decompress {
            path: path.into(),
            source: source.into(),
        }
    }
}
