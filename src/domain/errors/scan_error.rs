//! Folder scan error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while listing a folder of images.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The directory exists but could not be listed.
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The path does not name a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}
