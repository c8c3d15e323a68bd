//! Error types for the disposition module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while relocating an archive.
#[derive(Debug, Error)]
pub enum DispositionError {
    /// Archive no longer in the inbox.
    #[error("Archive not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create the destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move/rename the archive.
    #[error("Failed to move archive from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Archive has no usable file name.
    #[error("Archive path has no file name: {path}")]
    InvalidName { path: PathBuf },
}

impl DispositionError {
    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}
