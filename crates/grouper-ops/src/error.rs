//! Transfer error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while moving, copying or deleting entries.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The entry to transfer does not exist.
    #[error("Source not found: {path}")]
    SourceMissing { path: PathBuf },

    /// Something already occupies the destination.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// A directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying bytes failed.
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory listing could not be read.
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A source entry could not be removed.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Path the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::SourceMissing { path }
            | Self::DestinationExists { path }
            | Self::CreateDir { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Remove { path, .. } => path,
            Self::Copy { from, .. } => from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_path() {
        let err = TransferError::Copy {
            from: PathBuf::from("/in/a.pdf"),
            to: PathBuf::from("/out/a.pdf"),
            source: io::Error::other("disk full"),
        };
        assert_eq!(err.path(), Path::new("/in/a.pdf"));
        assert!(err.to_string().contains("disk full"));
    }
}
