//! Structural errors raised while walking a secrets tree.
//!
//! Only directory-level failures are errors. An unreadable credential file is
//! logged and replaced by an empty value, so it never shows up here.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for tree loading operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Failures that abort a load with no partial result.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The secrets root exists but is not a directory.
    #[error("secrets path must be a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Metadata for the secrets root could not be read.
    #[error("cannot access secrets path {}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A root, service or instance directory could not be listed.
    #[error("error reading directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TreeError {
    pub(crate) fn stat(path: &Path, source: io::Error) -> Self {
        Self::Stat {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn read_dir(path: &Path, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path of the directory that failed.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotADirectory { path } | Self::Stat { path, .. } | Self::ReadDir { path, .. } => {
                path.as_path()
            }
        }
    }
}
