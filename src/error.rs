//! Error types shared by every operation.
//!
//! Only [`TidyError`] ever unwinds to the caller of an operation. [`ItemError`]
//! describes a failure on a single file or folder; operations report it and
//! carry on with the next item.

use crate::config::ConfigError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal errors that abort an operation before any traversal begins.
#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Source directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure scoped to one file or folder.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Skipped (permission denied): {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to move {} to {}: {error}", source_path.display(), destination.display())]
    Move {
        source_path: PathBuf,
        destination: PathBuf,
        error: io::Error,
    },

    #[error("Could not delete {}: {error}", path.display())]
    Delete { path: PathBuf, error: io::Error },

    #[error("Could not read {}: {error}", path.display())]
    Read { path: PathBuf, error: io::Error },

    #[error("Could not create directory {}: {error}", path.display())]
    CreateDir { path: PathBuf, error: io::Error },
}

impl ItemError {
    pub fn moving(source: &Path, destination: &Path, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: source.to_path_buf(),
            };
        }
        Self::Move {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            error,
        }
    }

    pub fn deleting(path: &Path, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: path.to_path_buf(),
            };
        }
        Self::Delete {
            path: path.to_path_buf(),
            error,
        }
    }

    pub fn reading(path: &Path, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: path.to_path_buf(),
            };
        }
        Self::Read {
            path: path.to_path_buf(),
            error,
        }
    }

    pub fn creating_dir(path: &Path, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: path.to_path_buf(),
            };
        }
        Self::CreateDir {
            path: path.to_path_buf(),
            error,
        }
    }

    /// The file or folder the failure is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied { path }
            | Self::Delete { path, .. }
            | Self::Read { path, .. }
            | Self::CreateDir { path, .. } => path,
            Self::Move { source_path, .. } => source_path,
        }
    }
}

pub type Result<T> = std::result::Result<T, TidyError>;
