//! Error taxonomy shared by every operation.
//!
//! Each variant maps to one machine-readable kind that callers see verbatim in
//! the `error.kind` field of a failed response. Host-level `io::Error`s are
//! folded into these kinds by [`FsError::from_io`]; raw OS errors never reach
//! the transport.

use std::io;
use std::path::Path;

use serde::Serialize;
use strum::Display;

/// Machine-readable failure kind, serialised exactly as named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    NotADirectory,
    AlreadyExistsAsFile,
    PermissionDenied,
    DecodeError,
    PatternError,
    #[serde(rename = "IOError")]
    #[strum(serialize = "IOError")]
    IoError,
}

/// A failed operation: one kind plus a human-readable message.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotADirectory(String),
    #[error("{0}")]
    AlreadyExistsAsFile(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    DecodeError(String),
    #[error("{0}")]
    PatternError(String),
    #[error("{0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::NotADirectory(_) => ErrorKind::NotADirectory,
            FsError::AlreadyExistsAsFile(_) => ErrorKind::AlreadyExistsAsFile,
            FsError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            FsError::DecodeError(_) => ErrorKind::DecodeError,
            FsError::PatternError(_) => ErrorKind::PatternError,
            FsError::Io(_) => ErrorKind::IoError,
        }
    }

    /// Translate a host I/O error raised while `action` was touching `path`.
    pub fn from_io(err: io::Error, action: &str, path: &Path) -> Self {
        let message = format!("Failed to {} '{}': {}", action, path.display(), err);
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(message),
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied(message),
            io::ErrorKind::NotADirectory => FsError::NotADirectory(message),
            _ => FsError::Io(message),
        }
    }
}
