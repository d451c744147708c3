//! Error taxonomy for patch steps.
//!
//! A step reports exactly one of:
//! - `EntryNotFound`: an entry the operation requires is absent from the archive
//! - `MalformedContent`: an entry exists but cannot be edited as text

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EntryNotFound,
    MalformedContent,
}

impl ErrorKind {
    /// Stable token for machine-readable output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EntryNotFound => "entry_not_found",
            ErrorKind::MalformedContent => "malformed_content",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::EntryNotFound => f.write_str("entry not found"),
            ErrorKind::MalformedContent => f.write_str("malformed content"),
        }
    }
}

/// Failure of a single patch step, tied to the archive entry it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {path}")]
pub struct PatchError {
    kind: ErrorKind,
    path: String,
}

impl PatchError {
    pub fn new(kind: ErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn entry_not_found(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::EntryNotFound, path)
    }

    pub fn malformed(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedContent, path)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Result type alias using PatchError.
pub type PatchResult<T> = Result<T, PatchError>;
