//! Loader Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A loader error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No native build ships for this host. Fatal: nothing will change
    /// without a different host or a custom name mapper.
    #[display("no native library for host: {os} / {arch}")]
    UnsupportedHost {
        os: String,
        arch: String,
    },
    /// The embedded bundle lacks a payload it should carry. This is a
    /// packaging defect, not a runtime condition.
    #[display("embedded bundle is missing resource: {_0}")]
    MissingResource(#[error(not(source))] String),
    /// Underlying I/O error. Staging state is left untouched, so the
    /// whole call is safe to retry.
    #[display("I/O error: {_0}")]
    Io(IoError),
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
