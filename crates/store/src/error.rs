//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The caller supplied something unusable (empty path, empty code).
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] &'static str),
    /// The package file could not be opened.
    #[display("unable to connect to the package")]
    Connect,
    #[display("database error")]
    Database,
    /// A row came back in a shape the package format does not allow.
    #[display("invalid package data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
