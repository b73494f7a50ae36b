//! Package Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A package error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The caller supplied something unusable (empty path, no valid label ids).
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] &'static str),
    /// No package has been opened, or it has been closed.
    #[display("no package connected")]
    NotConnected,
    /// Neither the locale nor its language family exists in the package.
    #[display("unsupported locale: {_0}")]
    UnsupportedLocale(#[error(not(source))] String),
    /// Labels were requested before a locale was set.
    #[display("no locale set")]
    NoLocaleSet,
    /// The package database failed.
    #[display("package store error")]
    Store,
    #[display("unable to read from cache")]
    CacheRead,
    #[display("unable to write to cache")]
    CacheWrite,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
