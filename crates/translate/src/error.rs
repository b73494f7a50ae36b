//! Translation Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::provider::Provider;
use derive_more::{Display, Error};
use std::fmt;

/// A translation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for translation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The caller supplied something unusable (empty token, no texts).
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] &'static str),
    /// A text exceeds the provider's per-text limit.
    #[display("text is longer than {_0} characters")]
    TextTooLong(#[error(not(source))] usize),
    /// The HTTP request could not be completed.
    #[display("unable to complete the request")]
    Request,
    /// The provider answered with something that does not match its API.
    #[display("invalid response from {_0}")]
    InvalidProviderResponse(#[error(not(source))] Provider),
    /// The provider answered with an error status.
    #[display("{_0}")]
    Provider(#[error(not(source))] ProviderStatus),
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

/// An error status reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub code: i64,
    /// Free-form message sent along with the status, if any.
    pub message: Option<String>,
}

impl ProviderStatus {
    pub fn new(provider: Provider, code: i64, message: Option<String>) -> Self {
        Self { provider, code, message }
    }

    /// Fixed description of the status code.
    pub fn description(&self) -> &'static str {
        match (self.provider, self.code) {
            (Provider::Yandex, 401) => "the API key is not valid",
            (Provider::Yandex, 402) => "the API key has been blocked",
            (Provider::Yandex, 404) => "the daily translation limit has been exceeded",
            (Provider::Yandex, 413) => "the text is too long",
            (Provider::Yandex, 422) => "the text cannot be translated",
            (Provider::Yandex, 501) => "the translation direction is not supported",
            _ => "unexpected error",
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error {}: {}", self.provider, self.code, self.description())?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(401, "the API key is not valid")]
    #[case(402, "the API key has been blocked")]
    #[case(404, "the daily translation limit has been exceeded")]
    #[case(413, "the text is too long")]
    #[case(422, "the text cannot be translated")]
    #[case(501, "the translation direction is not supported")]
    #[case(500, "unexpected error")]
    fn test_yandex_descriptions(#[case] code: i64, #[case] expected: &str) {
        assert_eq!(ProviderStatus::new(Provider::Yandex, code, None).description(), expected);
    }

    #[test]
    fn test_google_status_is_always_unexpected() {
        let status = ProviderStatus::new(Provider::Google, 401, Some("API key not valid".to_string()));
        assert_eq!(status.description(), "unexpected error");
        assert_eq!(status.to_string(), "google error 401: unexpected error (API key not valid)");
    }
}
