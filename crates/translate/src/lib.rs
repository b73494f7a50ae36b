//! Cached translation and language detection over cloud providers.
//!
//! A [`Translator`] talks to either Yandex Translate (v1.5) or Google Cloud
//! Translation (v2) through an [`HttpTransport`], and can serve repeated
//! requests from an injected cache.
//!
//! # Architecture
//! - [`provider`] holds the provider, text format and model selectors.
//! - `yandex` and `google` build requests and parse each provider's
//!   responses.
//! - [`transport`] sends requests; [`ReqwestTransport`] is the default.

pub mod error;
mod google;
pub mod provider;
mod translator;
pub mod transport;
mod yandex;

pub use crate::provider::{Model, Provider, TextFormat};
pub use crate::translator::Translator;
pub use crate::transport::{HttpTransport, ReqwestTransport};
pub use crate::yandex::MAX_TEXT_LENGTH as YANDEX_MAX_TEXT_LENGTH;
