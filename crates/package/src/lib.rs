//! Localized labels from read-only localekit packages.
//!
//! A [`Package`] opens one SQLite label package, resolves the locale labels
//! are served in (falling back from a regional code to its language family),
//! and fetches labels through an optional injected cache.
//!
//! # Architecture
//! - [`locale`] resolves requested locale codes.
//! - [`labels`] implements the cache-aside fetch used by [`Package::labels`].
//! - Cache keys are namespaced by a per-package identifier: the value embedded
//!   in the package, or a digest of its path.

pub mod error;
mod identifier;
pub mod labels;
pub mod locale;
mod package;

pub use crate::locale::ResolvedLocale;
pub use crate::package::Package;
pub use localekit_store::{LabelId, Locale};
