//! Read-only access to localekit label packages.
//!
//! A package is a SQLite database shipped alongside an application. It is
//! treated as immutable: the connection is opened read-only and only the
//! fixed set of parameterized `SELECT`s in [`Repository`] is ever issued.
//!
//! # Architecture
//! - [`Store`] owns the single connection to one package file.
//! - [`Repository`] runs the locale, label and metadata lookups against it.

mod db;
pub mod error;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
mod models;
mod repo;

pub use crate::db::Store;
pub use crate::models::{Label, LabelId, Locale};
pub use crate::repo::Repository;
