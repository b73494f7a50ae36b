//! Cache capability used by localekit for label and translation lookups.
//!
//! Callers never pick a backend themselves: a [`CacheHandle`] is injected at
//! construction time, and everything talks to it through [`CacheHandler`].

pub mod error;
mod memory;

pub use crate::memory::MemoryCache;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub type CacheHandle = Arc<dyn CacheHandler>;

/// Batched key/value cache.
///
/// Keys passed in and returned are *unprefixed*: namespacing is the backend's
/// concern, so the same keys can be shared between backends configured with
/// different namespaces.
///
/// # Examples
///
/// ```
/// use localekit_cache::{CacheHandler, MemoryCache};
/// use std::collections::HashMap;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> localekit_cache::error::Result<()> {
/// let cache = MemoryCache::default();
/// cache.push_multi(HashMap::from([("greeting".to_string(), "Hello".to_string())]), true).await?;
///
/// let keys = ["greeting".to_string(), "farewell".to_string()];
/// let found = cache.pull_multi(&keys, true).await?;
/// assert_eq!(found["greeting"].as_deref(), Some("Hello"));
/// assert_eq!(found["farewell"], None);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait CacheHandler: Send + Sync {
    /// Namespace the backend keeps its entries under.
    fn namespace(&self) -> &str;

    /// Whether the backend can currently serve requests.
    fn is_ready(&self) -> bool;

    /// Fetch many keys in one round trip.
    ///
    /// Every requested key is present in the result; absent entries map to
    /// `None` when `allow_partial` is set, otherwise the first absent key is
    /// an error.
    async fn pull_multi(&self, keys: &[String], allow_partial: bool) -> Result<HashMap<String, Option<String>>>;

    /// Store many entries in one round trip. Existing entries are kept
    /// unless `overwrite` is set.
    async fn push_multi(&self, entries: HashMap<String, String>, overwrite: bool) -> Result<()>;

    /// Drop every entry in this backend's namespace.
    async fn invalidate_all(&self) -> Result<()>;
}
