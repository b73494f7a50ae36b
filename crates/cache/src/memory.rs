//! In-process cache backend.

use crate::CacheHandler;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

const DEFAULT_NAMESPACE: &str = "localekit";

/// In-memory cache backend.
///
/// Entries live in a `HashMap` behind a [`RwLock`], so every trait method
/// works on `&self` and one instance can be shared through a
/// [`CacheHandle`](crate::CacheHandle). Every instance owns its entries, so
/// the namespace only shows up in diagnostics.
///
/// # Examples
///
/// ```
/// use localekit_cache::{CacheHandler, MemoryCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> localekit_cache::error::Result<()> {
/// let cache = MemoryCache::with_entries([("label:demo:1:1", "Welcome")]).with_namespace("app");
/// let found = cache.pull_multi(&["label:demo:1:1".to_string()], false).await?;
/// assert_eq!(found["label:demo:1:1"].as_deref(), Some("Welcome"));
/// # Ok(())
/// # }
/// ```
pub struct MemoryCache {
    namespace: String,
    ready: AtomicBool,
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create a cache pre-populated with entries.
    pub fn with_entries(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ready: AtomicBool::new(true),
            entries: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Change the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Toggle readiness, e.g. to simulate a backend that is still warming up.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            exn::bail!(ErrorKind::NotReady)
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}:{key}", self.namespace)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        let entries: [(&str, &str); 0] = [];
        Self::with_entries(entries)
    }
}

#[async_trait]
impl CacheHandler for MemoryCache {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    async fn pull_multi(&self, keys: &[String], allow_partial: bool) -> Result<HashMap<String, Option<String>>> {
        self.ensure_ready()?;
        let guard = self.entries.read().await;
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = guard.get(key).cloned();
            if value.is_none() && !allow_partial {
                exn::bail!(ErrorKind::Missing(self.prefixed(key)));
            }
            found.insert(key.clone(), value);
        }
        tracing::trace!(namespace = %self.namespace, requested = keys.len(), "Pulled cache entries");
        Ok(found)
    }

    async fn push_multi(&self, entries: HashMap<String, String>, overwrite: bool) -> Result<()> {
        self.ensure_ready()?;
        let mut guard = self.entries.write().await;
        for (key, value) in entries {
            if overwrite {
                guard.insert(key, value);
            } else {
                guard.entry(key).or_insert(value);
            }
        }
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<()> {
        self.ensure_ready()?;
        self.entries.write().await.clear();
        tracing::debug!(namespace = %self.namespace, "Invalidated cache");
        Ok(())
    }
}
