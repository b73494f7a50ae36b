//! Cache-aside label lookups.
//!
//! A fetch costs at most one cache read, one store query (for the misses
//! only) and one cache write. Ids the store does not know about are left out
//! of the result and never cached.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use localekit_cache::CacheHandler;
use localekit_store::{Label, LabelId, Repository};
use std::collections::{HashMap, HashSet};

/// Where labels come from on a cache miss.
#[async_trait]
pub trait LabelSource: Send + Sync {
    async fn labels(&self, locale: i64, ids: &[LabelId]) -> localekit_store::error::Result<Vec<Label>>;
}

#[async_trait]
impl LabelSource for Repository {
    async fn labels(&self, locale: i64, ids: &[LabelId]) -> localekit_store::error::Result<Vec<Label>> {
        Repository::labels(self, locale, ids).await
    }
}

/// Drop invalid ids (zero, empty, non-positive numeric strings) and
/// duplicates, keeping the first occurrence of each.
pub fn valid_ids(ids: impl IntoIterator<Item = LabelId>) -> Vec<LabelId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| id.is_valid() && seen.insert(id.clone())).collect()
}

/// Fetches labels of one locale of one package.
pub struct LabelFetcher<'a> {
    source: &'a dyn LabelSource,
    cache: Option<&'a dyn CacheHandler>,
    identifier: &'a str,
    locale: i64,
}

impl<'a> LabelFetcher<'a> {
    pub fn new(source: &'a dyn LabelSource, identifier: &'a str, locale: i64) -> Self {
        Self {
            source,
            cache: None,
            identifier,
            locale,
        }
    }

    pub fn with_cache(mut self, cache: &'a dyn CacheHandler) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Cache key of a label: `label:{identifier}:{locale}:{id}`, where text
    /// ids are replaced by their BLAKE3 digest.
    pub fn key(&self, id: &LabelId) -> String {
        let id = match id {
            LabelId::Numeric(n) => n.to_string(),
            LabelId::Text(s) => blake3::hash(s.as_bytes()).to_hex().to_string(),
        };
        format!("label:{}:{}:{id}", self.identifier, self.locale)
    }

    /// Fetch the given labels, consulting the cache first unless
    /// `bypass_cache` is set or no ready cache is attached.
    ///
    /// Ids are expected to have gone through [`valid_ids`]; repeated ids
    /// collapse into one entry regardless.
    pub async fn fetch(&self, ids: &[LabelId], bypass_cache: bool) -> Result<HashMap<LabelId, String>> {
        let ids = valid_ids(ids.iter().cloned());
        let cache = match self.cache {
            Some(cache) if !bypass_cache && cache.is_ready() => cache,
            _ => return self.query(&ids).await,
        };

        let keys: Vec<String> = ids.iter().map(|id| self.key(id)).collect();
        let mut cached = cache.pull_multi(&keys, true).await.or_raise(|| ErrorKind::CacheRead)?;
        let mut found = HashMap::with_capacity(ids.len());
        let mut misses = Vec::new();
        for (id, key) in ids.into_iter().zip(&keys) {
            match cached.remove(key).flatten() {
                Some(value) => {
                    found.insert(id, value);
                },
                None => misses.push(id),
            }
        }
        tracing::debug!(hits = found.len(), misses = misses.len(), "Label cache lookup");
        if misses.is_empty() {
            return Ok(found);
        }

        let fetched = self.query(&misses).await?;
        if !fetched.is_empty() {
            let entries = fetched.iter().map(|(id, value)| (self.key(id), value.clone())).collect();
            cache.push_multi(entries, true).await.or_raise(|| ErrorKind::CacheWrite)?;
        }
        found.extend(fetched);
        Ok(found)
    }

    async fn query(&self, ids: &[LabelId]) -> Result<HashMap<LabelId, String>> {
        let rows = self.source.labels(self.locale, ids).await.or_raise(|| ErrorKind::Store)?;
        Ok(rows.into_iter().map(|label| (label.id, label.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localekit_cache::MemoryCache;
    use localekit_cache::error::{ErrorKind as CacheErrorKind, Result as CacheResult};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory label source recording the ids of every query.
    struct RecordingSource {
        labels: HashMap<LabelId, String>,
        queries: Mutex<Vec<Vec<LabelId>>>,
    }

    impl RecordingSource {
        fn new(labels: &[(LabelId, &str)]) -> Self {
            Self {
                labels: labels.iter().map(|(id, v)| (id.clone(), v.to_string())).collect(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<Vec<LabelId>> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LabelSource for RecordingSource {
        async fn labels(&self, _locale: i64, ids: &[LabelId]) -> localekit_store::error::Result<Vec<Label>> {
            self.queries.lock().unwrap().push(ids.to_vec());
            Ok(ids
                .iter()
                .filter_map(|id| self.labels.get(id).map(|v| Label { id: id.clone(), value: v.clone() }))
                .collect())
        }
    }

    /// Label source whose every query fails.
    #[derive(Default)]
    struct BrokenSource {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl LabelSource for BrokenSource {
        async fn labels(&self, _locale: i64, _ids: &[LabelId]) -> localekit_store::error::Result<Vec<Label>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            exn::bail!(localekit_store::error::ErrorKind::Database)
        }
    }

    /// Memory cache counting round trips, optionally failing them.
    #[derive(Default)]
    struct CountingCache {
        inner: MemoryCache,
        pulls: AtomicUsize,
        pushes: AtomicUsize,
        fail_pull: bool,
        fail_push: bool,
    }

    #[async_trait]
    impl CacheHandler for CountingCache {
        fn namespace(&self) -> &str {
            self.inner.namespace()
        }

        fn is_ready(&self) -> bool {
            self.inner.is_ready()
        }

        async fn pull_multi(&self, keys: &[String], allow_partial: bool) -> CacheResult<HashMap<String, Option<String>>> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            if self.fail_pull {
                exn::bail!(CacheErrorKind::Backend("pull refused".to_string()));
            }
            self.inner.pull_multi(keys, allow_partial).await
        }

        async fn push_multi(&self, entries: HashMap<String, String>, overwrite: bool) -> CacheResult<()> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            if self.fail_push {
                exn::bail!(CacheErrorKind::Backend("push refused".to_string()));
            }
            self.inner.push_multi(entries, overwrite).await
        }

        async fn invalidate_all(&self) -> CacheResult<()> {
            self.inner.invalidate_all().await
        }
    }

    fn ids(ids: &[u64]) -> Vec<LabelId> {
        ids.iter().map(|&n| LabelId::from(n)).collect()
    }

    fn sample_source() -> RecordingSource {
        RecordingSource::new(&[
            (LabelId::from(1u64), "Welcome"),
            (LabelId::from(2u64), "Hello"),
            (LabelId::from(3u64), "Goodbye"),
            (LabelId::from(4u64), "Thanks"),
            (LabelId::from("menu.title"), "Main menu"),
        ])
    }

    #[test]
    fn test_valid_ids_filters_and_dedupes() {
        let input = vec![
            LabelId::from(3u64),
            LabelId::from(0u64),
            LabelId::from(""),
            LabelId::from("-2"),
            LabelId::from("3"),
            LabelId::from("menu.title"),
            LabelId::from(1u64),
        ];
        assert_eq!(
            valid_ids(input),
            vec![LabelId::from(3u64), LabelId::from("menu.title"), LabelId::from(1u64)]
        );
    }

    #[test]
    fn test_key_format() {
        let source = sample_source();
        let fetcher = LabelFetcher::new(&source, "demo-package", 2);
        assert_eq!(fetcher.key(&LabelId::from(5u64)), "label:demo-package:2:5");
        let text = fetcher.key(&LabelId::from("menu.title"));
        let digest = blake3::hash(b"menu.title").to_hex().to_string();
        assert_eq!(text, format!("label:demo-package:2:{digest}"));
    }

    #[tokio::test]
    async fn test_without_cache_queries_store_once() {
        let source = sample_source();
        let fetcher = LabelFetcher::new(&source, "demo", 1);
        let found = fetcher.fetch(&ids(&[1, 2, 99]), false).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&LabelId::from(1u64)], "Welcome");
        assert!(!found.contains_key(&LabelId::from(99u64)));
        assert_eq!(source.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let source = sample_source();
        let cache = CountingCache::default();
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        let first = fetcher.fetch(&ids(&[1, 2, 3]), false).await.unwrap();
        let second = fetcher.fetch(&ids(&[1, 2, 3]), false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.queries().len(), 1);
        assert_eq!(cache.pulls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.pushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlapping_fetch_queries_only_new_ids() {
        let source = sample_source();
        let cache = CountingCache::default();
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        fetcher.fetch(&ids(&[1, 2, 3]), false).await.unwrap();
        let found = fetcher.fetch(&ids(&[2, 3, 4]), false).await.unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[&LabelId::from(4u64)], "Thanks");
        assert_eq!(source.queries(), vec![ids(&[1, 2, 3]), ids(&[4])]);
    }

    #[tokio::test]
    async fn test_partial_hits_query_exactly_the_misses() {
        let source = sample_source();
        let cache = CountingCache {
            inner: MemoryCache::with_entries([("label:demo:1:1", "Cached welcome")]),
            ..Default::default()
        };
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        let found = fetcher.fetch(&[LabelId::from(1u64), LabelId::from("menu.title")], false).await.unwrap();
        assert_eq!(found[&LabelId::from(1u64)], "Cached welcome");
        assert_eq!(found[&LabelId::from("menu.title")], "Main menu");
        assert_eq!(source.queries(), vec![vec![LabelId::from("menu.title")]]);
        assert_eq!(cache.inner.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_cached() {
        let source = sample_source();
        let cache = CountingCache::default();
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        let found = fetcher.fetch(&ids(&[98, 99]), false).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(cache.pushes.load(Ordering::SeqCst), 0);

        fetcher.fetch(&ids(&[98, 99]), false).await.unwrap();
        assert_eq!(source.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_bypass_skips_cache() {
        let source = sample_source();
        let cache = CountingCache {
            inner: MemoryCache::with_entries([("label:demo:1:1", "Stale")]),
            ..Default::default()
        };
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        let found = fetcher.fetch(&ids(&[1]), true).await.unwrap();
        assert_eq!(found[&LabelId::from(1u64)], "Welcome");
        assert_eq!(cache.pulls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.pushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_not_ready_goes_to_store() {
        let source = sample_source();
        let cache = CountingCache::default();
        cache.inner.set_ready(false);
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        let found = fetcher.fetch(&ids(&[1, 2]), false).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(cache.pulls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapse() {
        let source = sample_source();
        let fetcher = LabelFetcher::new(&source, "demo", 1);
        let found = fetcher.fetch(&[LabelId::from(2u64), LabelId::from("2"), LabelId::from(2u64)], false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(source.queries(), vec![ids(&[2])]);
    }

    #[tokio::test]
    async fn test_cache_read_failure_aborts() {
        let source = sample_source();
        let cache = CountingCache {
            fail_pull: true,
            ..Default::default()
        };
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);
        let err = fetcher.fetch(&ids(&[1]), false).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::CacheRead));
        assert!(source.queries().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_cached() {
        let source = BrokenSource::default();
        let cache = CountingCache {
            inner: MemoryCache::with_entries([("label:demo:1:1", "Cached welcome")]),
            ..Default::default()
        };
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);

        let err = fetcher.fetch(&ids(&[1, 2]), false).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Store));
        assert_eq!(source.queries.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pulls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pushes.load(Ordering::SeqCst), 0);

        let err = fetcher.fetch(&ids(&[2]), true).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Store));
        assert_eq!(source.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_write_failure_aborts() {
        let source = sample_source();
        let cache = CountingCache {
            fail_push: true,
            ..Default::default()
        };
        let fetcher = LabelFetcher::new(&source, "demo", 1).with_cache(&cache);
        let err = fetcher.fetch(&ids(&[1]), false).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::CacheWrite));
    }
}
