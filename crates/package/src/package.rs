use crate::error::{ErrorKind, Result};
use crate::identifier::identify;
use crate::labels::{LabelFetcher, valid_ids};
use crate::locale::{self, ResolvedLocale};
use exn::ResultExt;
use localekit_cache::CacheHandle;
use localekit_store::{LabelId, Locale, Repository, Store};
use std::collections::HashMap;
use std::path::Path;

/// Everything tied to one open package file. Replaced wholesale by
/// [`Package::set_path`].
struct Session {
    store: Store,
    repo: Repository,
    identifier: Option<String>,
    locale: Option<ResolvedLocale>,
}

impl Session {
    async fn identifier(&mut self) -> Result<&str> {
        let identifier = match self.identifier.take() {
            Some(identifier) => identifier,
            None => identify(&self.repo, self.store.path()).await?,
        };
        Ok(self.identifier.insert(identifier))
    }
}

/// A label package and the locale labels are currently served in.
///
/// # Examples
///
/// ```no_run
/// use localekit_cache::MemoryCache;
/// use localekit_package::Package;
/// use std::sync::Arc;
///
/// # async fn run() -> localekit_package::error::Result<()> {
/// let mut package = Package::new().with_cache(Arc::new(MemoryCache::default()));
/// let locale = package.set_package("labels.db", "en-GB", false).await?;
/// assert!(locale.fallback);
///
/// let labels = package.labels([1u64, 2, 3], false).await?;
/// # Ok(())
/// # }
/// ```
pub struct Package {
    session: Option<Session>,
    cache: Option<CacheHandle>,
    cache_enabled: bool,
    verbose: bool,
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

impl Package {
    pub fn new() -> Self {
        Self {
            session: None,
            cache: None,
            cache_enabled: false,
            verbose: false,
        }
    }

    /// Attach a cache; caching is enabled as a side effect.
    pub fn with_cache(mut self, cache: CacheHandle) -> Self {
        self.cache = Some(cache);
        self.cache_enabled = true;
        self
    }

    /// Enable or disable use of the attached cache without detaching it.
    pub fn set_cache(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Log the full error tree of every failed operation at `WARN` level.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Whether lookups will currently go through the cache.
    pub fn cache_ready(&self) -> bool {
        self.active_cache().is_some()
    }

    /// Drop every entry of the attached cache. A no-op without a cache.
    pub async fn invalidate_cache(&self) -> Result<()> {
        let result = match &self.cache {
            Some(cache) => cache.invalidate_all().await.or_raise(|| ErrorKind::CacheWrite),
            None => Ok(()),
        };
        self.report(result)
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Open the package at `path`, replacing (and closing) any previous one.
    ///
    /// The locale and identifier of the previous package are forgotten. On
    /// failure the package is left disconnected.
    pub async fn set_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.close().await;
        let result = Self::connect(path.as_ref()).await;
        let result = result.map(|session| {
            self.session = Some(session);
        });
        self.report(result)
    }

    async fn connect(path: &Path) -> Result<Session> {
        if path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("path"));
        }
        let store = Store::open(path).await.or_raise(|| ErrorKind::Store)?;
        tracing::info!(path = store.path(), "Opened package");
        Ok(Session {
            repo: Repository::from(&store),
            store,
            identifier: None,
            locale: None,
        })
    }

    pub fn path(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.store.path())
    }

    pub fn connected(&self) -> bool {
        self.session.is_some()
    }

    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.store.close().await;
        }
    }

    /// Open a package and set its locale in one go.
    pub async fn set_package(&mut self, path: impl AsRef<Path>, locale: &str, strict: bool) -> Result<ResolvedLocale> {
        self.set_path(path).await?;
        self.set_locale(locale, strict).await
    }

    // =========================================================================
    // Locales
    // =========================================================================

    pub async fn supported_locales(&self) -> Result<Vec<Locale>> {
        let result = match &self.session {
            Some(session) => session.repo.locales().await.or_raise(|| ErrorKind::Store),
            None => Err(ErrorKind::NotConnected.into()),
        };
        self.report(result)
    }

    /// Whether `locale` would resolve, see [`set_locale`](Self::set_locale).
    pub async fn is_locale_supported(&self, locale: &str, strict: bool) -> Result<bool> {
        let result = match &self.session {
            Some(session) => locale::probe(&session.repo, locale, strict).await,
            None => Err(ErrorKind::NotConnected.into()),
        };
        self.report(result)
    }

    /// Resolve and switch to `locale`, returning the locale labels will be
    /// served in.
    ///
    /// Unless `strict`, an unknown regional code falls back to its language
    /// family (`en-GB` to `en`). On failure the previous locale stays in
    /// effect.
    pub async fn set_locale(&mut self, locale: &str, strict: bool) -> Result<ResolvedLocale> {
        let result = match &mut self.session {
            Some(session) => match locale::resolve(&session.repo, locale, strict).await {
                Ok(resolved) => {
                    tracing::info!(requested = locale, code = %resolved.code, fallback = resolved.fallback, "Locale set");
                    session.locale = Some(resolved.clone());
                    Ok(resolved)
                },
                Err(e) => Err(e),
            },
            None => Err(ErrorKind::NotConnected.into()),
        };
        self.report(result)
    }

    /// Effective locale code (the language family after a fallback).
    pub fn locale(&self) -> Option<&str> {
        self.resolved().map(|locale| locale.code.as_str())
    }

    pub fn locale_id(&self) -> Option<i64> {
        self.resolved().map(|locale| locale.id)
    }

    pub fn is_fallback(&self) -> bool {
        self.resolved().is_some_and(|locale| locale.fallback)
    }

    fn resolved(&self) -> Option<&ResolvedLocale> {
        self.session.as_ref().and_then(|session| session.locale.as_ref())
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Fetch labels of the current locale.
    ///
    /// Invalid ids (zero, empty, non-positive numeric strings) are dropped;
    /// ids unknown to the package are absent from the result. With `fresh`
    /// set the cache is neither read nor written.
    pub async fn labels<I>(&mut self, ids: I, fresh: bool) -> Result<HashMap<LabelId, String>>
    where
        I: IntoIterator,
        I::Item: Into<LabelId>,
    {
        let ids = valid_ids(ids.into_iter().map(Into::into));
        let result = self.fetch_labels(&ids, fresh).await;
        self.report(result)
    }

    async fn fetch_labels(&mut self, ids: &[LabelId], fresh: bool) -> Result<HashMap<LabelId, String>> {
        if ids.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("label ids"));
        }
        let cache = self.active_cache();
        let session = self.session.as_mut().ok_or(ErrorKind::NotConnected)?;
        let locale = session.locale.as_ref().ok_or(ErrorKind::NoLocaleSet)?.id;
        let identifier = session.identifier().await?.to_string();

        let mut fetcher = LabelFetcher::new(&session.repo, &identifier, locale);
        if let Some(cache) = &cache {
            fetcher = fetcher.with_cache(cache.as_ref());
        }
        fetcher.fetch(ids, fresh).await
    }

    /// Every label of the current locale, straight from the package.
    pub async fn all_labels(&self) -> Result<HashMap<LabelId, String>> {
        let result = self.fetch_all_labels().await;
        self.report(result)
    }

    async fn fetch_all_labels(&self) -> Result<HashMap<LabelId, String>> {
        let session = self.session.as_ref().ok_or(ErrorKind::NotConnected)?;
        let locale = session.locale.as_ref().ok_or(ErrorKind::NoLocaleSet)?.id;
        let rows = session.repo.all_labels(locale).await.or_raise(|| ErrorKind::Store)?;
        Ok(rows.into_iter().map(|label| (label.id, label.value)).collect())
    }

    // =========================================================================
    // Identifier
    // =========================================================================

    /// The identifier namespacing this package's cache entries.
    pub async fn package_identifier(&mut self) -> Result<String> {
        let result = match &mut self.session {
            Some(session) => session.identifier().await.map(str::to_string),
            None => Err(ErrorKind::NotConnected.into()),
        };
        self.report(result)
    }

    /// Override the identifier for the lifetime of the current connection.
    /// The package itself is never written to.
    pub fn set_package_identifier(&mut self, identifier: impl Into<String>) -> Result<()> {
        let identifier = identifier.into();
        let result = match &mut self.session {
            _ if identifier.is_empty() => Err(ErrorKind::InvalidArgument("identifier").into()),
            Some(session) => {
                session.identifier = Some(identifier);
                Ok(())
            },
            None => Err(ErrorKind::NotConnected.into()),
        };
        self.report(result)
    }

    fn active_cache(&self) -> Option<CacheHandle> {
        self.cache.as_ref().filter(|cache| self.cache_enabled && cache.is_ready()).cloned()
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if self.verbose
            && let Err(e) = &result
        {
            tracing::warn!(error = ?e, "Package operation failed");
        }
        result
    }
}
