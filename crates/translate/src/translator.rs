use crate::error::{ErrorKind, Result};
use crate::provider::{Model, Provider, TextFormat};
use crate::transport::{DEFAULT_TIMEOUT, HttpTransport, ReqwestTransport};
use crate::{google, yandex};
use exn::ResultExt;
use localekit_cache::CacheHandle;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

const DEFAULT_UI_LANGUAGE: &str = "en";

/// Client for a cloud translation provider, with optional result caching.
///
/// Results map every (deduplicated, non-empty) input text to its
/// translation or detected language, or `None` when the provider returned
/// nothing for it. Only present results are cached.
///
/// # Examples
///
/// ```no_run
/// use localekit_translate::Translator;
///
/// # async fn run() -> localekit_translate::error::Result<()> {
/// let translator = Translator::yandex("trnsl.1.1.example")?;
/// let translated = translator.translate(["Hello", "World"], "it", Some("en"), false).await?;
/// assert_eq!(translated.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct Translator {
    provider: Provider,
    token: String,
    format: TextFormat,
    model: Model,
    transport: Arc<dyn HttpTransport>,
    cache: Option<CacheHandle>,
    cache_enabled: bool,
    verbose: bool,
}

impl Translator {
    pub fn new(provider: Provider, token: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("token"));
        }
        Ok(Self {
            provider,
            token,
            format: TextFormat::default(),
            model: Model::default(),
            transport,
            cache: None,
            cache_enabled: false,
            verbose: false,
        })
    }

    /// Yandex Translate over the default HTTP transport.
    pub fn yandex(token: impl Into<String>) -> Result<Self> {
        Self::new(Provider::Yandex, token, Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)?))
    }

    /// Google Cloud Translation over the default HTTP transport.
    pub fn google(token: impl Into<String>) -> Result<Self> {
        Self::new(Provider::Google, token, Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT)?))
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Attach a cache; caching is enabled as a side effect.
    pub fn with_cache(mut self, cache: CacheHandle) -> Self {
        self.cache = Some(cache);
        self.cache_enabled = true;
        self
    }

    pub fn set_cache(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Log the full error tree of every failed operation at `WARN` level.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn cache_ready(&self) -> bool {
        self.active_cache().is_some()
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    pub fn model(&self) -> Model {
        self.model
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Translate texts into `target`, optionally from a known `source`
    /// language (otherwise the provider detects it).
    pub async fn translate<I>(
        &self,
        texts: I,
        target: &str,
        source: Option<&str>,
        fresh: bool,
    ) -> Result<HashMap<String, Option<String>>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let result = self.translate_texts(texts.into_iter().map(Into::into), target, source, fresh).await;
        self.report(result)
    }

    async fn translate_texts(
        &self,
        texts: impl Iterator<Item = String>,
        target: &str,
        source: Option<&str>,
        fresh: bool,
    ) -> Result<HashMap<String, Option<String>>> {
        if target.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("target locale"));
        }
        let source = source.filter(|source| !source.is_empty());
        let texts = self.prepare(texts)?;
        let key = |text: &str| format!("translate:{target}:{}", digest(text));
        self.cache_aside(texts, key, fresh, |texts| async move {
            tracing::debug!(provider = %self.provider, count = texts.len(), lang = target, "Requesting translations");
            match self.provider {
                Provider::Yandex => {
                    yandex::translate(self.transport.as_ref(), &self.token, &texts, target, source, self.format).await
                },
                Provider::Google => {
                    google::translate(self.transport.as_ref(), &self.token, &texts, target, source, self.format, self.model)
                        .await
                },
            }
        })
        .await
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Detect the language of each text. `hints` narrow down the candidate
    /// languages (Yandex only).
    pub async fn detect_language<I>(&self, texts: I, hints: &[String], fresh: bool) -> Result<HashMap<String, Option<String>>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let result = self.detect_texts(texts.into_iter().map(Into::into), hints, fresh).await;
        self.report(result)
    }

    async fn detect_texts(
        &self,
        texts: impl Iterator<Item = String>,
        hints: &[String],
        fresh: bool,
    ) -> Result<HashMap<String, Option<String>>> {
        let texts = self.prepare(texts)?;
        let key = |text: &str| format!("detect:{}", digest(text));
        self.cache_aside(texts, key, fresh, |texts| async move {
            tracing::debug!(provider = %self.provider, count = texts.len(), "Requesting language detection");
            match self.provider {
                // One request per text, all-or-nothing.
                Provider::Yandex => {
                    let requests = texts
                        .iter()
                        .map(|text| yandex::detect(self.transport.as_ref(), &self.token, text, hints));
                    futures::future::try_join_all(requests).await
                },
                Provider::Google => google::detect(self.transport.as_ref(), &self.token, &texts).await,
            }
        })
        .await
    }

    // =========================================================================
    // Languages
    // =========================================================================

    /// Languages supported by the provider, keyed by code, with names in the
    /// `ui` language (English by default).
    pub async fn supported_languages(&self, ui: Option<&str>) -> Result<BTreeMap<String, String>> {
        let ui = ui.filter(|ui| !ui.is_empty()).unwrap_or(DEFAULT_UI_LANGUAGE);
        let result = match self.provider {
            Provider::Yandex => yandex::languages(self.transport.as_ref(), &self.token, ui).await,
            Provider::Google => google::languages(self.transport.as_ref(), &self.token, ui).await,
        };
        self.report(result)
    }

    /// Whether the provider supports `language` (compared lowercased).
    pub async fn language_supported(&self, language: &str) -> Result<bool> {
        if language.is_empty() {
            return self.report(Err(ErrorKind::InvalidArgument("language").into()));
        }
        let languages = self.supported_languages(Some(DEFAULT_UI_LANGUAGE)).await?;
        Ok(languages.contains_key(&language.to_lowercase()))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Drop empty and repeated texts, keeping first occurrences in order.
    fn prepare(&self, texts: impl Iterator<Item = String>) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let texts: Vec<String> = texts.filter(|text| !text.is_empty() && seen.insert(text.clone())).collect();
        if texts.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("texts"));
        }
        if self.provider == Provider::Yandex
            && texts.iter().any(|text| text.encode_utf16().count() > yandex::MAX_TEXT_LENGTH)
        {
            exn::bail!(ErrorKind::TextTooLong(yandex::MAX_TEXT_LENGTH));
        }
        Ok(texts)
    }

    /// Serve what the cache has, ask the provider for the rest in one go and
    /// cache whatever it returned.
    async fn cache_aside<K, F, Fut>(
        &self,
        texts: Vec<String>,
        key: K,
        fresh: bool,
        fetch: F,
    ) -> Result<HashMap<String, Option<String>>>
    where
        K: Fn(&str) -> String,
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = Result<Vec<Option<String>>>>,
    {
        let cache = match self.active_cache() {
            Some(cache) if !fresh => cache,
            _ => {
                let results = fetch(texts.clone()).await?;
                return Ok(texts.into_iter().zip(results).collect());
            },
        };

        let keys: Vec<String> = texts.iter().map(|text| key(text)).collect();
        let mut cached = cache.pull_multi(&keys, true).await.or_raise(|| ErrorKind::CacheRead)?;
        let mut found = HashMap::with_capacity(texts.len());
        let mut misses = Vec::new();
        let mut miss_keys = Vec::new();
        for (text, key) in texts.into_iter().zip(keys) {
            match cached.remove(&key).flatten() {
                Some(value) => {
                    found.insert(text, Some(value));
                },
                None => {
                    misses.push(text);
                    miss_keys.push(key);
                },
            }
        }
        tracing::debug!(hits = found.len(), misses = misses.len(), "Translation cache lookup");
        if misses.is_empty() {
            return Ok(found);
        }

        let results = fetch(misses.clone()).await?;
        let entries: HashMap<String, String> = miss_keys
            .into_iter()
            .zip(&results)
            .filter_map(|(key, value)| value.clone().map(|value| (key, value)))
            .collect();
        if !entries.is_empty() {
            cache.push_multi(entries, true).await.or_raise(|| ErrorKind::CacheWrite)?;
        }
        found.extend(misses.into_iter().zip(results));
        Ok(found)
    }

    fn active_cache(&self) -> Option<CacheHandle> {
        self.cache.as_ref().filter(|cache| self.cache_enabled && cache.is_ready()).cloned()
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if self.verbose
            && let Err(e) = &result
        {
            tracing::warn!(error = ?e, provider = %self.provider, "Translator operation failed");
        }
        result
    }
}

fn digest(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
