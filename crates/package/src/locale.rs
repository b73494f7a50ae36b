//! Locale resolution with one level of language-family fallback.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use localekit_store::Repository;

/// The locale labels are served in after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale {
    /// The requested code on an exact match, otherwise the lowercased
    /// language family it fell back to.
    pub code: String,
    pub id: i64,
    pub fallback: bool,
}

/// Resolve a requested locale code against the package.
///
/// An exact (case-sensitive) `code` match wins. Otherwise, unless `strict`,
/// the part before the first `-` is lowercased and looked up as a language
/// family: `en-GB` may fall back to `en`, but `en` never falls back further.
pub async fn resolve(repo: &Repository, requested: &str, strict: bool) -> Result<ResolvedLocale> {
    match lookup(repo, requested, strict).await? {
        Some(resolved) => Ok(resolved),
        None => exn::bail!(ErrorKind::UnsupportedLocale(requested.to_string())),
    }
}

/// Whether [`resolve`] would succeed, without treating an unknown locale as
/// an error. Store failures still propagate.
pub async fn probe(repo: &Repository, requested: &str, strict: bool) -> Result<bool> {
    Ok(lookup(repo, requested, strict).await?.is_some())
}

async fn lookup(repo: &Repository, requested: &str, strict: bool) -> Result<Option<ResolvedLocale>> {
    if requested.is_empty() {
        exn::bail!(ErrorKind::InvalidArgument("locale"));
    }
    if let Some(id) = repo.locale_id_by_code(requested).await.or_raise(|| ErrorKind::Store)? {
        return Ok(Some(ResolvedLocale {
            code: requested.to_string(),
            id,
            fallback: false,
        }));
    }
    if strict {
        return Ok(None);
    }
    let Some((family, _)) = requested.split_once('-') else {
        return Ok(None);
    };
    if family.is_empty() {
        return Ok(None);
    }
    let family = family.to_lowercase();
    tracing::debug!(requested, family, "Falling back to language family");
    let id = repo.locale_id_by_language(&family).await.or_raise(|| ErrorKind::Store)?;
    Ok(id.map(|id| ResolvedLocale {
        code: family,
        id,
        fallback: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use localekit_store::Store;
    use localekit_store::fixture::Fixture;
    use rstest::rstest;

    async fn repository(fixture: &Fixture) -> Repository {
        let store = Store::open(fixture.path()).await.unwrap();
        Repository::from(&store)
    }

    #[rstest]
    #[case("it-IT", false, "it-IT", 2, false)]
    #[case("it-IT", true, "it-IT", 2, false)]
    #[case("en", true, "en", 1, false)]
    #[case("en-GB", false, "en", 1, true)]
    #[case("EN-gb", false, "en", 1, true)]
    #[case("it-CH", false, "it", 2, true)]
    #[tokio::test]
    async fn test_resolve(
        #[case] requested: &str,
        #[case] strict: bool,
        #[case] code: &str,
        #[case] id: i64,
        #[case] fallback: bool,
    ) {
        let fixture = Fixture::sample().await;
        let repo = repository(&fixture).await;
        let resolved = resolve(&repo, requested, strict).await.unwrap();
        assert_eq!(
            resolved,
            ResolvedLocale {
                code: code.to_string(),
                id,
                fallback
            }
        );
    }

    #[rstest]
    #[case("en-GB", true)]
    #[case("de-DE", false)]
    #[case("it", false)]
    #[case("-GB", false)]
    #[case("it-it", true)]
    #[tokio::test]
    async fn test_resolve_unsupported(#[case] requested: &str, #[case] strict: bool) {
        let fixture = Fixture::sample().await;
        let repo = repository(&fixture).await;
        let err = resolve(&repo, requested, strict).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedLocale(code) if code == requested));
        assert!(!probe(&repo, requested, strict).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_empty_locale() {
        let fixture = Fixture::sample().await;
        let repo = repository(&fixture).await;
        let err = resolve(&repo, "", false).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
        assert!(probe(&repo, "", false).await.is_err());
    }

    #[tokio::test]
    async fn test_probe_follows_fallback() {
        let fixture = Fixture::sample().await;
        let repo = repository(&fixture).await;
        assert!(probe(&repo, "fr-FR", true).await.unwrap());
        assert!(probe(&repo, "fr-CA", false).await.unwrap());
        assert!(!probe(&repo, "fr-CA", true).await.unwrap());
    }
}
