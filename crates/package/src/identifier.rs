//! Package identity used to namespace cache keys.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use localekit_store::Repository;

/// Derive the identifier of an open package.
///
/// The value embedded in the package's `meta` table is used verbatim when
/// present; otherwise the BLAKE3 digest of the package path stands in, so two
/// packages opened from different paths never share cache entries.
pub async fn identify(repo: &Repository, path: &str) -> Result<String> {
    match repo.identifier().await.or_raise(|| ErrorKind::Store)? {
        Some(identifier) => Ok(identifier),
        None => {
            tracing::debug!(path, "Package has no embedded identifier; using path digest");
            Ok(path_digest(path))
        },
    }
}

fn path_digest(path: &str) -> String {
    blake3::hash(path.as_bytes()).to_hex().to_string()
}
