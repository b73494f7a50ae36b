//! Read-only queries against a label package.
//!
//! A package holds two fixed tables, `locales(id, lang, code, locked)` and
//! `labels(id, locale, value)`, plus an optional `meta(key, value)` table.
//! Every query is parameterized; nothing here ever writes.

use crate::Store;
use crate::error::{ErrorKind, Result};
use crate::models::{Label, LabelId, Locale};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Repository for locale and label lookups in a package.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Store> for Repository {
    fn from(store: &Store) -> Self {
        Self { pool: store.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Locales
    // =========================================================================

    /// Find the id of the locale whose full code matches exactly (case-sensitive).
    pub async fn locale_id_by_code(&self, code: impl AsRef<str>) -> Result<Option<i64>> {
        sqlx::query_scalar(include_str!("../queries/get_locale_id_by_code.sql"))
            .bind(code.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Find the id of the first locale belonging to a language family.
    pub async fn locale_id_by_language(&self, language: impl AsRef<str>) -> Result<Option<i64>> {
        sqlx::query_scalar(include_str!("../queries/get_locale_id_by_language.sql"))
            .bind(language.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// List every locale in the package.
    pub async fn locales(&self) -> Result<Vec<Locale>> {
        sqlx::query_as(include_str!("../queries/list_locales.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Fetch the given labels for one locale in a single query.
    ///
    /// Ids without a matching row, and rows with a NULL value, are simply
    /// missing from the result. Numeric ids beyond SQLite's integer range
    /// cannot match a row and are left out of the query. When no id is left
    /// the database is not touched.
    pub async fn labels(&self, locale: i64, ids: &[LabelId]) -> Result<Vec<Label>> {
        let binds: Vec<Bind<'_>> = ids
            .iter()
            .filter_map(|id| match id {
                LabelId::Numeric(n) => i64::try_from(*n).ok().map(Bind::Integer),
                LabelId::Text(s) => Some(Bind::Text(s)),
            })
            .collect();
        if binds.is_empty() {
            return Ok(Vec::new());
        }
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id, value FROM labels WHERE locale = ");
        query.push_bind(locale);
        query.push(" AND value IS NOT NULL AND id IN (");
        let mut separated = query.separated(", ");
        for bind in &binds {
            match *bind {
                Bind::Integer(n) => {
                    separated.push_bind(n);
                },
                Bind::Text(s) => {
                    separated.push_bind(s.to_string());
                },
            }
        }
        separated.push_unseparated(");");
        tracing::debug!(locale, count = binds.len(), "Querying labels");
        query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)
    }

    /// Fetch every label of one locale.
    pub async fn all_labels(&self, locale: i64) -> Result<Vec<Label>> {
        sqlx::query_as(include_str!("../queries/list_labels_for_locale.sql"))
            .bind(locale)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Read the identifier embedded in the package's `meta` table.
    ///
    /// Returns `None` when the table does not exist, has no `identifier` row,
    /// or the stored value is empty.
    pub async fn identifier(&self) -> Result<Option<String>> {
        let result: sqlx::Result<Option<Option<String>>> = sqlx::query_scalar(include_str!("../queries/get_identifier.sql"))
            .fetch_optional(&self.pool)
            .await;
        match result {
            Ok(value) => Ok(value.flatten().filter(|v| !v.is_empty())),
            Err(sqlx::Error::Database(e)) if e.message().contains("no such table") => {
                tracing::debug!("Package has no meta table");
                Ok(None)
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Database),
        }
    }
}

/// A label id as bound into the `IN (...)` list.
enum Bind<'a> {
    Integer(i64),
    Text(&'a str),
}
