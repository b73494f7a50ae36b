//! On-disk package fixtures for tests.
//!
//! Not gated behind `#[cfg(test)]` alone so that other crates can enable the
//! `fixture` feature in their dev dependencies.

use crate::models::LabelId;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCHEMA: &str = r#"
    CREATE TABLE locales (
        id INTEGER PRIMARY KEY,
        lang TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        locked INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE labels (
        id NOT NULL,
        locale INTEGER NOT NULL REFERENCES locales(id),
        value TEXT,
        PRIMARY KEY (id, locale)
    );
"#;

/// A package database written to a temporary directory.
///
/// The directory (and the database in it) is removed when the fixture is
/// dropped.
pub struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    /// Three locales (`en` locked, `it-IT`, `fr-FR`), English and Italian
    /// labels, and `demo-package` as the embedded identifier.
    ///
    /// | locale       | id           | value       |
    /// |--------------|--------------|-------------|
    /// | 1 (`en`)     | 1            | Welcome     |
    /// | 1 (`en`)     | 2            | Hello       |
    /// | 1 (`en`)     | 3            | Goodbye     |
    /// | 1 (`en`)     | 4            | Thanks      |
    /// | 1 (`en`)     | `menu.title` | Main menu   |
    /// | 2 (`it-IT`)  | 1            | Benvenuto   |
    /// | 2 (`it-IT`)  | 2            | Ciao        |
    pub async fn sample() -> Self {
        Self::builder()
            .locked_locale(1, "en", "en")
            .locale(2, "it", "it-IT")
            .locale(3, "fr", "fr-FR")
            .label(1, 1u64, "Welcome")
            .label(1, 2u64, "Hello")
            .label(1, 3u64, "Goodbye")
            .label(1, 4u64, "Thanks")
            .label(1, "menu.title", "Main menu")
            .label(2, 1u64, "Benvenuto")
            .label(2, 2u64, "Ciao")
            .identifier("demo-package")
            .build()
            .await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Builder for [`Fixture`].
///
/// A `meta` table is created by default (empty unless an identifier is set).
pub struct FixtureBuilder {
    locales: Vec<(i64, String, String, bool)>,
    labels: Vec<(i64, LabelId, Option<String>)>,
    identifier: Option<String>,
    meta: bool,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self {
            locales: Vec::new(),
            labels: Vec::new(),
            identifier: None,
            meta: true,
        }
    }
}

impl FixtureBuilder {
    pub fn locale(mut self, id: i64, language: &str, code: &str) -> Self {
        self.locales.push((id, language.to_string(), code.to_string(), false));
        self
    }

    pub fn locked_locale(mut self, id: i64, language: &str, code: &str) -> Self {
        self.locales.push((id, language.to_string(), code.to_string(), true));
        self
    }

    pub fn label(mut self, locale: i64, id: impl Into<LabelId>, value: &str) -> Self {
        self.labels.push((locale, id.into(), Some(value.to_string())));
        self
    }

    /// A label row whose value is NULL.
    pub fn null_label(mut self, locale: i64, id: impl Into<LabelId>) -> Self {
        self.labels.push((locale, id.into(), None));
        self
    }

    pub fn identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    /// Leave out the `meta` table entirely.
    pub fn without_meta(mut self) -> Self {
        self.meta = false;
        self
    }

    /// Write the package to disk.
    ///
    /// Panics on any database error: if test setup is wrong, the test should
    /// not pass.
    pub async fn build(self) -> Fixture {
        let dir = tempfile::tempdir().expect("create fixture directory");
        let path = dir.path().join("package.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let mut conn = SqliteConnection::connect_with(&options).await.expect("create fixture database");
        sqlx::query(SCHEMA).execute(&mut conn).await.expect("create fixture schema");
        for (id, language, code, locked) in self.locales {
            sqlx::query("INSERT INTO locales (id, lang, code, locked) VALUES (?, ?, ?, ?);")
                .bind(id)
                .bind(language)
                .bind(code)
                .bind(locked)
                .execute(&mut conn)
                .await
                .expect("insert fixture locale");
        }
        for (locale, id, value) in self.labels {
            let query = sqlx::query("INSERT INTO labels (id, locale, value) VALUES (?, ?, ?);");
            let query = match id {
                LabelId::Numeric(n) => query.bind(i64::try_from(n).expect("fixture label id fits in i64")),
                LabelId::Text(s) => query.bind(s),
            };
            query.bind(locale).bind(value).execute(&mut conn).await.expect("insert fixture label");
        }
        if self.meta {
            sqlx::query("CREATE TABLE meta (key TEXT PRIMARY KEY, value TEXT);")
                .execute(&mut conn)
                .await
                .expect("create fixture meta table");
            if let Some(identifier) = self.identifier {
                sqlx::query("INSERT INTO meta (key, value) VALUES ('identifier', ?);")
                    .bind(identifier)
                    .execute(&mut conn)
                    .await
                    .expect("insert fixture identifier");
            }
        }
        conn.close().await.expect("close fixture database");
        Fixture { _dir: dir, path }
    }
}
