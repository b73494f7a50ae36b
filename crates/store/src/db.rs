//! Package connection management.

use exn::{OptionExt, ResultExt};
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

// One package, one connection. Queries are issued sequentially anyway.
const MAX_CONNECTIONS: u32 = 1;

/// Read-only connection to a label package.
///
/// The package file is never created, migrated or written to. Dropping the
/// store (or calling [`close`](Self::close)) releases the connection.
#[derive(Debug, Clone)]
pub struct Store {
    path: String,
    pool: SqlitePool,
}

impl Store {
    /// Open the package database at the given path.
    ///
    /// Fails with [`ErrorKind::InvalidArgument`] for an empty path (or one
    /// that isn't valid UTF-8) and with [`ErrorKind::Connect`] if the file
    /// does not exist or is not a readable SQLite database.
    #[instrument("connecting to package", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = path.to_str().ok_or_raise(|| ErrorKind::InvalidArgument("path"))?.to_string();
        if path.is_empty() {
            exn::bail!(ErrorKind::InvalidArgument("path"));
        }
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Connect)?;
        tracing::info!(path = %path, "Connected to package");
        Ok(Self { path, pool })
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA query_only = ON;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// The path this store was opened with, exactly as given.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection. The store must not be used afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
