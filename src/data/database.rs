//! SQLite database access
//!
//! Owns the connection pool and the one rule every statement follows: it
//! finishes within the configured timeout or fails as `QueryFailed`.

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;
use crate::error::{AppError, StoreOp};
use crate::metrics::{DB_QUERIES_TOTAL, DB_QUERY_DURATION_SECONDS, DB_QUERY_TIMEOUTS_TOTAL};

/// Tables reported by [`Database::table_counts`].
pub const FEED_TABLES: &[&str] = &["users", "posts", "stories", "comments", "direct", "messages"];

/// Database connection pool wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database with default pool settings
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with(&DatabaseConfig {
            path: path.to_path_buf(),
            max_connections: 5,
            query_timeout_secs: 3,
        })
        .await
    }

    /// Connect using explicit configuration
    ///
    /// # Errors
    /// Returns error if the directory cannot be created, the connection
    /// fails, or a migration fails
    pub async fn connect_with(config: &DatabaseConfig) -> Result<Self, AppError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::from_store(StoreOp::Write, sqlx::Error::Io(e)))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.query_timeout())
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            query_timeout_secs = config.query_timeout_secs,
            "Database connected and migrated successfully"
        );

        Ok(Self {
            pool,
            query_timeout: config.query_timeout(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Same pool, different statement timeout.
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Run one store operation under the statement timeout.
    ///
    /// Driver errors are classified according to `op`; hitting the timeout
    /// is always `QueryFailed` and yields nothing partial.
    pub(crate) async fn bounded<T, F>(
        &self,
        op: StoreOp,
        operation: &'static str,
        table: &'static str,
        fut: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.query_timeout, fut).await;

        DB_QUERIES_TOTAL
            .with_label_values(&[operation, table])
            .inc();
        DB_QUERY_DURATION_SECONDS
            .with_label_values(&[operation, table])
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => result.map_err(|e| AppError::from_store(op, e)),
            Err(_) => {
                DB_QUERY_TIMEOUTS_TOTAL.with_label_values(&[table]).inc();
                tracing::warn!(
                    operation,
                    table,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Query timed out"
                );
                Err(AppError::QueryFailed(format!(
                    "{operation} on {table} timed out after {:?}",
                    self.query_timeout
                )))
            }
        }
    }

    /// Row count for each feed table.
    pub async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>, AppError> {
        let mut counts = Vec::with_capacity(FEED_TABLES.len());
        for &table in FEED_TABLES {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            let count = self
                .bounded(
                    StoreOp::Read,
                    "COUNT",
                    table,
                    sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool),
                )
                .await?;
            counts.push((table, count));
        }
        Ok(counts)
    }
}
