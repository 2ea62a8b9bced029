use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use poolquote_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Opens a pool sized and timed per [`DatabaseConfig`]. Every connection gets
/// the pragmas the schema relies on: enforced foreign keys, WAL journaling and
/// a busy timeout for concurrent writers.
pub async fn connect_from_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

/// Convenience wrapper for callers that only have a URL; pool sizing falls
/// back to the [`DatabaseConfig`] defaults.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let config = DatabaseConfig { url: database_url.to_string(), ..DatabaseConfig::default() };
    connect_from_config(&config).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
