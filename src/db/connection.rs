//! Database connection handling

use std::time::Duration;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Executor, MySqlPool, PgPool, SqlitePool};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// A live pool for one database, behind a driver-keyed enum
pub enum DatabaseConnection {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl DatabaseConnection {
    /// Connect according to the configured driver
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(5);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(30));
        info!(driver = %config.driver, "connecting to database");

        match config.driver.as_str() {
            "postgres" | "postgresql" => {
                let pool = PgPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;
                Ok(DatabaseConnection::Postgres(pool))
            }
            "mysql" | "mariadb" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;
                Ok(DatabaseConnection::MySql(pool))
            }
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;
                Ok(DatabaseConnection::Sqlite(pool))
            }
            other => Err(Error::ConfigError(format!(
                "Unsupported database driver: {}",
                other
            ))),
        }
    }

    /// Execute one statement, returning affected rows
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                let result = pool.execute(sql).await?;
                Ok(result.rows_affected())
            }
            DatabaseConnection::MySql(pool) => {
                let result = pool.execute(sql).await?;
                Ok(result.rows_affected())
            }
            DatabaseConnection::Sqlite(pool) => {
                let result = pool.execute(sql).await?;
                Ok(result.rows_affected())
            }
        }
    }

    pub async fn close(&self) {
        match self {
            DatabaseConnection::Postgres(pool) => pool.close().await,
            DatabaseConnection::MySql(pool) => pool.close().await,
            DatabaseConnection::Sqlite(pool) => pool.close().await,
        }
    }
}
