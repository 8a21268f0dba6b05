//! Target database connection and schema

pub mod repository;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the target database and bring its schema up to date
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // The importer is strictly sequential; one connection also keeps
    // in-memory databases shared across queries
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", database_url))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    log::debug!("Connected to {}", database_url);
    Ok(pool)
}

/// Fresh in-memory database with the schema applied
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    connect("sqlite::memory:")
        .await
        .expect("in-memory database should open")
}

/// Row count of a table, used to check for duplicates
#[cfg(test)]
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count query should succeed");
    count
}
