//! SQLite pool setup and schema creation.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;

/// Error raised by any of the store modules.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("stored value is invalid: {0}")]
    Corrupt(String),
}

/// Opens the pool and makes sure every table exists.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, StoreError> {
    let in_memory = config.url.contains(":memory:");
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every in-memory connection is a separate database, so keep exactly one alive.
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?
    };

    migrate(&pool).await?;
    info!(url = %config.url, "database ready");
    Ok(pool)
}

/// Single-connection in-memory database.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
    })
    .await
}

/// Idempotent; safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    Ok(())
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone_number TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        business_name TEXT,
        business_details TEXT,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone_number TEXT NOT NULL UNIQUE,
        company_name TEXT,
        email TEXT,
        tags TEXT,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS campaigns (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        campaign_id TEXT NOT NULL UNIQUE,
        campaign_group_id TEXT NOT NULL,
        version INTEGER NOT NULL,
        batch_id TEXT,
        campaign_name TEXT NOT NULL,
        agent_name TEXT,
        status TEXT NOT NULL,
        task TEXT,
        voice TEXT,
        pathway_id TEXT,
        start_date TEXT,
        end_date TEXT,
        contact_list TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (campaign_group_id, version)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_campaigns_group ON campaigns (campaign_group_id)",
    "CREATE INDEX IF NOT EXISTS idx_campaigns_batch ON campaigns (batch_id)",
    r#"CREATE TABLE IF NOT EXISTS calls (
        call_id TEXT PRIMARY KEY,
        batch_id TEXT,
        emotion TEXT,
        from_phone TEXT,
        to_phone TEXT,
        call_length REAL,
        completed INTEGER,
        summary TEXT,
        call_transcript TEXT,
        embedding TEXT,
        followup_scheduled INTEGER NOT NULL DEFAULT 0,
        followup_at TEXT,
        created_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_calls_batch ON calls (batch_id)",
    "CREATE INDEX IF NOT EXISTS idx_calls_created ON calls (created_at)",
];
