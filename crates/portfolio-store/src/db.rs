use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Timestamps are stored as UTC text; this format sorts lexicographically.
const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time as a storable string.
pub fn now_utc() -> String {
    Utc::now().format(TIMESTAMP_FMT).to_string()
}

/// UTC time `secs` seconds from now as a storable string.
pub fn utc_after_secs(secs: i64) -> String {
    (Utc::now() + Duration::seconds(secs))
        .format(TIMESTAMP_FMT)
        .to_string()
}

#[derive(Clone)]
pub struct PortfolioDb {
    pool: SqlitePool,
}

impl PortfolioDb {
    /// Create a new database connection pool and initialize the schema.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // In-memory SQLite databases are per-connection, so a multi-connection
        // pool would see a different (empty) database on each acquire.
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;

        Ok(db)
    }

    /// Execute `schema.sql` statement by statement (sqlx does not support
    /// multi-statement queries). Comment lines are dropped first so a `;`
    /// inside one cannot split a statement.
    async fn init_schema(&self) -> Result<()> {
        let schema: String = include_str!("../../../schema.sql")
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");

        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
