use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Embedded schema migrations (`crates/waypoint-db/migrations/`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by the waypoint schema, in dependency order.
pub const TABLES: [&str; 3] = ["sessions", "places", "planners"];

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connections for request handling. Every service call holds at most one.
const POOL_SIZE: u32 = 5;

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = connect(&config.database_url, POOL_SIZE).await?;
    debug!(max_connections = POOL_SIZE, "database pool ready");
    Ok(pool)
}

/// Apply pending embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to apply waypoint migrations")?;
    info!(tables = ?TABLES, "schema up to date");
    Ok(())
}

/// `CREATE DATABASE` cannot take bind parameters, so the name is spliced
/// into the statement and must be a plain identifier.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Create the configured database through the `postgres` maintenance
/// database unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let Some(db_name) = config.database_name() else {
        bail!("database URL {} does not name a database", config.database_url);
    };
    if !is_plain_identifier(db_name) {
        bail!("database name {db_name:?} must be a plain identifier (letters, digits, underscores)");
    }

    let maintenance = connect(&config.maintenance_url(), 1).await?;
    let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(db_name)
        .fetch_optional(&maintenance)
        .await
        .context("failed to look up database in pg_database")?;

    let result = match found {
        Some(_) => {
            info!(db = db_name, "database already exists");
            Ok(())
        }
        None => maintenance
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .map(|_| info!(db = db_name, "database created"))
            .with_context(|| format!("failed to create database {db_name}")),
    };

    maintenance.close().await;
    result
}

/// Row count of each waypoint table, for the `waypoint db-init` summary.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count {table}"))?;
        counts.push((table.to_owned(), count));
    }
    Ok(counts)
}
