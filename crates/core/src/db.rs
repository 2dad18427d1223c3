//! Pool construction and schema provisioning.
//!
//! The schema is the storage-layer half of the data contract: primary-key
//! uniqueness arbitrates concurrent creates, the gender CHECK backs up
//! application validation, and the cascading foreign key guarantees no
//! observation can outlive its patient.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::RecordResult;

/// Open a connection pool for the given database URL.
///
/// Foreign-key enforcement is switched on for every connection; without it
/// SQLite silently ignores the cascade contract. In-memory databases are
/// pinned to a single never-reaped connection so the schema survives for the
/// life of the pool.
pub async fn connect(database_url: &str) -> RecordResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let mut pool_options = SqlitePoolOptions::new().max_connections(5);
    if database_url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    Ok(pool_options.connect_with(options).await?)
}

/// Create the three tables and the per-patient observation index if absent.
///
/// Idempotent and safe to call concurrently at startup: every statement is
/// `IF NOT EXISTS`.
pub async fn ensure_schema(pool: &SqlitePool) -> RecordResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS patients (
            id TEXT PRIMARY KEY,
            family_name TEXT NOT NULL,
            given_name TEXT NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
            birth_date TEXT NOT NULL,
            medical_summary TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS observations (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            code TEXT NOT NULL,
            display TEXT NOT NULL,
            value REAL NOT NULL,
            unit TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_obs_patient ON observations(patient_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            action TEXT NOT NULL,
            resource TEXT NOT NULL,
            resource_id TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Row counts per table, for the health endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreCounts {
    pub patients: i64,
    pub observations: i64,
    pub logs: i64,
}

/// Count the rows in each table, probing storage reachability on the way.
pub async fn row_counts(pool: &SqlitePool) -> RecordResult<StoreCounts> {
    let mut conn = pool.acquire().await?;

    let patients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
        .fetch_one(&mut *conn)
        .await?;
    let observations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
        .fetch_one(&mut *conn)
        .await?;
    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
        .fetch_one(&mut *conn)
        .await?;

    Ok(StoreCounts {
        patients,
        observations,
        logs,
    })
}

/// In-memory pool with the schema applied, shared by the repository tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:").await.expect("open memory pool");
    ensure_schema(&pool).await.expect("provision schema");
    pool
}
