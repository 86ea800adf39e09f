use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

pub use sqlx::PgPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 2;
const DEFAULT_MIN_CONNECTIONS: u32 = 0;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Embedded at compile time from <workspace-root>/migrations/.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("online count {0} does not fit the online_users column")]
    CountOutOfRange(u32),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens the small pool used by `db` and `report`.
///
/// The measurement run does not use a pool; [`write_measurement`] opens a
/// single connection of its own.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if no connection can be established within
/// `acquire_timeout_secs`.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Applies every embedded migration the database has not recorded yet and
/// returns how many that was.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if a migration fails or a recorded
/// checksum no longer matches its file.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let recorded = recorded_versions(pool).await;
    let pending = MIGRATOR
        .iter()
        .filter(|migration| !recorded.contains(&migration.version))
        .count();

    MIGRATOR.run(pool).await?;
    Ok(pending)
}

// A fresh database has no _sqlx_migrations table yet: nothing recorded.
async fn recorded_versions(pool: &PgPool) -> Vec<i64> {
    sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(pool)
        .await
        .unwrap_or_default()
}

/// Round-trips a trivial query through the pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the server cannot be reached or rejects it.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}


pub mod measurements;

pub use measurements::{
    insert_measurement, list_recent_measurements, measurement_stats, write_measurement,
    MeasurementRow, MeasurementStats,
};
