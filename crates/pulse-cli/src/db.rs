//! The `db` command: schema migrations and a connectivity check.

use clap::Subcommand;
use pulse_core::StoreConfig;
use pulse_db::{PgPool, PoolConfig};

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub(crate) enum DbCommands {
    /// Check that the database accepts connections
    Ping,
    /// Create the `activity_logs` table and its index if missing
    Migrate,
}

/// # Errors
///
/// Returns an error if the database cannot be reached or a migration fails.
pub(crate) async fn run_db_command(
    config: &StoreConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    let pool = pulse_db::connect_pool(&config.database_url, PoolConfig::default()).await?;

    let result = match command {
        DbCommands::Ping => ping(&pool).await,
        DbCommands::Migrate => migrate(&pool).await,
    };
    pool.close().await;
    result
}

async fn ping(pool: &PgPool) -> anyhow::Result<()> {
    pulse_db::ping(pool).await?;
    println!("database reachable");
    Ok(())
}

async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = pulse_db::run_migrations(pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}
