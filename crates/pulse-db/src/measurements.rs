//! Database operations for `activity_logs`.

use chrono::{DateTime, Utc};
use pulse_core::Measurement;
use sqlx::{Connection, PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `activity_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeasurementRow {
    pub id: i64,
    /// Capture time supplied by the job, not the server.
    pub timestamp: DateTime<Utc>,
    /// The schema defines this as `INTEGER NOT NULL CHECK (online_users >= 0)`.
    pub online_users: i32,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over the whole table for the report view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeasurementStats {
    pub total: i64,
    /// `None` when the table is empty.
    pub average: Option<f64>,
    pub min_online: Option<i32>,
    pub max_online: Option<i32>,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Persists one measurement on a dedicated connection.
///
/// Opens a connection to `database_url`, inserts inside a transaction,
/// commits, and closes the connection. The connection is released on every
/// path, including a failed insert. Nothing is retried.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the connection, insert, or commit fails, or
/// [`DbError::CountOutOfRange`] if the count exceeds the column type.
pub async fn write_measurement(
    database_url: &str,
    measurement: &Measurement,
) -> Result<MeasurementRow, DbError> {
    let mut conn = PgConnection::connect(database_url).await?;
    let result = insert_committed(&mut conn, measurement).await;
    // The socket is dropped regardless; a failed goodbye does not undo a commit.
    conn.close().await.ok();
    result
}

async fn insert_committed(
    conn: &mut PgConnection,
    measurement: &Measurement,
) -> Result<MeasurementRow, DbError> {
    let mut tx = conn.begin().await?;
    let row = insert_measurement(&mut tx, measurement).await?;
    tx.commit().await?;
    Ok(row)
}

/// Inserts a single `activity_logs` row and returns it with the
/// store-assigned `id` and `created_at`.
///
/// Duplicates are allowed: two identical measurements produce two rows.
///
/// # Errors
///
/// Returns [`DbError::CountOutOfRange`] if `online_count` exceeds `i32::MAX`,
/// or [`DbError::Sqlx`] if the insert fails.
pub async fn insert_measurement(
    conn: &mut PgConnection,
    measurement: &Measurement,
) -> Result<MeasurementRow, DbError> {
    let online_users = i32::try_from(measurement.online_count)
        .map_err(|_| DbError::CountOutOfRange(measurement.online_count))?;

    let row = sqlx::query_as::<_, MeasurementRow>(
        "INSERT INTO activity_logs (timestamp, online_users) \
         VALUES ($1, $2) \
         RETURNING id, timestamp, online_users, created_at",
    )
    .bind(measurement.timestamp)
    .bind(online_users)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the most recent `limit` measurements, newest capture time first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_measurements(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<MeasurementRow>, DbError> {
    let rows = sqlx::query_as::<_, MeasurementRow>(
        "SELECT id, timestamp, online_users, created_at \
         FROM activity_logs \
         ORDER BY timestamp DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Row count, average, minimum and maximum of `online_users`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn measurement_stats(pool: &PgPool) -> Result<MeasurementStats, DbError> {
    let stats = sqlx::query_as::<_, MeasurementStats>(
        "SELECT COUNT(*) AS total, \
                AVG(online_users)::float8 AS average, \
                MIN(online_users) AS min_online, \
                MAX(online_users) AS max_online \
         FROM activity_logs",
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
