//! The `report` command: recent measurements plus whole-table statistics.

use std::fmt::Write as _;

use pulse_core::StoreConfig;
use pulse_db::{MeasurementRow, MeasurementStats, PoolConfig};

/// Prints the most recent `limit` measurements and aggregate statistics.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a query fails.
pub(crate) async fn run_report(config: &StoreConfig, limit: i64) -> anyhow::Result<()> {
    let pool = pulse_db::connect_pool(&config.database_url, PoolConfig::default()).await?;
    let rows = pulse_db::list_recent_measurements(&pool, limit).await?;
    let stats = pulse_db::measurement_stats(&pool).await?;
    pool.close().await;

    tracing::debug!(rows = rows.len(), total = stats.total, "report loaded");
    print!("{}", render_report(&rows, &stats, limit));
    Ok(())
}

pub(crate) fn render_report(
    rows: &[MeasurementRow],
    stats: &MeasurementStats,
    limit: i64,
) -> String {
    let mut out = String::new();

    if rows.is_empty() {
        out.push_str("no measurements recorded yet; run `pulse-cli run` first\n");
    } else {
        let _ = writeln!(out, "Most recent {} of up to {limit} measurements", rows.len());
        let _ = writeln!(
            out,
            "{:<8}{:<22}{:<10}RECORDED AT",
            "ID", "TIMESTAMP", "ONLINE"
        );
        for row in rows {
            let _ = writeln!(
                out,
                "{:<8}{:<22}{:<10}{}",
                row.id,
                row.timestamp.format("%Y-%m-%d %H:%M:%S"),
                row.online_users,
                row.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    out.push('\n');
    out.push_str("Statistics\n");
    let _ = writeln!(out, "  total measurements: {}", stats.total);
    let _ = writeln!(
        out,
        "  average online:     {}",
        stats
            .average
            .map_or_else(|| "n/a".to_string(), |avg| format!("{avg:.2}"))
    );
    let _ = writeln!(out, "  minimum online:     {}", fmt_count(stats.min_online));
    let _ = writeln!(out, "  maximum online:     {}", fmt_count(stats.max_online));
    out
}

fn fmt_count(value: Option<i32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}
