//! Best-effort usage counters.
//!
//! The stats table is created idempotently at startup and written on every
//! classified update. Failures here must never break a handler: callers log
//! and continue.

use rusqlite::{Connection, Result};

/// Aggregated numbers for the admin statistics screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSummary {
    pub total_requests: i64,
    pub requests_today: i64,
}

/// Creates the stats table if it does not exist yet.
///
/// Called at startup; a failure is logged by the caller and startup
/// continues without counters.
pub fn ensure_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS request_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_request_stats_created_at ON request_stats(created_at);",
    )
}

/// Records one inbound update of the given kind ("command", "button",
/// "callback", "text", ...).
pub fn record_request(conn: &Connection, kind: &str) -> Result<()> {
    conn.execute("INSERT INTO request_stats (kind) VALUES (?1)", [kind])?;
    Ok(())
}

/// Reads the counters for the statistics screen.
pub fn usage_summary(conn: &Connection) -> Result<UsageSummary> {
    let total_requests: i64 =
        conn.query_row("SELECT COUNT(*) FROM request_stats", [], |row| row.get(0))?;
    let requests_today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM request_stats WHERE date(created_at) = date('now')",
        [],
        |row| row.get(0),
    )?;
    Ok(UsageSummary {
        total_requests,
        requests_today,
    })
}
