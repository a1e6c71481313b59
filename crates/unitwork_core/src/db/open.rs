//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have every table of the store model created.

use super::schema::{apply_schema, StoreModel};
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Busy timeout applied when the caller has no preference.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and creates the model's tables.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(
    path: impl AsRef<Path>,
    model: &StoreModel,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let opened = Connection::open(path);
    finish_open(opened, model, busy_timeout, "file", started_at)
}

/// Opens a private in-memory SQLite database and creates the model's tables.
///
/// Every call yields an independent database.
pub fn open_db_in_memory(model: &StoreModel) -> DbResult<Connection> {
    let started_at = Instant::now();
    let opened = Connection::open_in_memory();
    finish_open(opened, model, DEFAULT_BUSY_TIMEOUT, "memory", started_at)
}

fn finish_open(
    opened: rusqlite::Result<Connection>,
    model: &StoreModel,
    busy_timeout: Duration,
    mode: &str,
    started_at: Instant,
) -> DbResult<Connection> {
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = bootstrap_connection(&mut conn, model, busy_timeout) {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={} duration_ms={}",
        mode,
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(
    conn: &mut Connection,
    model: &StoreModel,
    busy_timeout: Duration,
) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_schema(conn, model)?;
    Ok(())
}
