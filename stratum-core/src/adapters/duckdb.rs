//! DuckDB connection helpers
//!
//! The core borrows a caller-owned connection; these helpers are the
//! caller-side piece that opens one.

use std::path::Path;
use std::thread;
use std::time::Duration;

use duckdb::Connection;

use crate::domain::result::Result;

/// How many open attempts before a persistent file lock is surfaced
const MAX_OPEN_ATTEMPTS: u32 = 5;

/// First backoff delay; doubles on every further attempt
const RETRY_BASE_DELAY_MS: u64 = 50;

/// Substrings marking a transient file-lock failure, across the wordings
/// DuckDB surfaces on Unix-likes and Windows
const LOCK_HINTS: &[&str] = &[
    "database is locked",
    "file is already open",
    "resource temporarily unavailable",
    "being used by another process",
    "cannot access the file",
];

fn is_lock_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    LOCK_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Open (or create) the database file at `path`.
///
/// Extension autoloading is disabled; migrations only need plain SQL.
/// Retries with exponential backoff when another process briefly holds the
/// file lock. DuckDB is single-writer, so a concurrent migrator that holds
/// the lock for longer than the retry window surfaces as an error here.
pub fn open_database(path: &Path) -> Result<Connection> {
    let mut attempt = 0;
    loop {
        match try_open(path) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                attempt += 1;
                let msg = e.to_string();
                if attempt >= MAX_OPEN_ATTEMPTS || !is_lock_error(&msg) {
                    return Err(e.into());
                }
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << (attempt - 1));
                log::warn!(
                    "Database file busy, retry {}/{} in {}ms: {}",
                    attempt,
                    MAX_OPEN_ATTEMPTS - 1,
                    delay.as_millis(),
                    msg
                );
                thread::sleep(delay);
            }
        }
    }
}

/// Open an in-memory database, mainly for tests and throwaway runs
pub fn open_in_memory() -> Result<Connection> {
    Ok(Connection::open_in_memory()?)
}

fn try_open(path: &Path) -> duckdb::Result<Connection> {
    let config = duckdb::Config::default().enable_autoload_extension(false)?;
    Connection::open_with_flags(path, config)
}
