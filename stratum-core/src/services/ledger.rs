//! Migration ledger - durable record of applied migrations
//!
//! One row per applied migration position. The high water mark (largest
//! recorded position) is the resume point for the next run. Rows are
//! append-only; nothing in the migration path updates or deletes them.

use duckdb::{params, Connection};

use crate::domain::result::Result;

/// Default ledger table name
pub const LEDGER_TABLE: &str = "sys_migrations";

/// Durable ledger of applied migration positions
#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            table: LEDGER_TABLE.to_string(),
        }
    }

    /// Use a custom table name (several tools sharing one database, tests)
    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table if it does not exist.
    ///
    /// Safe to call on every startup, including against a database that
    /// already carries rows.
    pub fn ensure_initialized(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 migration_number INTEGER PRIMARY KEY,
                 applied_at TIMESTAMP NOT NULL DEFAULT now()
             );",
            self.table
        ))?;
        Ok(())
    }

    /// Highest applied position, or 0 when the ledger is empty
    pub fn watermark(&self, conn: &Connection) -> Result<i64> {
        let watermark = conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(migration_number), 0) FROM {}",
                self.table
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(watermark)
    }

    /// Record one applied position.
    ///
    /// Must run on the same connection, inside the same transaction, as the
    /// migration body it records.
    pub fn record_applied(&self, conn: &Connection, ordinal: i64) -> Result<()> {
        conn.execute(
            &format!("INSERT INTO {} (migration_number) VALUES (?)", self.table),
            params![ordinal],
        )?;
        Ok(())
    }

    /// All ledger rows in position order
    pub fn entries(&self, conn: &Connection) -> Result<Vec<LedgerEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT migration_number, applied_at::VARCHAR FROM {} ORDER BY migration_number",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(LedgerEntry {
                number: row.get(0)?,
                applied_at: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

/// One applied-migration row
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub number: i64,
    pub applied_at: String,
}
