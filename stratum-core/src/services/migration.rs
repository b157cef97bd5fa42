//! Migration executor - applies pending scripts inside one transaction
//!
//! Reads the ledger watermark, skips every position at or below it, and
//! applies the remainder in order. The whole delta (script bodies plus
//! ledger rows) commits atomically or not at all, so a crash mid-run leaves
//! the database exactly at the last committed state.

use duckdb::{params, Connection, ToSql};
use serde::Serialize;
use serde_json::Value;

use crate::domain::result::{Error, Result};
use crate::domain::{MigrationScript, ScriptCatalog};
use crate::ports::{AutoConfirm, Confirmation};
use crate::services::ledger::Ledger;

/// Result of an apply run
#[derive(Debug, Serialize)]
pub struct ApplyReport {
    /// Paths of newly applied scripts, in execution order
    pub applied: Vec<String>,
    /// Count of positions already at or below the watermark
    pub already_applied: usize,
    /// True when the confirmation gate declined; nothing was executed
    pub declined: bool,
}

/// Status of one catalog script against the ledger
#[derive(Debug, Serialize)]
pub struct ScriptStatus {
    pub position: i64,
    pub path: String,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
}

impl ScriptStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Catalog status against the ledger
#[derive(Debug, Serialize)]
pub struct MigrationStatus {
    pub watermark: i64,
    pub scripts: Vec<ScriptStatus>,
}

/// Result of a schema teardown
#[derive(Debug)]
pub struct TeardownReport {
    pub dropped: Vec<String>,
    pub declined: bool,
}

/// Service applying script catalogs against a caller-owned connection
///
/// The connection is borrowed for the lifetime of the service and never
/// closed here. Run at most one instance against a database at a time.
pub struct MigrationService<'a> {
    conn: &'a Connection,
    ledger: Ledger,
}

impl<'a> MigrationService<'a> {
    /// Create a migration service with the default ledger
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            ledger: Ledger::new(),
        }
    }

    /// Create a migration service recording into a custom ledger
    pub fn with_ledger(conn: &'a Connection, ledger: Ledger) -> Self {
        Self { conn, ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply every pending script without a confirmation gate
    pub fn apply(&self, catalog: &ScriptCatalog) -> Result<ApplyReport> {
        self.apply_confirmed(catalog, &AutoConfirm)
    }

    /// Apply every pending script, gated by `gate`.
    ///
    /// A declined gate is a successful no-op. Otherwise the full delta runs
    /// inside one transaction: every pending script and its ledger row
    /// commit together, or none do. The first failure rolls everything back
    /// and is returned as-is; re-running after the cause is fixed resumes
    /// from the old watermark.
    pub fn apply_confirmed(
        &self,
        catalog: &ScriptCatalog,
        gate: &dyn Confirmation,
    ) -> Result<ApplyReport> {
        self.ledger.ensure_initialized(self.conn)?;

        let ordered = catalog.ordered();
        let watermark = self.ledger.watermark(self.conn)?;
        let already_applied = ordered.len().min(watermark.max(0) as usize);
        let pending = ordered.len() - already_applied;

        if pending == 0 {
            return Ok(ApplyReport {
                applied: Vec::new(),
                already_applied,
                declined: false,
            });
        }

        if !gate.confirm(&format!("Apply {} pending migration(s)?", pending))? {
            return Ok(ApplyReport {
                applied: Vec::new(),
                already_applied,
                declined: true,
            });
        }

        let applied = self.transaction(|conn| {
            // Authoritative watermark read, inside the transaction. The
            // ledger position is the 1-indexed sequence position, never the
            // filename number.
            let watermark = self.ledger.watermark(conn)?;
            let mut applied = Vec::new();
            for (index, script) in ordered.iter().enumerate() {
                let position = index as i64 + 1;
                if position <= watermark {
                    continue;
                }
                log::debug!("Applying migration {:03} ({})", position, script.path);
                execute_script(conn, script)?;
                self.ledger.record_applied(conn, position)?;
                applied.push(script.path.clone());
            }
            Ok(applied)
        })?;

        log::info!("Applied {} migration(s)", applied.len());
        Ok(ApplyReport {
            applied,
            already_applied,
            declined: false,
        })
    }

    /// Status of every catalog script against the ledger
    pub fn status(&self, catalog: &ScriptCatalog) -> Result<MigrationStatus> {
        self.ledger.ensure_initialized(self.conn)?;
        let watermark = self.ledger.watermark(self.conn)?;
        let entries = self.ledger.entries(self.conn)?;

        let scripts = catalog
            .ordered()
            .iter()
            .enumerate()
            .map(|(index, script)| {
                let position = index as i64 + 1;
                let applied_at = entries
                    .iter()
                    .find(|e| e.number == position)
                    .map(|e| e.applied_at.clone());
                ScriptStatus {
                    position,
                    path: script.path.clone(),
                    number: script.number,
                    applied_at,
                }
            })
            .collect();

        Ok(MigrationStatus { watermark, scripts })
    }

    /// Drop every table in `schema`.
    ///
    /// Destructive: takes the ledger down with the rest of the schema.
    /// Gated behind two independent confirmations and intended for
    /// disposable test databases only; nothing else in this crate calls it.
    pub fn teardown(&self, schema: &str, gate: &dyn Confirmation) -> Result<TeardownReport> {
        if !gate.confirm(&format!("Drop every table in schema '{}'?", schema))? {
            return Ok(TeardownReport {
                dropped: Vec::new(),
                declined: true,
            });
        }
        if !gate.confirm(&format!(
            "This cannot be undone. Really drop all tables in '{}'?",
            schema
        ))? {
            return Ok(TeardownReport {
                dropped: Vec::new(),
                declined: true,
            });
        }

        let tables = self.schema_tables(schema)?;
        self.transaction(|conn| {
            for table in &tables {
                log::debug!("Dropping table {}.{}", schema, table);
                conn.execute_batch(&format!(
                    "DROP TABLE IF EXISTS {}.{} CASCADE",
                    quote_ident(schema),
                    quote_ident(table)
                ))?;
            }
            Ok(())
        })?;

        Ok(TeardownReport {
            dropped: tables,
            declined: false,
        })
    }

    fn schema_tables(&self, schema: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = ? ORDER BY table_name",
        )?;
        let rows = stmt.query_map(params![schema], |row| row.get::<_, String>(0))?;

        let mut tables = Vec::new();
        for row in rows {
            tables.push(row?);
        }
        Ok(tables)
    }

    /// Run `body` inside a BEGIN/COMMIT transaction, rolling back on error
    fn transaction<T>(&self, body: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| Error::database(format!("BEGIN failed: {}", e)))?;

        let result = body(self.conn);
        match &result {
            Ok(_) => {
                if let Err(e) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(Error::database(format!("COMMIT failed: {}", e)));
                }
            }
            Err(_) => {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result
    }
}

/// Execute one script body as a single parameterized statement.
///
/// Bound args and no args go through the same prepared path; an empty args
/// vector simply binds nothing.
fn execute_script(conn: &Connection, script: &MigrationScript) -> Result<()> {
    let args: Vec<Box<dyn ToSql>> = script.args.iter().map(json_to_sql_param).collect();
    let refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();

    let mut stmt = conn
        .prepare(&script.sql)
        .map_err(|e| Error::database(format!("{}: {}", script.path, e)))?;
    stmt.execute(refs.as_slice())
        .map_err(|e| Error::database(format!("{}: {}", script.path, e)))?;
    Ok(())
}

/// Convert a JSON bind value to a DuckDB parameter
fn json_to_sql_param(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(None::<String>),
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i)
            } else if let Some(f) = n.as_f64() {
                Box::new(f)
            } else {
                Box::new(n.to_string())
            }
        }
        Value::String(s) => Box::new(s.clone()),
        // Arrays and objects travel as their JSON text
        other => Box::new(other.to_string()),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
