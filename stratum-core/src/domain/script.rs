//! Migration scripts and the catalog built from a script directory

use std::collections::HashMap;

use serde_json::Value;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

use crate::domain::result::{Error, Result};

/// A single versioned SQL script
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// Catalog key: slash-joined path relative to the script root, extension stripped
    pub path: String,
    /// Ordering number parsed from the trailing `_NNN` filename token
    pub number: u32,
    /// Raw script text
    pub sql: String,
    /// Bind arguments, empty unless set via [`ScriptCatalog::bind_args`]
    pub args: Vec<Value>,
}

/// In-memory catalog of migration scripts, keyed by relative path
///
/// Built once per run by the loader. The only mutation allowed afterwards is
/// [`bind_args`](ScriptCatalog::bind_args); the execution order is never
/// stored here, it is recomputed from the catalog on demand.
#[derive(Debug, Default)]
pub struct ScriptCatalog {
    scripts: HashMap<String, MigrationScript>,
}

impl ScriptCatalog {
    pub(crate) fn insert(&mut self, script: MigrationScript) {
        self.scripts.insert(script.path.clone(), script);
    }

    pub fn get(&self, path: &str) -> Option<&MigrationScript> {
        self.scripts.get(path)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Attach bind arguments to a script before execution
    pub fn bind_args(&mut self, path: &str, args: Vec<Value>) -> Result<()> {
        match self.scripts.get_mut(path) {
            Some(script) => {
                script.args = args;
                Ok(())
            }
            None => Err(Error::ScriptNotFound(path.to_string())),
        }
    }

    /// Execution sequence: ascending by number, ties broken by path.
    ///
    /// Recomputed on every call so the sequence can never drift from the
    /// catalog. The 1-indexed position in the returned vector is the ordinal
    /// the ledger records, independent of the filename number.
    pub fn ordered(&self) -> Vec<&MigrationScript> {
        let mut scripts: Vec<&MigrationScript> = self.scripts.values().collect();
        scripts.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));
        scripts
    }

    /// Parse every script body with the DuckDB SQL dialect.
    ///
    /// Reports the first script that fails to parse. sqlparser is stricter
    /// than DuckDB itself, so this is an offline lint, not an execution gate.
    pub fn validate_syntax(&self) -> Result<()> {
        let dialect = DuckDbDialect {};
        for script in self.ordered() {
            Parser::parse_sql(&dialect, &script.sql).map_err(|e| {
                let msg = e.to_string();
                let cleaned = msg.trim_start_matches("sql parser error: ");
                Error::InvalidSql {
                    path: script.path.clone(),
                    message: cleaned.to_string(),
                }
            })?;
        }
        Ok(())
    }
}
