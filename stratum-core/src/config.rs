//! Configuration management
//!
//! Reads `stratum.json` from the project directory:
//! ```json
//! {
//!   "migrationsDir": "migrations",
//!   "database": "stratum.duckdb",
//!   "schema": "main"
//! }
//! ```
//! Every key is optional; missing keys take the defaults above. A missing
//! file is equivalent to an empty one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Raw stratum.json structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsFile {
    migrations_dir: String,
    database: String,
    schema: String,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            migrations_dir: "migrations".to_string(),
            database: "stratum.duckdb".to_string(),
            schema: "main".to_string(),
        }
    }
}

/// Resolved configuration, paths anchored at the project directory
#[derive(Debug, Clone)]
pub struct Config {
    pub migrations_dir: PathBuf,
    pub database: PathBuf,
    pub schema: String,
}

impl Config {
    /// Load config from a project directory.
    ///
    /// The database path can be overridden via `STRATUM_DATABASE`, which is
    /// how CI points a run at a disposable database.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let settings_path = project_dir.join("stratum.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", settings_path.display(), e)))?
        } else {
            SettingsFile::default()
        };

        let database = match std::env::var("STRATUM_DATABASE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => project_dir.join(&raw.database),
        };

        Ok(Self {
            migrations_dir: project_dir.join(&raw.migrations_dir),
            database,
            schema: raw.schema,
        })
    }
}
