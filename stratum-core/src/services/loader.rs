//! Script loader - builds a catalog from a directory tree
//!
//! Walks the migration root depth-first with an explicit work stack and
//! reads every `.sql` file into memory. Naming contract:
//! `<prefix>_<number>.sql`; the trailing number drives execution order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::domain::result::{Error, Result};
use crate::domain::{MigrationScript, ScriptCatalog};

/// File extension a migration script must carry
pub const SCRIPT_EXTENSION: &str = "sql";

/// Load every script under `root` into a catalog.
///
/// Fails on the first unreadable entry or invalid filename. Files with a
/// different extension are skipped. Only the trailing extension is stripped
/// when deriving the catalog key, so an interior `.sql` in a filename is
/// left alone.
pub fn load_catalog(root: &Path) -> Result<ScriptCatalog> {
    let mut catalog = ScriptCatalog::default();
    let mut pending: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, prefix)) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                pending.push((entry.path(), join_key(&prefix, &name)));
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
                continue;
            }
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s.to_string(),
                None => continue,
            };
            let number =
                parse_sequence_number(&stem).ok_or_else(|| Error::InvalidName(name.clone()))?;

            let sql = fs::read_to_string(&path)?;
            catalog.insert(MigrationScript {
                path: join_key(&prefix, &stem),
                number,
                sql,
                args: Vec::new(),
            });
        }
    }

    Ok(catalog)
}

/// Parse the trailing `_`-delimited token of a filename stem as the
/// ordering number. Negative numbers never parse (`u32`).
fn parse_sequence_number(stem: &str) -> Option<u32> {
    let token = stem.rsplit('_').next()?;
    token.parse().ok()
}

fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Create a new empty migration script under `root`.
///
/// The file is named `<name>_<NNN>.sql` where `NNN` is one greater than the
/// highest number already in the catalog (001 for an empty root). The name
/// is lowercased and whitespace becomes underscores.
pub fn create_script(root: &Path, name: &str) -> Result<PathBuf> {
    let cleaned = name.trim().to_lowercase().replace(char::is_whitespace, "_");
    if cleaned.is_empty() {
        return Err(Error::validation("migration name must not be empty"));
    }

    fs::create_dir_all(root)?;
    let catalog = load_catalog(root)?;
    let next = catalog.ordered().last().map(|s| s.number + 1).unwrap_or(1);

    let filename = format!("{}_{:03}.{}", cleaned, next, SCRIPT_EXTENSION);
    let filepath = root.join(&filename);

    let header = format!(
        "-- {}\n-- Created: {}\n\n",
        filename,
        Utc::now().format("%Y-%m-%d")
    );
    fs::write(&filepath, header)?;

    Ok(filepath)
}
