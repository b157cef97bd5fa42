//! Check command - validate names and SQL syntax offline
//!
//! Never opens the database; safe to run anywhere, including CI.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use stratum_core::{load_catalog, Config};

pub fn run(dir: &Path) -> Result<()> {
    let config = Config::load(dir)
        .with_context(|| format!("Failed to load configuration from {:?}", dir))?;
    let catalog = load_catalog(&config.migrations_dir).with_context(|| {
        format!("Failed to load migrations from {:?}", config.migrations_dir)
    })?;

    catalog.validate_syntax()?;

    println!("{} {} script(s) OK", "\u{2713}".green(), catalog.len());
    Ok(())
}
