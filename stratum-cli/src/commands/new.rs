//! New command - create an empty migration script

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use stratum_core::{create_script, Config};

pub fn run(dir: &Path, name: &str) -> Result<()> {
    let config = Config::load(dir)
        .with_context(|| format!("Failed to load configuration from {:?}", dir))?;

    let path = create_script(&config.migrations_dir, name)?;
    println!("{} Created {}", "\u{2713}".green(), path.display());

    Ok(())
}
