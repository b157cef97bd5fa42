//! CLI command implementations

pub mod check;
pub mod migrate;
pub mod new;
pub mod status;
pub mod teardown;

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use duckdb::Connection;

use stratum_core::adapters::duckdb::open_database;
use stratum_core::{Config, Confirmation};

/// Everything a command needs: resolved config plus an open connection
pub struct CommandContext {
    pub config: Config,
    pub conn: Connection,
}

/// Load config for `dir` and open the configured database
pub fn get_context(dir: &Path) -> Result<CommandContext> {
    let config = Config::load(dir)
        .with_context(|| format!("Failed to load configuration from {:?}", dir))?;
    let conn = open_database(&config.database)
        .with_context(|| format!("Failed to open database {:?}", config.database))?;
    Ok(CommandContext { config, conn })
}

/// Interactive yes/no gate backed by dialoguer.
///
/// Defaults to "no", so bare Enter declines - only an explicit yes proceeds.
pub struct PromptConfirmation;

impl Confirmation for PromptConfirmation {
    fn confirm(&self, prompt: &str) -> stratum_core::Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| {
                stratum_core::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    e.to_string(),
                ))
            })
    }
}
