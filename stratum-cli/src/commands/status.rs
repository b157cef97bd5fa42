//! Status command - show applied and pending migrations

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use stratum_core::{load_catalog, MigrationService};

use super::get_context;
use crate::output;

pub fn run(dir: &Path, json: bool) -> Result<()> {
    let ctx = get_context(dir)?;
    let catalog = load_catalog(&ctx.config.migrations_dir).with_context(|| {
        format!(
            "Failed to load migrations from {:?}",
            ctx.config.migrations_dir
        )
    })?;

    let service = MigrationService::new(&ctx.conn);
    let status = service.status(&catalog)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Migration Status".bold());
    println!();

    let mut table = output::table_with_header(vec!["#", "Script", "Number", "Applied"]);
    for script in &status.scripts {
        let applied = match &script.applied_at {
            Some(at) => at.clone(),
            None => "pending".to_string(),
        };
        table.add_row(vec![
            script.position.to_string(),
            script.path.clone(),
            format!("{:03}", script.number),
            applied,
        ]);
    }
    println!("{}", table);
    println!();

    let pending = status.scripts.iter().filter(|s| !s.is_applied()).count();
    if pending == 0 {
        println!("{}", "Up to date".green());
    } else {
        println!("{}", format!("{} migration(s) pending", pending).yellow());
    }

    Ok(())
}
