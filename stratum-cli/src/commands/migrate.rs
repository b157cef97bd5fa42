//! Migrate command - apply pending migrations

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use stratum_core::{load_catalog, MigrationService};

use super::{get_context, PromptConfirmation};

pub fn run(dir: &Path, yes: bool, json: bool) -> Result<()> {
    let ctx = get_context(dir)?;
    let catalog = load_catalog(&ctx.config.migrations_dir).with_context(|| {
        format!(
            "Failed to load migrations from {:?}",
            ctx.config.migrations_dir
        )
    })?;

    let service = MigrationService::new(&ctx.conn);
    let report = if yes {
        service.apply(&catalog)?
    } else {
        service.apply_confirmed(&catalog, &PromptConfirmation)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.declined {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    if report.applied.is_empty() {
        println!(
            "{}",
            format!("Nothing to do ({} already applied)", report.already_applied).dimmed()
        );
        return Ok(());
    }

    for path in &report.applied {
        println!("{} {}", "\u{2713}".green(), path);
    }
    println!(
        "\n{} migration(s) applied, {} already applied",
        report.applied.len(),
        report.already_applied
    );

    Ok(())
}
