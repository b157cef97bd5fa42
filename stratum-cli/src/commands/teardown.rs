//! Teardown command - drop every table in a schema
//!
//! For disposable test databases only. Both prompts default to "no"; there
//! is deliberately no --force flag.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use stratum_core::MigrationService;

use super::{get_context, PromptConfirmation};

pub fn run(dir: &Path, schema: Option<&str>) -> Result<()> {
    let ctx = get_context(dir)?;
    let schema = schema.unwrap_or(&ctx.config.schema);

    println!(
        "\n{}",
        format!("This will drop every table in schema '{}'.", schema).yellow()
    );
    println!("{}\n", "Intended for disposable test databases only.".dimmed());

    let service = MigrationService::new(&ctx.conn);
    let report = service.teardown(schema, &PromptConfirmation)?;

    if report.declined {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    if report.dropped.is_empty() {
        println!("{}", "No tables to drop".dimmed());
        return Ok(());
    }

    for table in &report.dropped {
        println!("{} dropped {}", "\u{2713}".green(), table);
    }

    Ok(())
}
