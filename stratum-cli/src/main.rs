//! Stratum CLI - versioned SQL migrations in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, migrate, new, status, teardown};

/// Stratum - apply versioned SQL migrations in strict order
#[derive(Parser)]
#[command(name = "stratum", version, about, long_about = None)]
struct Cli {
    /// Project directory containing stratum.json and the migrations tree
    #[arg(long, global = true, default_value = ".", env = "STRATUM_DIR")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Migrate {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate migration names and SQL syntax without touching the database
    Check,

    /// Create a new empty migration script
    New {
        /// Descriptive name; the file becomes <name>_<NNN>.sql
        name: String,
    },

    /// Drop every table in a schema (disposable test databases only)
    Teardown {
        /// Schema to tear down (defaults to the configured schema)
        schema: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Migrate { yes, json } => migrate::run(&cli.dir, yes, json),
        Commands::Status { json } => status::run(&cli.dir, json),
        Commands::Check => check::run(&cli.dir),
        Commands::New { name } => new::run(&cli.dir, &name),
        Commands::Teardown { schema } => teardown::run(&cli.dir, schema.as_deref()),
    }
}
