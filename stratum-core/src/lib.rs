//! Stratum Core - versioned SQL migration engine
//!
//! This crate implements the migration core following hexagonal architecture:
//!
//! - **domain**: migration scripts, the catalog, error types
//! - **ports**: trait definitions for external dependencies (Confirmation)
//! - **services**: loader, ledger, and the migration executor
//! - **adapters**: DuckDB connection helpers
//!
//! The database connection is owned by the caller and borrowed by the
//! services; the core never opens, pools, or closes one on its own behalf.
//! There is no cross-process coordination beyond the transaction the
//! executor holds, so run at most one migration process against a database
//! at a time.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::result::{Error, Result};
pub use domain::{MigrationScript, ScriptCatalog};
pub use ports::{AutoConfirm, Confirmation};
pub use services::loader::{create_script, load_catalog, SCRIPT_EXTENSION};
pub use services::{
    ApplyReport, Ledger, LedgerEntry, MigrationService, MigrationStatus, ScriptStatus,
    TeardownReport,
};
