//! Service layer - the migration engine
//!
//! Services coordinate the domain types against the filesystem and the
//! database: the loader builds the catalog, the ledger keeps the durable
//! watermark, and the migration service applies the pending delta.

pub mod ledger;
pub mod loader;
pub mod migration;

pub use ledger::{Ledger, LedgerEntry, LEDGER_TABLE};
pub use migration::{
    ApplyReport, MigrationService, MigrationStatus, ScriptStatus, TeardownReport,
};
