//! Core domain entities
//!
//! Pure data structures with validation logic - no filesystem or database
//! access happens here.

pub mod result;
mod script;

pub use script::{MigrationScript, ScriptCatalog};
