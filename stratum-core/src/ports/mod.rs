//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core depends
//! only on these traits, not on concrete implementations.

mod confirmation;

pub use confirmation::{AutoConfirm, Confirmation};
