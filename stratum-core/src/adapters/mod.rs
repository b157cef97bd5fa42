//! Adapter implementations
//!
//! Concrete technology bindings for the core. Currently just the DuckDB
//! connection helpers; the services themselves only borrow a connection.

pub mod duckdb;
