//! Integration tests for the stratum migration engine
//!
//! These tests run against real in-memory DuckDB databases and real script
//! trees under a tempdir. Nothing on the database side is mocked.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::cell::Cell;
use std::fs;
use std::path::Path;

use duckdb::Connection;
use tempfile::TempDir;

use stratum_core::{
    load_catalog, AutoConfirm, Confirmation, Error, Ledger, MigrationService, Result,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn write_script(root: &Path, rel: &str, sql: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, sql).unwrap();
}

fn open_db() -> Connection {
    stratum_core::adapters::duckdb::open_in_memory().expect("Failed to open in-memory database")
}

fn table_exists(conn: &Connection, name: &str) -> bool {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            [name],
            |row| row.get(0),
        )
        .unwrap();
    count > 0
}

/// Gate that declines every prompt
struct DeclineAll;

impl Confirmation for DeclineAll {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Gate that affirms the first prompt and declines the rest
struct ConfirmFirstOnly {
    asked: Cell<u32>,
}

impl ConfirmFirstOnly {
    fn new() -> Self {
        Self { asked: Cell::new(0) }
    }
}

impl Confirmation for ConfirmFirstOnly {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        let asked = self.asked.get();
        self.asked.set(asked + 1);
        Ok(asked == 0)
    }
}

/// The three-script nested tree used by the ordering scenarios
fn nested_tree(tmp: &TempDir) {
    write_script(tmp.path(), "a_001.sql", "CREATE TABLE table_a (id INTEGER)");
    write_script(
        tmp.path(),
        "nested/b_002.sql",
        "CREATE TABLE table_b (id INTEGER)",
    );
    write_script(
        tmp.path(),
        "nested/deep/c_003.sql",
        "CREATE TABLE table_c (id INTEGER)",
    );
}

// ============================================================================
// Loader + Ordering
// ============================================================================

#[test]
fn test_nested_tree_orders_by_number() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);

    let catalog = load_catalog(tmp.path()).unwrap();
    assert_eq!(catalog.len(), 3);

    let paths: Vec<&str> = catalog.ordered().iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, vec!["a_001", "nested/b_002", "nested/deep/c_003"]);

    let numbers: Vec<u32> = catalog.ordered().iter().map(|s| s.number).collect();
    assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_invalid_name_fails_the_load() {
    let tmp = TempDir::new().unwrap();
    write_script(tmp.path(), "good_001.sql", "SELECT 1");
    write_script(tmp.path(), "bad-name.sql", "SELECT 1");

    let err = load_catalog(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::InvalidName(name) if name == "bad-name.sql"));
}

// ============================================================================
// Apply: idempotence, resumability, atomicity
// ============================================================================

#[test]
fn test_apply_commits_ordinals_one_to_n() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    let report = service.apply(&catalog).unwrap();

    assert_eq!(
        report.applied,
        vec!["a_001", "nested/b_002", "nested/deep/c_003"]
    );
    assert!(table_exists(&conn, "table_a"));
    assert!(table_exists(&conn, "table_b"));
    assert!(table_exists(&conn, "table_c"));

    let numbers: Vec<i64> = service
        .ledger()
        .entries(&conn)
        .unwrap()
        .iter()
        .map(|e| e.number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_second_apply_is_a_noop() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    let report = service.apply(&catalog).unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.already_applied, 3);
    assert_eq!(service.ledger().watermark(&conn).unwrap(), 3);
}

#[test]
fn test_resume_from_watermark_runs_only_the_tail() {
    let tmp = TempDir::new().unwrap();
    let conn = open_db();

    // First run sees only the first two scripts
    write_script(tmp.path(), "a_001.sql", "CREATE TABLE table_a (id INTEGER)");
    write_script(
        tmp.path(),
        "nested/b_002.sql",
        "CREATE TABLE table_b (id INTEGER)",
    );
    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();
    assert_eq!(service.ledger().watermark(&conn).unwrap(), 2);

    // A later run picks up the third script; only it executes
    write_script(
        tmp.path(),
        "nested/deep/c_003.sql",
        "CREATE TABLE table_c (id INTEGER)",
    );
    let catalog = load_catalog(tmp.path()).unwrap();
    let report = service.apply(&catalog).unwrap();

    assert_eq!(report.applied, vec!["nested/deep/c_003"]);
    assert_eq!(report.already_applied, 2);
    assert_eq!(service.ledger().watermark(&conn).unwrap(), 3);
}

#[test]
fn test_positions_at_or_below_watermark_are_skipped() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    // Pre-seed the ledger as if positions 1 and 2 ran in an earlier life;
    // their tables do not exist, so executing them again would fail loudly.
    let ledger = Ledger::new();
    ledger.ensure_initialized(&conn).unwrap();
    ledger.record_applied(&conn, 1).unwrap();
    ledger.record_applied(&conn, 2).unwrap();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    let report = service.apply(&catalog).unwrap();

    assert_eq!(report.applied, vec!["nested/deep/c_003"]);
    assert_eq!(report.already_applied, 2);
    assert!(table_exists(&conn, "table_c"));
    assert!(!table_exists(&conn, "table_a"));
    assert!(!table_exists(&conn, "table_b"));
}

#[test]
fn test_failure_rolls_back_the_whole_delta() {
    let tmp = TempDir::new().unwrap();
    let conn = open_db();

    write_script(tmp.path(), "a_001.sql", "CREATE TABLE table_a (id INTEGER)");
    write_script(tmp.path(), "b_002.sql", "INSERT INTO table_a VALUES (1)");
    write_script(tmp.path(), "c_003.sql", "INSERT INTO missing_table VALUES (1)");

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);

    let err = service.apply(&catalog).unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    // Nothing committed: no table, no ledger rows
    assert_eq!(service.ledger().watermark(&conn).unwrap(), 0);
    assert!(!table_exists(&conn, "table_a"));
}

#[test]
fn test_failure_preserves_earlier_watermark() {
    let tmp = TempDir::new().unwrap();
    let conn = open_db();

    write_script(tmp.path(), "a_001.sql", "CREATE TABLE table_a (id INTEGER)");
    write_script(tmp.path(), "b_002.sql", "INSERT INTO table_a VALUES (1)");
    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    // Third script fails; watermark must stay at 2
    write_script(tmp.path(), "c_003.sql", "INSERT INTO missing_table VALUES (1)");
    let catalog = load_catalog(tmp.path()).unwrap();
    service.apply(&catalog).unwrap_err();

    assert_eq!(service.ledger().watermark(&conn).unwrap(), 2);
}

// ============================================================================
// Confirmation gating
// ============================================================================

#[test]
fn test_declined_confirmation_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    let report = service.apply_confirmed(&catalog, &DeclineAll).unwrap();

    assert!(report.declined);
    assert!(report.applied.is_empty());
    assert_eq!(service.ledger().watermark(&conn).unwrap(), 0);
    assert!(!table_exists(&conn, "table_a"));
}

#[test]
fn test_gate_is_not_asked_when_nothing_is_pending() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    // DeclineAll would flip `declined` if it were consulted
    let report = service.apply_confirmed(&catalog, &DeclineAll).unwrap();
    assert!(!report.declined);
    assert_eq!(report.already_applied, 3);
}

// ============================================================================
// Bind arguments
// ============================================================================

#[test]
fn test_bound_args_reach_the_database() {
    let tmp = TempDir::new().unwrap();
    let conn = open_db();

    write_script(
        tmp.path(),
        "schema_001.sql",
        "CREATE TABLE settings (key VARCHAR, value INTEGER)",
    );
    write_script(
        tmp.path(),
        "seed_002.sql",
        "INSERT INTO settings (key, value) VALUES (?, ?)",
    );

    let mut catalog = load_catalog(tmp.path()).unwrap();
    catalog
        .bind_args(
            "seed_002",
            vec![serde_json::json!("answer"), serde_json::json!(42)],
        )
        .unwrap();

    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    let value: i64 = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?",
            ["answer"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, 42);
}

#[test]
fn test_bind_args_to_unknown_path_fails() {
    let tmp = TempDir::new().unwrap();
    write_script(tmp.path(), "a_001.sql", "SELECT 1");

    let mut catalog = load_catalog(tmp.path()).unwrap();
    let err = catalog
        .bind_args("nope_001", vec![serde_json::json!(1)])
        .unwrap_err();
    assert!(matches!(err, Error::ScriptNotFound(_)));
}

// ============================================================================
// Status
// ============================================================================

#[test]
fn test_status_marks_applied_prefix() {
    let tmp = TempDir::new().unwrap();
    let conn = open_db();

    write_script(tmp.path(), "a_001.sql", "CREATE TABLE table_a (id INTEGER)");
    write_script(tmp.path(), "b_002.sql", "CREATE TABLE table_b (id INTEGER)");
    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    write_script(tmp.path(), "c_003.sql", "CREATE TABLE table_c (id INTEGER)");
    let catalog = load_catalog(tmp.path()).unwrap();
    let status = service.status(&catalog).unwrap();

    assert_eq!(status.watermark, 2);
    assert_eq!(status.scripts.len(), 3);
    assert!(status.scripts[0].is_applied());
    assert!(status.scripts[1].is_applied());
    assert!(!status.scripts[2].is_applied());
    assert_eq!(status.scripts[2].position, 3);
}

// ============================================================================
// Custom ledger
// ============================================================================

#[test]
fn test_custom_ledger_table_is_honored() {
    let tmp = TempDir::new().unwrap();
    write_script(tmp.path(), "a_001.sql", "CREATE TABLE table_a (id INTEGER)");
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::with_ledger(&conn, Ledger::with_table("app_history"));
    service.apply(&catalog).unwrap();

    assert!(table_exists(&conn, "app_history"));
    assert_eq!(service.ledger().watermark(&conn).unwrap(), 1);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_teardown_drops_every_table_in_the_schema() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    let report = service.teardown("main", &AutoConfirm).unwrap();
    assert!(!report.declined);
    // The ledger lives in the schema too and goes down with it
    assert!(report.dropped.contains(&"table_a".to_string()));
    assert!(report.dropped.contains(&"sys_migrations".to_string()));
    assert!(!table_exists(&conn, "table_a"));
    assert!(!table_exists(&conn, "table_b"));
    assert!(!table_exists(&conn, "table_c"));
    assert!(!table_exists(&conn, "sys_migrations"));
}

#[test]
fn test_teardown_requires_both_confirmations() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    let report = service
        .teardown("main", &ConfirmFirstOnly::new())
        .unwrap();
    assert!(report.declined);
    assert!(table_exists(&conn, "table_a"));
    assert!(table_exists(&conn, "sys_migrations"));
}

#[test]
fn test_teardown_declined_outright_is_a_noop() {
    let tmp = TempDir::new().unwrap();
    nested_tree(&tmp);
    let conn = open_db();

    let catalog = load_catalog(tmp.path()).unwrap();
    let service = MigrationService::new(&conn);
    service.apply(&catalog).unwrap();

    let report = service.teardown("main", &DeclineAll).unwrap();
    assert!(report.declined);
    assert!(table_exists(&conn, "table_b"));
}
