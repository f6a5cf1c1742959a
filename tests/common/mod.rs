//! Shared fixtures for integration tests.

#![allow(dead_code)]

use earnings_analytics::import_csv;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sample of the earnings dataset.
pub fn fixture_csv() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/freelancer_earnings_sample.csv")
}

/// Throwaway database loaded from the fixture.
///
/// Keep the `TempDir` alive for as long as the path is used.
pub async fn fixture_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("freelancer_earnings.db");
    import_csv(db_path.clone(), fixture_csv()).await.unwrap();
    (dir, db_path)
}

/// Row count read through a separate writable connection.
pub fn row_count(db_path: &Path) -> i64 {
    let conn = rusqlite::Connection::open(db_path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM freelancer_earnings", [], |row| row.get(0))
        .unwrap()
}
