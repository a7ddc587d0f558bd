#![allow(dead_code)]

use lesion::db;
use rusqlite::{params, Connection};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Tag a study with a term in the default vocabulary.
pub fn seed_term(conn: &Connection, study_id: i64, term: &str) {
    conn.execute(
        "INSERT OR IGNORE INTO annotations_terms (study_id, term) VALUES (?1, ?2)",
        params![study_id, term],
    )
    .unwrap();
}

/// Tag a study with a term in a specific vocabulary.
pub fn seed_term_in(conn: &Connection, study_id: i64, term: &str, vocabulary: &str) {
    conn.execute(
        "INSERT OR IGNORE INTO annotations_terms (study_id, term, vocabulary) VALUES (?1, ?2, ?3)",
        params![study_id, term, vocabulary],
    )
    .unwrap();
}

/// Record a reported activation peak for a study.
pub fn seed_peak(conn: &Connection, study_id: i64, x: f64, y: f64, z: f64) {
    conn.execute(
        "INSERT INTO coordinates (study_id, x, y, z) VALUES (?1, ?2, ?3, ?4)",
        params![study_id, x, y, z],
    )
    .unwrap();
}
