//! SQL DDL for the corpus tables.
//!
//! Defines the `annotations_terms` and `coordinates` relations the query
//! layer reads, plus the `schema_meta` table. All DDL uses `IF NOT EXISTS`
//! for idempotent initialization. The query layer never writes to the
//! annotation relations; ingestion is owned by external tooling.

use rusqlite::Connection;

/// All schema DDL statements for the corpus tables.
const SCHEMA_SQL: &str = r#"
-- Term annotations: one row per (study, term) pair within a vocabulary
CREATE TABLE IF NOT EXISTS annotations_terms (
    study_id INTEGER NOT NULL,
    term TEXT NOT NULL CHECK(length(term) > 0),
    vocabulary TEXT NOT NULL DEFAULT 'terms',
    PRIMARY KEY (study_id, term, vocabulary)
);

CREATE INDEX IF NOT EXISTS idx_terms_term ON annotations_terms(term);
CREATE INDEX IF NOT EXISTS idx_terms_term_lower ON annotations_terms(LOWER(term));
CREATE INDEX IF NOT EXISTS idx_terms_vocabulary ON annotations_terms(vocabulary);

-- Reported activation coordinates: a study may report many peaks, and the
-- same peak may appear in many studies
CREATE TABLE IF NOT EXISTS coordinates (
    study_id INTEGER NOT NULL,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_coordinates_xyz ON coordinates(x, y, z);
CREATE INDEX IF NOT EXISTS idx_coordinates_study ON coordinates(study_id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"annotations_terms".to_string()));
        assert!(tables.contains(&"coordinates".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn empty_term_rejected_by_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO annotations_terms (study_id, term) VALUES (1, '')",
            [],
        );
        assert!(result.is_err());
    }
}
