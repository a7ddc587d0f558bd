//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration is idempotent.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        match next {
            2 => migrate_v1_to_v2(conn)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }

        update_schema_version(conn, next)?;
        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: vocabulary column on `annotations_terms`.
///
/// Databases created before vocabulary scoping carry a two-column primary
/// key; rebuilding the table is the only way SQLite can widen it, so v1
/// rows are copied into the new shape under the default vocabulary.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    let has_vocabulary: bool = conn
        .prepare("SELECT COUNT(*) FROM pragma_table_info('annotations_terms') WHERE name = 'vocabulary'")?
        .query_row([], |row| row.get::<_, i64>(0))
        .map(|n| n > 0)?;

    if has_vocabulary {
        return Ok(());
    }

    conn.execute_batch(
        r#"
        CREATE TABLE annotations_terms_v2 (
            study_id INTEGER NOT NULL,
            term TEXT NOT NULL CHECK(length(term) > 0),
            vocabulary TEXT NOT NULL DEFAULT 'terms',
            PRIMARY KEY (study_id, term, vocabulary)
        );
        INSERT INTO annotations_terms_v2 (study_id, term)
            SELECT study_id, term FROM annotations_terms;
        DROP TABLE annotations_terms;
        ALTER TABLE annotations_terms_v2 RENAME TO annotations_terms;
        CREATE INDEX IF NOT EXISTS idx_terms_term ON annotations_terms(term);
        CREATE INDEX IF NOT EXISTS idx_terms_term_lower ON annotations_terms(LOWER(term));
        CREATE INDEX IF NOT EXISTS idx_terms_vocabulary ON annotations_terms(vocabulary);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    #[test]
    fn fresh_database_migrates_to_current() {
        let conn = Connection::open_in_memory().unwrap();
        schema::init_schema(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        schema::init_schema(&conn).unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn v1_table_gains_vocabulary_column() {
        let conn = Connection::open_in_memory().unwrap();
        // Hand-build a v1-shaped database: no vocabulary column
        conn.execute_batch(
            r#"
            CREATE TABLE annotations_terms (
                study_id INTEGER NOT NULL,
                term TEXT NOT NULL,
                PRIMARY KEY (study_id, term)
            );
            CREATE TABLE schema_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
            INSERT INTO schema_meta (key, value) VALUES ('schema_version', '1');
            INSERT INTO annotations_terms (study_id, term) VALUES (7, 'amygdala');
            "#,
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let (term, vocabulary): (String, String) = conn
            .query_row(
                "SELECT term, vocabulary FROM annotations_terms WHERE study_id = 7",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(term, "amygdala");
        assert_eq!(vocabulary, "terms");
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
