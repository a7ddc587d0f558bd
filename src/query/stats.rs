use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Response from corpus_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Distinct studies appearing in either relation.
    pub studies: u64,
    pub term_annotations: u64,
    pub distinct_terms: u64,
    pub coordinates: u64,
    pub vocabularies: Vec<String>,
    pub db_size_bytes: u64,
}

/// Compute corpus statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory
/// databases.
pub fn corpus_stats(conn: &Connection, db_path: Option<&Path>) -> Result<StatsResponse> {
    let studies: i64 = conn.query_row(
        "SELECT COUNT(*) FROM (
            SELECT study_id FROM annotations_terms
            UNION
            SELECT study_id FROM coordinates
        )",
        [],
        |row| row.get(0),
    )?;

    let term_annotations: i64 =
        conn.query_row("SELECT COUNT(*) FROM annotations_terms", [], |row| row.get(0))?;

    let distinct_terms: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT term) FROM annotations_terms",
        [],
        |row| row.get(0),
    )?;

    let coordinates: i64 =
        conn.query_row("SELECT COUNT(*) FROM coordinates", [], |row| row.get(0))?;

    let vocabularies: Vec<String> = conn
        .prepare("SELECT DISTINCT vocabulary FROM annotations_terms ORDER BY vocabulary")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        studies: studies as u64,
        term_annotations: term_annotations as u64,
        distinct_terms: distinct_terms as u64,
        coordinates: coordinates as u64,
        vocabularies,
        db_size_bytes,
    })
}
