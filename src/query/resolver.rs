//! Membership resolution — from a selector to the set of matching study ids.
//!
//! Each resolver runs one read-only scan: a SQL prefilter narrowed by the
//! matching strategy (so the store's indexes do the heavy lifting), with the
//! pure predicate re-applied to every projected row as the final authority.
//! Results are distinct study identifiers; the engine owns ordering.
//!
//! Resolution is idempotent and side-effect-free. The two resolver calls a
//! dissociation makes share a connection but not a snapshot — a row written
//! between them may be inconsistently reflected, which is an accepted
//! consistency limitation, not a defect to hide.

use rusqlite::{params, Connection, ToSql};
use std::collections::HashSet;

use crate::query::error::QueryError;
use crate::query::strategy::{SpatialMatch, TermMatch};
use crate::query::types::{Point, StudyId};
use crate::query::CancelToken;

/// Resolve the membership set for a term selector.
///
/// When `vocabulary` is given, matching is restricted to that annotation
/// vocabulary; otherwise all vocabularies are scanned.
pub fn resolve_term_membership(
    conn: &Connection,
    query: &str,
    strategy: TermMatch,
    vocabulary: Option<&str>,
    cancel: &CancelToken,
) -> Result<HashSet<StudyId>, QueryError> {
    cancel.check()?;

    let prefilter = match strategy {
        TermMatch::Exact => "term = ?1",
        TermMatch::ExactCaseInsensitive => "LOWER(term) = LOWER(?1)",
        // instr cannot use an index; the vocabulary filter still can
        TermMatch::Substring => "instr(LOWER(term), LOWER(?1)) > 0",
    };

    let mut sql = format!(
        "SELECT DISTINCT study_id, term FROM annotations_terms WHERE {prefilter}"
    );
    let mut params: Vec<&dyn ToSql> = vec![&query];
    if let Some(ref vocab) = vocabulary {
        sql.push_str(" AND vocabulary = ?2");
        params.push(vocab);
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params.as_slice())?;

    let mut members = HashSet::new();
    while let Some(row) = rows.next()? {
        cancel.check()?;
        let study_id: StudyId = row.get(0)?;
        let stored: String = row.get(1)?;
        if strategy.matches(&stored, query) {
            members.insert(study_id);
        }
    }

    tracing::debug!(
        query,
        strategy = %strategy,
        members = members.len(),
        "term membership resolved"
    );
    Ok(members)
}

/// Resolve the membership set for a spatial selector.
///
/// The SQL prefilter is the axis-aligned bounding box around the query point
/// (served by the composite coordinate index); the strategy's predicate then
/// decides exact membership, so a radius query never admits box corners.
pub fn resolve_spatial_membership(
    conn: &Connection,
    query: &Point,
    strategy: SpatialMatch,
    cancel: &CancelToken,
) -> Result<HashSet<StudyId>, QueryError> {
    cancel.check()?;

    let half = strategy.bounding_half_width();
    let mut stmt = conn.prepare(
        "SELECT DISTINCT study_id, x, y, z FROM coordinates \
         WHERE x BETWEEN ?1 AND ?2 AND y BETWEEN ?3 AND ?4 AND z BETWEEN ?5 AND ?6",
    )?;
    let mut rows = stmt.query(params![
        query.x - half,
        query.x + half,
        query.y - half,
        query.y + half,
        query.z - half,
        query.z + half,
    ])?;

    let mut members = HashSet::new();
    while let Some(row) = rows.next()? {
        cancel.check()?;
        let study_id: StudyId = row.get(0)?;
        let stored = Point::new(row.get(1)?, row.get(2)?, row.get(3)?);
        if strategy.matches(&stored, query) {
            members.insert(study_id);
        }
    }

    tracing::debug!(
        point = %query,
        members = members.len(),
        "spatial membership resolved"
    );
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    fn seed_term(conn: &Connection, study_id: StudyId, term: &str) {
        conn.execute(
            "INSERT OR IGNORE INTO annotations_terms (study_id, term) VALUES (?1, ?2)",
            params![study_id, term],
        )
        .unwrap();
    }

    fn seed_term_in(conn: &Connection, study_id: StudyId, term: &str, vocabulary: &str) {
        conn.execute(
            "INSERT OR IGNORE INTO annotations_terms (study_id, term, vocabulary) VALUES (?1, ?2, ?3)",
            params![study_id, term, vocabulary],
        )
        .unwrap();
    }

    fn seed_peak(conn: &Connection, study_id: StudyId, x: f64, y: f64, z: f64) {
        conn.execute(
            "INSERT INTO coordinates (study_id, x, y, z) VALUES (?1, ?2, ?3, ?4)",
            params![study_id, x, y, z],
        )
        .unwrap();
    }

    #[test]
    fn exact_ci_matches_case_variants_only() {
        let conn = test_db();
        seed_term(&conn, 1, "Amygdala");
        seed_term(&conn, 2, "Amygdala");
        seed_term(&conn, 3, "amygdala");
        seed_term(&conn, 4, "amygdala nucleus");

        let members = resolve_term_membership(
            &conn,
            "amygdala",
            TermMatch::ExactCaseInsensitive,
            None,
            &CancelToken::none(),
        )
        .unwrap();

        assert_eq!(members, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn substring_also_matches_containing_terms() {
        let conn = test_db();
        seed_term(&conn, 1, "Amygdala");
        seed_term(&conn, 4, "amygdala nucleus");
        seed_term(&conn, 5, "hippocampus");

        let members = resolve_term_membership(
            &conn,
            "amygdala",
            TermMatch::Substring,
            None,
            &CancelToken::none(),
        )
        .unwrap();

        assert_eq!(members, HashSet::from([1, 4]));
    }

    #[test]
    fn exact_is_byte_sensitive() {
        let conn = test_db();
        seed_term(&conn, 1, "Amygdala");
        seed_term(&conn, 2, "amygdala");

        let members = resolve_term_membership(
            &conn,
            "amygdala",
            TermMatch::Exact,
            None,
            &CancelToken::none(),
        )
        .unwrap();

        assert_eq!(members, HashSet::from([2]));
    }

    #[test]
    fn vocabulary_filter_scopes_matching() {
        let conn = test_db();
        seed_term_in(&conn, 1, "pain", "terms_abstract");
        seed_term_in(&conn, 2, "pain", "terms_title");

        let members = resolve_term_membership(
            &conn,
            "pain",
            TermMatch::ExactCaseInsensitive,
            Some("terms_abstract"),
            &CancelToken::none(),
        )
        .unwrap();
        assert_eq!(members, HashSet::from([1]));

        let members = resolve_term_membership(
            &conn,
            "pain",
            TermMatch::ExactCaseInsensitive,
            None,
            &CancelToken::none(),
        )
        .unwrap();
        assert_eq!(members, HashSet::from([1, 2]));
    }

    #[test]
    fn duplicate_annotations_yield_one_membership() {
        let conn = test_db();
        // Same study tagged in two vocabularies
        seed_term_in(&conn, 9, "reward", "terms_abstract");
        seed_term_in(&conn, 9, "reward", "terms_title");

        let members = resolve_term_membership(
            &conn,
            "reward",
            TermMatch::ExactCaseInsensitive,
            None,
            &CancelToken::none(),
        )
        .unwrap();
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn spatial_exact_distinguishes_nearby_points() {
        let conn = test_db();
        seed_peak(&conn, 1, 10.0, 20.0, 30.0);
        seed_peak(&conn, 2, 10.0, 20.0, 31.0);

        let members = resolve_spatial_membership(
            &conn,
            &Point::new(10.0, 20.0, 30.0),
            SpatialMatch::Exact { epsilon: 1e-6 },
            &CancelToken::none(),
        )
        .unwrap();

        assert_eq!(members, HashSet::from([1]));
    }

    #[test]
    fn spatial_radius_merges_the_neighborhood() {
        let conn = test_db();
        seed_peak(&conn, 1, 10.0, 20.0, 30.0);
        seed_peak(&conn, 2, 10.0, 20.0, 31.0); // distance 1
        seed_peak(&conn, 3, 20.0, 20.0, 30.0); // distance 10

        let members = resolve_spatial_membership(
            &conn,
            &Point::new(10.0, 20.0, 30.0),
            SpatialMatch::Radius { radius: 2.0 },
            &CancelToken::none(),
        )
        .unwrap();

        assert_eq!(members, HashSet::from([1, 2]));
    }

    #[test]
    fn radius_rejects_bounding_box_corners() {
        let conn = test_db();
        // Inside the 2mm bounding box but at Euclidean distance sqrt(12) > 2
        seed_peak(&conn, 1, 12.0, 22.0, 32.0);

        let members = resolve_spatial_membership(
            &conn,
            &Point::new(10.0, 20.0, 30.0),
            SpatialMatch::Radius { radius: 2.0 },
            &CancelToken::none(),
        )
        .unwrap();

        assert!(members.is_empty());
    }

    #[test]
    fn study_with_many_peaks_appears_once() {
        let conn = test_db();
        seed_peak(&conn, 5, 10.0, 20.0, 30.0);
        seed_peak(&conn, 5, 10.5, 20.0, 30.0);
        seed_peak(&conn, 5, 10.0, 20.5, 30.0);

        let members = resolve_spatial_membership(
            &conn,
            &Point::new(10.0, 20.0, 30.0),
            SpatialMatch::Radius { radius: 2.0 },
            &CancelToken::none(),
        )
        .unwrap();

        assert_eq!(members.len(), 1);
        assert!(members.contains(&5));
    }

    #[test]
    fn cancelled_token_aborts_before_scan() {
        let conn = test_db();
        seed_term(&conn, 1, "pain");

        let token = CancelToken::none();
        token.cancel();

        let result = resolve_term_membership(
            &conn,
            "pain",
            TermMatch::ExactCaseInsensitive,
            None,
            &token,
        );
        assert!(matches!(result, Err(QueryError::Cancelled)));
    }
}
