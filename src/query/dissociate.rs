//! The dissociation engine — two resolutions, one set algebra pass.
//!
//! [`dissociate`] is a stateless pure function over current store contents:
//! resolve A, resolve B, compute the requested difference(s). Each selector
//! is resolved exactly once even in bidirectional mode; both differences are
//! computed from the two cached membership sets. The engine performs no
//! retries — retry policy belongs to the caller.

use rusqlite::Connection;
use std::collections::HashSet;

use crate::query::error::QueryError;
use crate::query::resolver;
use crate::query::strategy::{MatchConfig, SpatialMatch};
use crate::query::types::{Dissociation, Mode, Selector, StudyId};
use crate::query::CancelToken;

/// A fully-parsed dissociation request.
#[derive(Debug, Clone)]
pub struct DissociateRequest {
    pub selector_a: Selector,
    pub selector_b: Selector,
    pub mode: Mode,
    pub strategy: MatchConfig,
    /// Cap on each returned sequence. Truncation happens after sorting, so a
    /// capped result is always a prefix of the full sorted result.
    pub limit: Option<usize>,
    /// Restrict term matching to one annotation vocabulary.
    pub vocabulary: Option<String>,
}

/// Compute the dissociation between two selectors.
///
/// Fails whole on any error: if B cannot be resolved, A's membership set is
/// discarded rather than returned alone.
pub fn dissociate(
    conn: &Connection,
    request: &DissociateRequest,
    cancel: &CancelToken,
) -> Result<Dissociation, QueryError> {
    if request.selector_a.domain() != request.selector_b.domain() {
        return Err(QueryError::MalformedSelector(format!(
            "selector domains disagree: {} vs {}",
            request.selector_a.domain(),
            request.selector_b.domain()
        )));
    }

    cancel.check()?;
    let set_a = resolve(conn, &request.selector_a, request, cancel)?;
    cancel.check()?;
    let set_b = resolve(conn, &request.selector_b, request, cancel)?;

    let forward = difference(&set_a, &set_b, request.limit);
    let reverse = match request.mode {
        Mode::OneWay => None,
        Mode::Both => Some(difference(&set_b, &set_a, request.limit)),
    };

    tracing::debug!(
        a = %request.selector_a,
        b = %request.selector_b,
        in_a = set_a.len(),
        in_b = set_b.len(),
        forward = forward.len(),
        "dissociation computed"
    );

    Ok(Dissociation { forward, reverse })
}

/// Resolve one selector to its membership set via the matching resolver.
fn resolve(
    conn: &Connection,
    selector: &Selector,
    request: &DissociateRequest,
    cancel: &CancelToken,
) -> Result<HashSet<StudyId>, QueryError> {
    match selector {
        Selector::Term { text } => resolver::resolve_term_membership(
            conn,
            text,
            request.strategy.term,
            request.vocabulary.as_deref(),
            cancel,
        ),
        Selector::Point { point, radius } => {
            let strategy = match (radius, request.strategy.spatial) {
                // Per-selector radius override wins over the configured rule
                (Some(r), _) => {
                    if !r.is_finite() || *r < 0.0 {
                        return Err(QueryError::MalformedSelector(format!(
                            "invalid radius: {r}"
                        )));
                    }
                    SpatialMatch::Radius { radius: *r }
                }
                (None, configured) => configured,
            };
            resolver::resolve_spatial_membership(conn, point, strategy, cancel)
        }
    }
}

/// `A \ B`, sorted ascending, optionally truncated to the sorted prefix.
fn difference(
    a: &HashSet<StudyId>,
    b: &HashSet<StudyId>,
    limit: Option<usize>,
) -> Vec<StudyId> {
    let mut result: Vec<StudyId> = a.iter().filter(|s| !b.contains(s)).copied().collect();
    result.sort_unstable();
    if let Some(limit) = limit {
        result.truncate(limit);
    }
    result
}
