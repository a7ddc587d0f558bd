//! Result assembly — shaping a [`Dissociation`] for a caller.
//!
//! Two output contracts exist among callers: a bare id array (the CLI, older
//! API consumers) and an annotated envelope echoing the input selectors with
//! an `ok`/`error` pair (the HTTP layer). Both are pure transforms over the
//! engine's result; the engine itself emits neither.

use serde::Serialize;

use crate::query::error::QueryError;
use crate::query::types::{Dissociation, Domain, Mode, StudyId};

/// The annotated response envelope.
#[derive(Debug, Serialize)]
pub struct DissociationPayload {
    pub ok: bool,
    pub domain: Domain,
    pub selector_a: String,
    pub selector_b: String,
    /// `A \ B`, ascending. Empty on failure.
    pub studies: Vec<StudyId>,
    /// `B \ A`, ascending. Present only for bidirectional requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<Vec<StudyId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Flatten to the bare id array contract. Bidirectional results flatten to
/// the forward direction; callers wanting both use the envelope.
pub fn flat(result: &Dissociation) -> Vec<StudyId> {
    result.forward.clone()
}

/// Build the annotated envelope for a successful dissociation.
///
/// `cap` defensively bounds both sequences; the engine has normally applied
/// the caller's limit already, so this only bites when a caller wires the
/// assembler to a differently-configured engine.
pub fn payload(
    domain: Domain,
    selector_a: &str,
    selector_b: &str,
    result: &Dissociation,
    cap: Option<usize>,
) -> DissociationPayload {
    DissociationPayload {
        ok: true,
        domain,
        selector_a: selector_a.to_string(),
        selector_b: selector_b.to_string(),
        studies: bounded(&result.forward, cap),
        reverse: result.reverse.as_ref().map(|r| bounded(r, cap)),
        error: None,
    }
}

/// Build the annotated envelope for a failed dissociation. The study arrays
/// stay empty — there is no partial result to report.
pub fn error_payload(
    domain: Domain,
    selector_a: &str,
    selector_b: &str,
    mode: Mode,
    error: &QueryError,
) -> DissociationPayload {
    DissociationPayload {
        ok: false,
        domain,
        selector_a: selector_a.to_string(),
        selector_b: selector_b.to_string(),
        studies: Vec::new(),
        reverse: match mode {
            Mode::Both => Some(Vec::new()),
            Mode::OneWay => None,
        },
        error: Some(error.to_string()),
    }
}

/// Copy a sorted sequence, dropping any duplicate neighbors and applying the
/// cap. Engine output is already deduplicated and sorted; this keeps the
/// assembler's contract independent of who produced the sequence.
fn bounded(ids: &[StudyId], cap: Option<usize>) -> Vec<StudyId> {
    let mut out: Vec<StudyId> = ids.to_vec();
    out.dedup();
    if let Some(cap) = cap {
        out.truncate(cap);
    }
    out
}
