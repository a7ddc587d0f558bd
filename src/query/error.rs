//! Error taxonomy for the query layer.
//!
//! Every failure aborts the whole dissociation call — there is no partial
//! result. If B cannot be resolved, A's membership set is discarded rather
//! than returned alone; a difference without a valid subtrahend is
//! meaningless.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The input selector cannot be parsed: wrong coordinate arity,
    /// non-numeric component, or an empty term. Raised before any store
    /// access is attempted.
    #[error("malformed selector: {0}")]
    MalformedSelector(String),

    /// The underlying store cannot be reached. Retryable by the caller.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A query executed but the store reported an error. The underlying
    /// cause is preserved; retryable at caller discretion.
    #[error("resolution failed: {source}")]
    ResolutionFailed {
        #[from]
        source: rusqlite::Error,
    },

    /// Caller-initiated cancellation or deadline exceeded mid-resolution.
    #[error("query cancelled")]
    Cancelled,
}

impl QueryError {
    /// Whether the caller may reasonably retry the same request.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            QueryError::StoreUnavailable(_) | QueryError::ResolutionFailed { .. }
        )
    }
}
