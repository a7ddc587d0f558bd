//! HTTP serving layer.
//!
//! Exposes the original deployment's routes over axum: a health check at `/`
//! and the two dissociation endpoints. The engine stays transport-agnostic;
//! this module owns selector parsing from path segments, per-request strategy
//! overrides from query parameters, and the error-kind to status-code
//! mapping.

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Json;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lesion::config::LesionConfig;
use lesion::db;
use lesion::query::assemble::{self, DissociationPayload};
use lesion::query::dissociate::{dissociate, DissociateRequest};
use lesion::query::error::QueryError;
use lesion::query::strategy::MatchConfig;
use lesion::query::types::{Domain, Mode, Selector};
use lesion::query::CancelToken;

#[derive(Clone)]
struct AppState {
    conn: Arc<Mutex<rusqlite::Connection>>,
    config: Arc<LesionConfig>,
}

/// Per-request overrides accepted on both dissociation routes.
#[derive(Debug, Deserialize)]
struct DissociateParams {
    /// Compute `B \ A` as well.
    both: Option<bool>,
    /// Result cap; defaults to `query.default_limit`.
    limit: Option<usize>,
    /// Spatial neighborhood radius override in mm.
    radius: Option<f64>,
    /// Term strategy override: `exact`, `exact_ci`, or `substring`.
    #[serde(rename = "match")]
    term_match: Option<String>,
    /// Vocabulary scope override.
    vocabulary: Option<String>,
}

/// Start the HTTP server and block until shutdown.
pub async fn serve(config: LesionConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "corpus database ready");

    let state = AppState {
        conn: Arc::new(Mutex::new(conn)),
        config: Arc::new(config),
    };

    let router = axum::Router::new()
        .route("/", get(health))
        .route("/dissociate/terms/{a}/{b}", get(dissociate_terms))
        .route("/dissociate/locations/{a}/{b}", get(dissociate_locations))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}

async fn health() -> Html<&'static str> {
    Html("<p>Server working!</p>")
}

async fn dissociate_terms(
    State(state): State<AppState>,
    Path((a, b)): Path<(String, String)>,
    Query(params): Query<DissociateParams>,
) -> (StatusCode, Json<DissociationPayload>) {
    run_dissociation(state, Domain::Term, a, b, params).await
}

async fn dissociate_locations(
    State(state): State<AppState>,
    Path((a, b)): Path<(String, String)>,
    Query(params): Query<DissociateParams>,
) -> (StatusCode, Json<DissociationPayload>) {
    run_dissociation(state, Domain::Spatial, a, b, params).await
}

async fn run_dissociation(
    state: AppState,
    domain: Domain,
    raw_a: String,
    raw_b: String,
    params: DissociateParams,
) -> (StatusCode, Json<DissociationPayload>) {
    let mode = if params.both.unwrap_or(false) {
        Mode::Both
    } else {
        Mode::OneWay
    };

    let result = execute(&state, domain, &raw_a, &raw_b, mode, &params).await;

    match result {
        Ok(payload) => (StatusCode::OK, Json(payload)),
        Err(err) => {
            tracing::warn!(domain = %domain, a = %raw_a, b = %raw_b, error = %err, "dissociation failed");
            let status = status_for(&err);
            (
                status,
                Json(assemble::error_payload(domain, &raw_a, &raw_b, mode, &err)),
            )
        }
    }
}

async fn execute(
    state: &AppState,
    domain: Domain,
    raw_a: &str,
    raw_b: &str,
    mode: Mode,
    params: &DissociateParams,
) -> Result<DissociationPayload, QueryError> {
    let mut selector_a = Selector::parse(domain, raw_a)?;
    let mut selector_b = Selector::parse(domain, raw_b)?;

    if let Some(radius) = params.radius {
        apply_radius(&mut selector_a, radius);
        apply_radius(&mut selector_b, radius);
    }

    let mut strategy = MatchConfig {
        term: state.config.term_match(),
        spatial: state.config.spatial_match(),
    };
    if let Some(ref raw) = params.term_match {
        strategy.term = raw
            .parse()
            .map_err(QueryError::MalformedSelector)?;
    }

    let vocabulary = params
        .vocabulary
        .clone()
        .or_else(|| state.config.storage.vocabulary.clone());

    let request = DissociateRequest {
        selector_a,
        selector_b,
        mode,
        strategy,
        limit: Some(params.limit.unwrap_or(state.config.query.default_limit)),
        vocabulary,
    };

    let cancel = match state.config.query.timeout_ms {
        0 => CancelToken::none(),
        ms => CancelToken::with_deadline(Duration::from_millis(ms)),
    };

    let conn = Arc::clone(&state.conn);
    let limit = request.limit;
    let result = tokio::task::spawn_blocking(move || {
        let guard = conn
            .lock()
            .map_err(|_| QueryError::StoreUnavailable("connection mutex poisoned".into()))?;
        dissociate(&guard, &request, &cancel)
    })
    .await
    .map_err(|e| QueryError::StoreUnavailable(format!("query task failed: {e}")))??;

    Ok(assemble::payload(domain, raw_a, raw_b, &result, limit))
}

fn apply_radius(selector: &mut Selector, radius: f64) {
    if let Selector::Point { radius: slot, .. } = selector {
        *slot = Some(radius);
    }
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::MalformedSelector(_) => StatusCode::BAD_REQUEST,
        QueryError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        QueryError::ResolutionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        QueryError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        assert_eq!(
            status_for(&QueryError::MalformedSelector("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&QueryError::StoreUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&QueryError::Cancelled), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&QueryError::ResolutionFailed {
                source: rusqlite::Error::QueryReturnedNoRows,
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn radius_override_only_touches_point_selectors() {
        let mut term = Selector::Term { text: "pain".into() };
        apply_radius(&mut term, 4.0);
        assert_eq!(term, Selector::Term { text: "pain".into() });

        let mut point = Selector::parse(Domain::Spatial, "1_2_3").unwrap();
        apply_radius(&mut point, 4.0);
        match point {
            Selector::Point { radius, .. } => assert_eq!(radius, Some(4.0)),
            other => panic!("expected point selector, got {other:?}"),
        }
    }
}
