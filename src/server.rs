use crate::error::FactCheckError;
use crate::models::{FactCheckRequest, FactCheckResponse};
use crate::pipeline::FactChecker;
use crate::report;
use crate::session::ActiveRuns;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct AppState {
    pub checker: FactChecker,
    pub active: ActiveRuns,
}

impl AppState {
    pub fn new(checker: FactChecker) -> Self {
        Self {
            checker,
            active: ActiveRuns::new(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    AlreadyRunning,
    Export(serde_json::Error),
    FactCheck(FactCheckError),
}

impl From<FactCheckError> for ApiError {
    fn from(err: FactCheckError) -> Self {
        Self::FactCheck(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::AlreadyRunning => (
                StatusCode::CONFLICT,
                "a fact-check for this claim is already running".to_string(),
            ),
            ApiError::Export(err) => {
                tracing::error!("report export failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("report export failed: {err}"))
            }
            ApiError::FactCheck(err) => {
                let status = match &err {
                    FactCheckError::EmptyClaim => StatusCode::BAD_REQUEST,
                    FactCheckError::Generation { .. } => StatusCode::BAD_GATEWAY,
                    FactCheckError::Configuration(_) | FactCheckError::Workflow(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                tracing::error!(%status, "fact-check failed: {}", err);
                (status, err.to_string())
            }
        };
        (status, message).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fact-check", post(fact_check))
        .route("/fact-check/report", post(fact_check_report))
        .route("/fact-check/export", post(fact_check_export))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn run_guarded(state: &AppState, claim: &str) -> Result<FactCheckResponse, ApiError> {
    if claim.trim().is_empty() {
        return Err(FactCheckError::EmptyClaim.into());
    }
    let _guard = state.active.try_begin(claim).ok_or(ApiError::AlreadyRunning)?;
    Ok(state.checker.check(claim).await?)
}

#[instrument(skip(state, req))]
async fn fact_check(
    State(state): State<AppState>,
    Json(req): Json<FactCheckRequest>,
) -> Result<Json<FactCheckResponse>, ApiError> {
    let run = run_guarded(&state, &req.claim).await?;
    info!(session = %run.session_id, verdict = %run.report.verdict, "fact-check served");
    Ok(Json(run))
}

#[instrument(skip(state, req))]
async fn fact_check_report(
    State(state): State<AppState>,
    Json(req): Json<FactCheckRequest>,
) -> Result<Response, ApiError> {
    let run = run_guarded(&state, &req.claim).await?;
    let text = report::render_text(&run, chrono::Local::now());
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
}

/// The final report alone, as a downloadable JSON file.
#[instrument(skip(state, req))]
async fn fact_check_export(
    State(state): State<AppState>,
    Json(req): Json<FactCheckRequest>,
) -> Result<Response, ApiError> {
    let run = run_guarded(&state, &req.claim).await?;
    let body = report::to_json(&run.report).map_err(ApiError::Export)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"fact_check_report.json\""),
        ],
        body,
    )
        .into_response())
}
