//! Axum route handlers for the Sessions API. Thin: parse, delegate to the
//! pipeline, wrap the result.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::pipeline::{self, GapQuestionRequest, JobSubmission, JobSubmissionOutcome};
use crate::session::Session;
use crate::state::AppState;
use crate::tailoring::ats_scorer::ScoreBreakdown;
use crate::tailoring::coverage::CoverageReport;
use crate::tailoring::gap_analyzer::InterviewQuestions;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    pub resume_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceResumeRequest {
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
pub struct CoverageResponse {
    #[serde(flatten)]
    pub report: CoverageReport,
    pub coverage_percent: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = pipeline::create_session(&state, request.user_id, request.resume_text).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(pipeline::get_session(&state, params.user_id, id).await?))
}

/// PUT /api/v1/sessions/:id/resume
pub async fn handle_replace_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(request): Json<ReplaceResumeRequest>,
) -> Result<Json<Session>, AppError> {
    let session = pipeline::replace_resume(&state, params.user_id, id, request.resume_text).await?;
    Ok(Json(session))
}

/// POST /api/v1/sessions/:id/job
///
/// Analysis always succeeds for non-empty text; a weak posting comes back
/// with an `INPUT_TOO_SPARSE` warning instead of an error.
pub async fn handle_submit_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(request): Json<JobSubmission>,
) -> Result<Json<JobSubmissionOutcome>, AppError> {
    Ok(Json(pipeline::submit_job(&state, params.user_id, id, request).await?))
}

/// POST /api/v1/sessions/:id/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(pipeline::tailor(&state, params.user_id, id).await?))
}

/// GET /api/v1/sessions/:id/score
pub async fn handle_get_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    Ok(Json(pipeline::score(&state, params.user_id, id).await?))
}

/// GET /api/v1/sessions/:id/coverage
pub async fn handle_get_coverage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CoverageResponse>, AppError> {
    let report = pipeline::coverage(&state, params.user_id, id).await?;
    Ok(Json(CoverageResponse {
        coverage_percent: report.percent(),
        report,
    }))
}

/// POST /api/v1/sessions/:id/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(pipeline::complete(&state, params.user_id, id).await?))
}

/// POST /api/v1/sessions/:id/interview-questions
///
/// Body is optional; an explicit job description overrides the session's.
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    request: Option<Json<GapQuestionRequest>>,
) -> Result<Json<InterviewQuestions>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(
        pipeline::interview_questions(&state, params.user_id, id, request).await?,
    ))
}
