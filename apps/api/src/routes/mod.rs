pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions API
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/sessions/:id/resume",
            put(handlers::handle_replace_resume),
        )
        .route("/api/v1/sessions/:id/job", post(handlers::handle_submit_job))
        .route("/api/v1/sessions/:id/tailor", post(handlers::handle_tailor))
        .route("/api/v1/sessions/:id/score", get(handlers::handle_get_score))
        .route(
            "/api/v1/sessions/:id/coverage",
            get(handlers::handle_get_coverage),
        )
        .route(
            "/api/v1/sessions/:id/complete",
            post(handlers::handle_complete),
        )
        .route(
            "/api/v1/sessions/:id/interview-questions",
            post(handlers::handle_interview_questions),
        )
        .with_state(state)
}
