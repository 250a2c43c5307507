//! Session operations: read, transition, commit.
//!
//! Every state change follows the same shape: check the transition on a fresh
//! read, issue a token, re-read, run the pure stages on an owned copy, then
//! commit with `replace_if_current`. Any error (or a dropped request) before
//! the commit leaves the stored session untouched. A request that is refused
//! never claims a token, so it cannot turn a running tailor into a stale one.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::job::{analyze_job, JobAnalysis, JobMetadata, JobPosting, PipelineWarning};
use crate::analysis::role_classifier::{classify, RoleArchetype};
use crate::errors::AppError;
use crate::session::{RequestToken, Session};
use crate::state::AppState;
use crate::tailoring::ats_scorer::ScoreBreakdown;
use crate::tailoring::content_generator::generate_tailored_content;
use crate::tailoring::coverage::CoverageReport;
use crate::tailoring::gap_analyzer::{GapInput, InterviewQuestions};

// ────────────────────────────────────────────────────────────────────────────
// Inputs / outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct JobSubmission {
    pub job_description: String,
    pub source_url: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSubmissionOutcome {
    pub session: Session,
    pub warnings: Vec<PipelineWarning>,
}

/// Explicit job details for gap questions. Without `job_description` the
/// session's own analysis is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GapQuestionRequest {
    pub job_description: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

pub async fn create_session(
    state: &AppState,
    user_id: Uuid,
    resume_text: Option<String>,
) -> Result<Session, AppError> {
    let session = Session::new(user_id, resume_text);
    state.store.insert(&session).await?;
    info!("Created session {} for user {user_id}", session.id);
    Ok(session)
}

pub async fn get_session(state: &AppState, user_id: Uuid, id: Uuid) -> Result<Session, AppError> {
    state.store.get(user_id, id).await
}

pub async fn replace_resume(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    resume_text: String,
) -> Result<Session, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    let (token, mut session) =
        claim_token(state, user_id, id, Session::ensure_can_replace_resume).await?;
    session.replace_resume(resume_text)?;
    state.store.replace_if_current(&session, token).await?;
    Ok(session)
}

/// Ingests and analyzes a job description, moving the session to `analyzing`.
/// Quality gate failures come back as warnings, never errors.
pub async fn submit_job(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    submission: JobSubmission,
) -> Result<JobSubmissionOutcome, AppError> {
    if submission.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }
    let token = state.store.issue_token(user_id, id).await?;
    let mut session = state.store.get(user_id, id).await?;

    let posting = JobPosting::ingest(submission.job_description, submission.source_url);
    let metadata = JobMetadata {
        title: submission.job_title,
        company: submission.company,
    };
    let analysis = analyze_job(&posting, &metadata, &state.taxonomy, &state.tailoring.quality);
    let warnings = analysis.warnings();
    info!(
        "Session {id}: analyzed '{}' as {} ({} keywords, {} warnings)",
        analysis.title,
        analysis.archetype.label(),
        analysis.keywords.total(),
        warnings.len()
    );

    session.submit_job(posting, analysis);
    state.store.replace_if_current(&session, token).await?;
    Ok(JobSubmissionOutcome { session, warnings })
}

/// Runs ContentGenerator → ATSScorer → CoverageReporter and commits the
/// result. One run per session at a time.
pub async fn tailor(state: &AppState, user_id: Uuid, id: Uuid) -> Result<Session, AppError> {
    let _guard = state
        .in_flight
        .try_acquire(id)
        .ok_or(AppError::TailoringInProgress)?;

    let (token, mut session) = claim_token(state, user_id, id, |s| {
        s.ensure_can_tailor()?;
        s.resume().map(|_| ()).ok_or(AppError::NoResumeContent)
    })
    .await?;
    let analysis = session.ensure_can_tailor()?;
    let resume_text = session.resume().ok_or(AppError::NoResumeContent)?;

    let run = generate_tailored_content(
        state.oracle.as_ref(),
        &state.taxonomy,
        &state.scorer,
        resume_text,
        analysis,
    )
    .await?;

    session.record_tailored(run)?;
    state.store.replace_if_current(&session, token).await?;
    info!("Session {id}: tailored content committed");
    Ok(session)
}

pub async fn complete(state: &AppState, user_id: Uuid, id: Uuid) -> Result<Session, AppError> {
    let (token, mut session) =
        claim_token(state, user_id, id, Session::ensure_can_complete).await?;
    session.complete()?;
    state.store.replace_if_current(&session, token).await?;
    Ok(session)
}

/// Runs `check` against the current session and only then issues a token,
/// returning it with a read taken under that token.
async fn claim_token(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    check: impl Fn(&Session) -> Result<(), AppError>,
) -> Result<(RequestToken, Session), AppError> {
    check(&state.store.get(user_id, id).await?)?;
    let token = state.store.issue_token(user_id, id).await?;
    let session = state.store.get(user_id, id).await?;
    Ok((token, session))
}

pub async fn score(state: &AppState, user_id: Uuid, id: Uuid) -> Result<ScoreBreakdown, AppError> {
    let session = state.store.get(user_id, id).await?;
    Ok(session.tailored_content()?.score.clone())
}

pub async fn coverage(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<CoverageReport, AppError> {
    let session = state.store.get(user_id, id).await?;
    Ok(session.tailored_content()?.coverage.clone())
}

/// Gap questions for the session. Read-only; nothing is committed.
pub async fn interview_questions(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    request: GapQuestionRequest,
) -> Result<InterviewQuestions, AppError> {
    let session = state.store.get(user_id, id).await?;

    let explicit: Option<JobAnalysis> = request
        .job_description
        .as_deref()
        .filter(|jd| !jd.trim().is_empty())
        .map(|jd| {
            let posting = JobPosting::ingest(jd, None);
            let metadata = JobMetadata {
                title: request.job_title.clone(),
                company: request.company.clone(),
            };
            analyze_job(&posting, &metadata, &state.taxonomy, &state.tailoring.quality)
        });

    // Tailored coverage belongs to the session's own job, not an explicit one.
    let (analysis, tailored) = match &explicit {
        Some(analysis) => (Some(analysis), None),
        None => (session.analysis.as_ref(), session.tailored.as_ref()),
    };
    let archetype = request
        .job_title
        .as_deref()
        .map(|title| classify("", title))
        .unwrap_or(RoleArchetype::GenericDataRole);

    state
        .gap_analyzer
        .analyze(
            state.oracle.as_ref(),
            &state.taxonomy,
            GapInput {
                resume_text: session.resume().unwrap_or_default(),
                tailored,
                analysis,
                archetype,
            },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::taxonomy::Category;
    use crate::session::SessionStatus;
    use crate::tailoring::gap_analyzer::QuestionMode;
    use crate::config::TailoringConfig;
    use crate::tailoring::ats_scorer::ScoreWeights;
    use crate::test_support::{
        cloud_job_description, dba_job_description, gap_answers, resume_body, test_state,
        test_state_with, GatedOracle, ScriptedOracle, ON_PREM_RESUME,
    };
    use serde_json::json;

    fn submission(text: String) -> JobSubmission {
        JobSubmission {
            job_description: text,
            source_url: None,
            job_title: None,
            company: None,
        }
    }

    async fn analyzing_session(state: &AppState, jd: String) -> Session {
        let user = Uuid::new_v4();
        let session = create_session(state, user, Some(ON_PREM_RESUME.to_string()))
            .await
            .unwrap();
        submit_job(state, user, session.id, submission(jd))
            .await
            .unwrap()
            .session
    }

    #[tokio::test]
    async fn test_scenario_cloud_job_against_on_prem_resume() {
        let mut script = vec![Ok(json!({
            "summary": "Database administrator with nine years running SQL Server estates.",
            "experience": [{
                "title": "Lead DBA",
                "company": "Contoso Retail",
                "duration": "2019 - 2024",
                "achievements": ["Cut average query time by 45% through performance tuning"]
            }],
            "skills": ["SQL Server", "T-SQL", "PowerShell", "Performance Tuning"]
        }))];
        script.extend(gap_answers(5));
        let oracle = ScriptedOracle::new(script);
        let state = test_state(oracle.clone());

        let session = analyzing_session(&state, cloud_job_description()).await;
        let tailored = tailor(&state, session.user_id, session.id).await.unwrap();
        let content = tailored.tailored.as_ref().unwrap();

        let core = content.score.category(Category::CoreTech).unwrap();
        assert!(core.earned < core.possible / 2, "core {}/{}", core.earned, core.possible);
        assert!(!core.evidence.iter().any(|e| e.keyword == "Azure SQL Database"));
        assert!(content.coverage.missing_keywords.contains("Azure SQL Database"));

        let questions = interview_questions(
            &state,
            session.user_id,
            session.id,
            GapQuestionRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(questions.mode, QuestionMode::Gap);
        assert!(questions
            .questions
            .iter()
            .any(|q| q.topic == "Gap: Azure SQL Database"));
    }

    #[tokio::test]
    async fn test_scenario_short_job_warns_but_still_tailors() {
        let oracle = ScriptedOracle::new(vec![Ok(resume_body())]);
        let state = test_state(oracle);
        let user = Uuid::new_v4();
        let session = create_session(&state, user, Some(ON_PREM_RESUME.to_string()))
            .await
            .unwrap();

        let short = "Senior DBA\nRequirements:\n- SQL Server\n- T-SQL\n- PowerShell\n- Backups".to_string();
        let outcome = submit_job(&state, user, session.id, submission(short)).await.unwrap();
        let analysis = outcome.session.analysis.as_ref().unwrap();
        assert!(!analysis.quality.sufficient_length);
        assert!(matches!(
            outcome.warnings.as_slice(),
            [PipelineWarning::InputTooSparse { .. }]
        ));

        let tailored = tailor(&state, user, session.id).await.unwrap();
        assert_eq!(tailored.status, SessionStatus::Tailored);
        assert!(tailored.tailored.is_some());
    }

    #[tokio::test]
    async fn test_scenario_disaster_recovery_is_hands_on_and_kept() {
        let oracle = ScriptedOracle::new(vec![Ok(resume_body())]);
        let state = test_state(oracle);
        let session = analyzing_session(&state, dba_job_description()).await;

        let tailored = tailor(&state, session.user_id, session.id).await.unwrap();
        let content = tailored.tailored.as_ref().unwrap();
        let assignment = tailored
            .truth_assignments
            .iter()
            .find(|a| a.keyword == "High Availability & Disaster Recovery")
            .unwrap();
        assert_eq!(
            assignment.level,
            crate::tailoring::truthfulness::TruthLevel::HandsOn
        );
        let text = content.body.full_text().to_lowercase();
        assert!(text.contains("disaster recovery"));
    }

    #[tokio::test]
    async fn test_scenario_resubmission_replaces_tailored_content() {
        let oracle = ScriptedOracle::new(vec![Ok(resume_body()), Ok(resume_body())]);
        let state = test_state(oracle);
        let session = analyzing_session(&state, dba_job_description()).await;
        let (user, id) = (session.user_id, session.id);

        let first = tailor(&state, user, id).await.unwrap();
        let first_content = first.tailored.clone().unwrap();

        let resubmitted = submit_job(&state, user, id, submission(cloud_job_description()))
            .await
            .unwrap()
            .session;
        assert_eq!(resubmitted.status, SessionStatus::Analyzing);
        assert!(resubmitted.tailored.is_none());

        let second = tailor(&state, user, id).await.unwrap();
        let second_content = second.tailored.unwrap();
        assert_ne!(second_content.coverage, first_content.coverage);
        assert!(second
            .truth_assignments
            .iter()
            .all(|a| resubmitted.analysis.as_ref().unwrap().keywords.all_keywords().contains(&a.keyword)));
    }

    #[tokio::test]
    async fn test_tailor_is_refused_while_another_run_holds_the_session() {
        let state = test_state(ScriptedOracle::new(vec![]));
        let session = analyzing_session(&state, dba_job_description()).await;
        let _held = state.in_flight.try_acquire(session.id).unwrap();

        let result = tailor(&state, session.user_id, session.id).await;
        assert!(matches!(result, Err(AppError::TailoringInProgress)));
    }

    #[tokio::test]
    async fn test_refused_request_does_not_stale_a_running_tailor() {
        let oracle = GatedOracle::new(ScriptedOracle::new(vec![Ok(resume_body())]));
        let state = test_state(oracle.clone());
        let session = analyzing_session(&state, dba_job_description()).await;
        let (user, id) = (session.user_id, session.id);

        let running = tokio::spawn({
            let state = state.clone();
            async move { tailor(&state, user, id).await }
        });
        oracle.entered().await;

        assert!(matches!(
            complete(&state, user, id).await,
            Err(AppError::InvalidTransition { from: SessionStatus::Analyzing, .. })
        ));
        assert!(matches!(
            tailor(&state, user, id).await,
            Err(AppError::TailoringInProgress)
        ));

        oracle.release();
        let tailored = running.await.unwrap().unwrap();
        assert_eq!(tailored.status, SessionStatus::Tailored);

        let stored = get_session(&state, user, id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Tailored);
        assert!(stored.tailored.is_some());
    }

    #[tokio::test]
    async fn test_resubmitting_during_tailor_discards_the_run() {
        let oracle = GatedOracle::new(ScriptedOracle::new(vec![Ok(resume_body())]));
        let state = test_state(oracle.clone());
        let session = analyzing_session(&state, dba_job_description()).await;
        let (user, id) = (session.user_id, session.id);

        let running = tokio::spawn({
            let state = state.clone();
            async move { tailor(&state, user, id).await }
        });
        oracle.entered().await;
        submit_job(&state, user, id, submission(cloud_job_description()))
            .await
            .unwrap();

        oracle.release();
        assert!(matches!(running.await.unwrap(), Err(AppError::StaleResult)));

        let stored = get_session(&state, user, id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Analyzing);
        assert!(stored.tailored.is_none());
    }

    #[tokio::test]
    async fn test_refused_transition_leaves_token_alone() {
        let state = test_state(ScriptedOracle::new(vec![]));
        let session = analyzing_session(&state, dba_job_description()).await;
        let (user, id) = (session.user_id, session.id);
        let before = get_session(&state, user, id).await.unwrap().latest_token;

        assert!(complete(&state, user, id).await.is_err());
        assert_eq!(get_session(&state, user, id).await.unwrap().latest_token, before);
    }

    #[tokio::test]
    async fn test_configured_weights_reach_the_score() {
        let tailoring = TailoringConfig {
            score_weights: ScoreWeights::new(50, 20, 10, 10, 5, 5).unwrap(),
            ..Default::default()
        };
        let state = test_state_with(ScriptedOracle::new(vec![Ok(resume_body())]), tailoring);
        let session = analyzing_session(&state, dba_job_description()).await;

        tailor(&state, session.user_id, session.id).await.unwrap();
        let breakdown = score(&state, session.user_id, session.id).await.unwrap();
        assert_eq!(breakdown.category(Category::CoreTech).unwrap().possible, 50);
        assert_eq!(breakdown.category(Category::Logistics).unwrap().possible, 5);
        assert_eq!(breakdown.categories.iter().map(|c| c.possible).sum::<u32>(), 100);
    }

    #[tokio::test]
    async fn test_failed_tailoring_leaves_session_untouched() {
        let state = test_state(ScriptedOracle::failing());
        let session = analyzing_session(&state, dba_job_description()).await;

        let result = tailor(&state, session.user_id, session.id).await;
        assert!(matches!(result, Err(AppError::OracleUnavailable(_))));

        let stored = get_session(&state, session.user_id, session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Analyzing);
        assert!(stored.tailored.is_none());
        assert!(!state.in_flight.is_active(session.id));
    }

    #[tokio::test]
    async fn test_tailor_without_job_is_invalid_transition() {
        let state = test_state(ScriptedOracle::new(vec![]));
        let user = Uuid::new_v4();
        let session = create_session(&state, user, Some(ON_PREM_RESUME.to_string()))
            .await
            .unwrap();
        assert!(matches!(
            tailor(&state, user, session.id).await,
            Err(AppError::InvalidTransition { from: SessionStatus::Draft, .. })
        ));
    }

    #[tokio::test]
    async fn test_tailor_without_resume_is_no_resume_content() {
        let state = test_state(ScriptedOracle::new(vec![]));
        let user = Uuid::new_v4();
        let session = create_session(&state, user, None).await.unwrap();
        submit_job(&state, user, session.id, submission(dba_job_description()))
            .await
            .unwrap();
        assert!(matches!(
            tailor(&state, user, session.id).await,
            Err(AppError::NoResumeContent)
        ));
    }

    #[tokio::test]
    async fn test_score_and_coverage_require_tailored_content() {
        let oracle = ScriptedOracle::new(vec![Ok(resume_body())]);
        let state = test_state(oracle);
        let session = analyzing_session(&state, dba_job_description()).await;
        let (user, id) = (session.user_id, session.id);

        assert!(matches!(score(&state, user, id).await, Err(AppError::Conflict(_))));

        tailor(&state, user, id).await.unwrap();
        let breakdown = score(&state, user, id).await.unwrap();
        assert_eq!(breakdown.categories.iter().map(|c| c.possible).sum::<u32>(), 100);
        let report = coverage(&state, user, id).await.unwrap();
        assert!(report.matched_keywords.contains("SQL Server"));

        let completed = complete(&state, user, id).await.unwrap();
        assert_eq!(completed.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_interview_questions_without_job_use_general_set() {
        let state = test_state(ScriptedOracle::new(vec![]));
        let user = Uuid::new_v4();
        let session = create_session(&state, user, Some(ON_PREM_RESUME.to_string()))
            .await
            .unwrap();
        let questions = interview_questions(
            &state,
            user,
            session.id,
            GapQuestionRequest {
                job_title: Some("Senior DBA".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(questions.mode, QuestionMode::General);
        assert!(questions.questions.len() >= 4);
    }

    #[tokio::test]
    async fn test_explicit_job_description_drives_gap_questions() {
        let oracle = ScriptedOracle::new(gap_answers(5));
        let state = test_state(oracle.clone());
        let user = Uuid::new_v4();
        let session = create_session(&state, user, Some(ON_PREM_RESUME.to_string()))
            .await
            .unwrap();
        let questions = interview_questions(
            &state,
            user,
            session.id,
            GapQuestionRequest {
                job_description: Some(cloud_job_description()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(questions.mode, QuestionMode::Gap);
        assert_eq!(questions.questions[0].topic, "Gap: Azure SQL Database");
        assert_eq!(oracle.call_count(), questions.questions.len());
    }
}
