//! Content Generator: tailors the résumé through the oracle under the truth ladder.
//!
//! Flow: truth ladder → deterministic OracleRequest → oracle → violation check
//!       (one bounded re-request) → micro edits → ATS score → coverage.
//!
//! Nothing here writes session state. The caller commits the returned
//! snapshot all-or-nothing.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::job::JobAnalysis;
use crate::analysis::role_classifier::{RoleArchetype, WeightingHints};
use crate::analysis::taxonomy::Taxonomy;
use crate::errors::AppError;
use crate::llm_client::prompts::TRUTHFULNESS_INSTRUCTION;
use crate::llm_client::{parse_response, ContentOracle, OraclePurpose, OracleRequest};
use crate::tailoring::ats_scorer::AtsScorer;
use crate::tailoring::coverage::report_coverage;
use crate::tailoring::micro_edits::apply_micro_edits;
use crate::tailoring::models::{ResumeBody, TailoredContent, TailoringRun};
use crate::tailoring::prompts::{TAILOR_PROMPT_TEMPLATE, TAILOR_SYSTEM, VIOLATION_RETRY_TEMPLATE};
use crate::tailoring::truthfulness::{
    assign_truth_levels, banned_terms, find_violations, keywords_at, BannedTerm, TruthAssignment,
    TruthLevel,
};

/// Re-requests allowed after the oracle uses an omitted keyword.
const MAX_VIOLATION_REREQUESTS: u32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Oracle context
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TailoringContext<'a> {
    job: JobContext<'a>,
    weighting_hints: &'a WeightingHints,
    requirements: &'a [String],
    keywords: KeywordLevels,
    banned_terms: Vec<String>,
    resume_text: &'a str,
}

#[derive(Debug, Serialize)]
struct JobContext<'a> {
    title: &'a str,
    company: Option<&'a str>,
    archetype: RoleArchetype,
}

#[derive(Debug, Serialize)]
struct KeywordLevels {
    hands_on: Vec<String>,
    familiar: Vec<String>,
}

/// Builds the oracle request. Same inputs, same request.
///
/// `offending` is non-empty only on the re-request after a violation.
pub fn build_tailoring_request(
    resume_text: &str,
    analysis: &JobAnalysis,
    assignments: &[TruthAssignment],
    banned: &[BannedTerm],
    offending: &[String],
) -> Result<OracleRequest, AppError> {
    let context = TailoringContext {
        job: JobContext {
            title: &analysis.title,
            company: analysis.company.as_deref(),
            archetype: analysis.archetype,
        },
        weighting_hints: &analysis.weighting_hints,
        requirements: &analysis.requirements,
        keywords: KeywordLevels {
            hands_on: keywords_at(assignments, TruthLevel::HandsOn),
            familiar: keywords_at(assignments, TruthLevel::Familiar),
        },
        banned_terms: banned.iter().flat_map(|b| b.forms.iter().cloned()).collect(),
        resume_text,
    };

    let mut instructions = TAILOR_PROMPT_TEMPLATE
        .replace("{truthfulness_instruction}", TRUTHFULNESS_INSTRUCTION)
        .replace("{role_label}", analysis.archetype.label())
        .replace("{job_title}", &analysis.title);
    if !offending.is_empty() {
        instructions.push_str(
            &VIOLATION_RETRY_TEMPLATE.replace("{offending_terms}", &offending.join(", ")),
        );
    }

    Ok(OracleRequest::new(
        OraclePurpose::TailorResume,
        TAILOR_SYSTEM,
        instructions,
        &context,
    )?)
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs ContentGenerator → ATSScorer → CoverageReporter for one résumé and job.
pub async fn generate_tailored_content(
    oracle: &dyn ContentOracle,
    taxonomy: &Taxonomy,
    scorer: &AtsScorer,
    resume_text: &str,
    analysis: &JobAnalysis,
) -> Result<TailoringRun, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::NoResumeContent);
    }

    let assignments = assign_truth_levels(resume_text, &analysis.keywords, taxonomy);
    let banned = banned_terms(&assignments, taxonomy);
    info!(
        "Truth ladder for '{}': {} hands-on, {} familiar, {} omitted",
        analysis.title,
        keywords_at(&assignments, TruthLevel::HandsOn).len(),
        keywords_at(&assignments, TruthLevel::Familiar).len(),
        banned.len()
    );

    let body = call_oracle_with_rerequest(oracle, resume_text, analysis, &assignments, &banned).await?;

    let edited = apply_micro_edits(body, &assignments, &banned, taxonomy);
    let violations = find_violations(&edited.body, &banned);
    if !violations.is_empty() {
        return Err(AppError::TruthfulnessViolation {
            keywords: violations,
        });
    }

    let score = scorer.score(&edited.body, &analysis.keywords, taxonomy)?;
    let coverage = report_coverage(&edited.body.full_text(), &analysis.keywords, taxonomy);
    info!(
        "Tailored '{}': ATS {}/100, coverage {}%, {} formatting issues",
        analysis.title,
        score.overall,
        coverage.percent(),
        score.formatting_issues.len()
    );

    Ok(TailoringRun {
        content: TailoredContent {
            body: edited.body,
            applied_micro_edits: edited.applied,
            suggested_micro_edits: edited.suggested,
            score,
            coverage,
            generated_at: Utc::now(),
        },
        truth_assignments: assignments,
    })
}

/// Calls the oracle and rejects output that uses an omitted keyword. One
/// re-request names the offending terms; a second violation fails the run.
async fn call_oracle_with_rerequest(
    oracle: &dyn ContentOracle,
    resume_text: &str,
    analysis: &JobAnalysis,
    assignments: &[TruthAssignment],
    banned: &[BannedTerm],
) -> Result<ResumeBody, AppError> {
    let mut offending: Vec<String> = Vec::new();

    for attempt in 0..=MAX_VIOLATION_REREQUESTS {
        let request = build_tailoring_request(resume_text, analysis, assignments, banned, &offending)?;
        let response = oracle.generate(&request).await?;
        let body: ResumeBody = parse_response(response)?;

        if body.is_blank() {
            return Err(AppError::MalformedContent(
                "The content generator returned an empty résumé.".to_string(),
            ));
        }

        let violations = find_violations(&body, banned);
        if violations.is_empty() {
            return Ok(body);
        }

        warn!(
            "Tailoring attempt {}/{}: output used omitted keywords {:?}",
            attempt + 1,
            MAX_VIOLATION_REREQUESTS + 1,
            violations
        );
        offending = violations;
    }

    Err(AppError::TruthfulnessViolation {
        keywords: offending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::job::{analyze_job, JobMetadata, JobPosting};
    use crate::analysis::quality_gate::QualityThresholds;
    use crate::test_support::{
        dba_job_description, resume_body, taxonomy, ScriptedOracle, ON_PREM_RESUME,
    };
    use serde_json::json;

    fn analysis() -> JobAnalysis {
        let posting = JobPosting::ingest(dba_job_description(), None);
        analyze_job(
            &posting,
            &JobMetadata::default(),
            &taxonomy(),
            &QualityThresholds::default(),
        )
    }

    fn ladder(analysis: &JobAnalysis) -> (Vec<TruthAssignment>, Vec<BannedTerm>) {
        let t = taxonomy();
        let assignments = assign_truth_levels(ON_PREM_RESUME, &analysis.keywords, &t);
        let banned = banned_terms(&assignments, &t);
        (assignments, banned)
    }

    #[test]
    fn test_request_is_deterministic_and_structured() {
        let analysis = analysis();
        let (assignments, banned) = ladder(&analysis);
        let first = build_tailoring_request(ON_PREM_RESUME, &analysis, &assignments, &banned, &[]).unwrap();
        let second = build_tailoring_request(ON_PREM_RESUME, &analysis, &assignments, &banned, &[]).unwrap();
        assert_eq!(first, second);

        assert!(first.context.is_object());
        assert_eq!(first.context["resume_text"], ON_PREM_RESUME);
        assert_eq!(first.context["job"]["archetype"], "specialist_dba");
        assert!(first.context["keywords"]["hands_on"].is_array());
        assert!(!first.instructions.contains("REJECTED"));
    }

    #[test]
    fn test_rerequest_names_offending_terms() {
        let analysis = analysis();
        let (assignments, banned) = ladder(&analysis);
        let request = build_tailoring_request(
            ON_PREM_RESUME,
            &analysis,
            &assignments,
            &banned,
            &["Snowflake".to_string()],
        )
        .unwrap();
        assert!(request.instructions.contains("REJECTED"));
        assert!(request.instructions.contains("Snowflake"));
    }

    #[tokio::test]
    async fn test_blank_resume_is_rejected_before_oracle_call() {
        let oracle = ScriptedOracle::new(vec![]);
        let result = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            "   \n ",
            &analysis(),
        )
        .await;
        assert!(matches!(result, Err(AppError::NoResumeContent)));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_clean_output_is_scored_and_covered() {
        let oracle = ScriptedOracle::new(vec![Ok(resume_body())]);
        let tailored = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            ON_PREM_RESUME,
            &analysis(),
        )
        .await
        .unwrap()
        .content;

        assert_eq!(oracle.call_count(), 1);
        assert!(tailored.score.overall > 0);
        assert!(tailored.coverage.matched_keywords.contains("SQL Server"));
        assert!(tailored
            .coverage
            .matched_keywords
            .is_disjoint(&tailored.coverage.missing_keywords));
    }

    #[tokio::test]
    async fn test_truth_ladder_travels_beside_the_content() {
        let oracle = ScriptedOracle::new(vec![Ok(resume_body())]);
        let run = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            ON_PREM_RESUME,
            &analysis(),
        )
        .await
        .unwrap();

        let omitted = keywords_at(&run.truth_assignments, TruthLevel::Omitted);
        assert!(omitted.contains(&"HIPAA".to_string()));

        let value = serde_json::to_value(&run.content).unwrap();
        assert!(value.get("truth_assignments").is_none());
        let text = run.content.body.full_text().to_lowercase();
        for keyword in &omitted {
            assert!(!text.contains(&keyword.to_lowercase()), "{keyword} leaked into text");
        }
    }

    #[tokio::test]
    async fn test_violation_triggers_one_rerequest() {
        let mut tainted = resume_body();
        tainted["skills"] = json!(["SQL Server", "HIPAA"]);
        let oracle = ScriptedOracle::new(vec![Ok(tainted), Ok(resume_body())]);

        let tailored = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            ON_PREM_RESUME,
            &analysis(),
        )
        .await
        .unwrap()
        .content;

        assert_eq!(oracle.call_count(), 2);
        let second = &oracle.requests()[1];
        assert!(second.instructions.contains("HIPAA"));
        assert!(!tailored.body.skills.iter().any(|s| s == "HIPAA"));
    }

    #[tokio::test]
    async fn test_repeated_violation_fails_the_run() {
        let mut tainted = resume_body();
        tainted["summary"] = json!("HIPAA-compliant DBA.");
        let oracle = ScriptedOracle::new(vec![Ok(tainted.clone()), Ok(tainted)]);

        let result = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            ON_PREM_RESUME,
            &analysis(),
        )
        .await;

        match result {
            Err(AppError::TruthfulnessViolation { keywords }) => {
                assert_eq!(keywords, vec!["HIPAA".to_string()])
            }
            other => panic!("expected violation, got {other:?}"),
        }
        assert_eq!(oracle.call_count(), 2);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_unavailable() {
        let oracle = ScriptedOracle::failing();
        let result = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            ON_PREM_RESUME,
            &analysis(),
        )
        .await;
        assert!(matches!(result, Err(AppError::OracleUnavailable(_))));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_malformed() {
        let oracle = ScriptedOracle::new(vec![Ok(json!({"summary": 42}))]);
        let result = generate_tailored_content(
            &oracle,
            &taxonomy(),
            &AtsScorer::default(),
            ON_PREM_RESUME,
            &analysis(),
        )
        .await;
        assert!(matches!(result, Err(AppError::MalformedContent(_))));
    }
}
