//! Gap Analyzer: interview questions targeting the job's uncovered keywords.
//!
//! Gaps are missing `coreTech` keywords (bucket order) followed by missing
//! `tools` keywords, capped. Each gap costs one oracle call. With no job to
//! compare against, or nothing missing, a built-in question set for the role
//! archetype is returned instead.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::job::JobAnalysis;
use crate::analysis::role_classifier::RoleArchetype;
use crate::analysis::taxonomy::{Category, Taxonomy};
use crate::errors::AppError;
use crate::llm_client::{parse_response, ContentOracle, OraclePurpose, OracleRequest};
use crate::tailoring::coverage::{report_coverage, CoverageReport};
use crate::tailoring::models::TailoredContent;
use crate::tailoring::prompts::{GAP_QUESTION_PROMPT_TEMPLATE, GAP_QUESTION_SYSTEM};

pub const MIN_GAP_QUESTIONS: usize = 4;
pub const MAX_GAP_QUESTIONS: usize = 5;

const GAP_CATEGORIES: [Category; 2] = [Category::CoreTech, Category::Tools];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapQuestion {
    pub topic: String,
    pub question: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionMode {
    /// One question per uncovered keyword.
    Gap,
    /// Built-in archetype questions; no job or no gaps.
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewQuestions {
    pub mode: QuestionMode,
    pub questions: Vec<GapQuestion>,
    pub gaps: Vec<String>,
}

/// What the analyzer compares. `tailored` wins over `resume_text` for
/// coverage when both are present.
#[derive(Debug, Clone, Copy)]
pub struct GapInput<'a> {
    pub resume_text: &'a str,
    pub tailored: Option<&'a TailoredContent>,
    pub analysis: Option<&'a JobAnalysis>,
    /// Used for the general question set when there is no analysis.
    pub archetype: RoleArchetype,
}

/// Oracle response shape for one gap question.
#[derive(Debug, Deserialize)]
struct GapQuestionDraft {
    question: String,
    #[serde(default)]
    rationale: String,
}

#[derive(Debug, Serialize)]
struct GapContext<'a> {
    keyword: &'a str,
    category: Category,
    job_title: &'a str,
    company: Option<&'a str>,
    archetype: RoleArchetype,
    related_requirements: Vec<&'a str>,
    resume_text: &'a str,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct GapAnalyzer {
    cap: usize,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self {
            cap: MAX_GAP_QUESTIONS,
        }
    }
}

impl GapAnalyzer {
    /// `cap` is clamped to 4..=5.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.clamp(MIN_GAP_QUESTIONS, MAX_GAP_QUESTIONS),
        }
    }

    #[cfg(test)]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Missing core-tech keywords first, then missing tools, in bucket order.
    pub fn select_gaps(&self, analysis: &JobAnalysis, coverage: &CoverageReport) -> Vec<String> {
        GAP_CATEGORIES
            .iter()
            .flat_map(|c| analysis.keywords.get(*c))
            .filter(|k| coverage.missing_keywords.contains(k.as_str()))
            .take(self.cap)
            .cloned()
            .collect()
    }

    pub async fn analyze(
        &self,
        oracle: &dyn ContentOracle,
        taxonomy: &Taxonomy,
        input: GapInput<'_>,
    ) -> Result<InterviewQuestions, AppError> {
        if input.resume_text.trim().is_empty() && input.tailored.is_none() {
            return Err(AppError::NoResumeContent);
        }

        let Some(analysis) = input.analysis else {
            info!("No job description; returning general questions");
            return Ok(general_questions(input.archetype));
        };

        let coverage = match input.tailored {
            Some(tailored) => tailored.coverage.clone(),
            None => report_coverage(input.resume_text, &analysis.keywords, taxonomy),
        };
        let gaps = self.select_gaps(analysis, &coverage);
        if gaps.is_empty() {
            info!("No core or tool gaps for '{}'; returning general questions", analysis.title);
            return Ok(general_questions(analysis.archetype));
        }

        let resume_text = match input.tailored {
            Some(tailored) if input.resume_text.trim().is_empty() => tailored.body.full_text(),
            _ => input.resume_text.to_string(),
        };

        let mut questions = Vec::with_capacity(gaps.len());
        for keyword in &gaps {
            let request = build_gap_request(keyword, analysis, &resume_text, taxonomy)?;
            let response = oracle.generate(&request).await?;
            let draft: GapQuestionDraft = parse_response(response)?;
            if draft.question.trim().is_empty() {
                warn!("Gap question for '{keyword}' came back empty");
                return Err(AppError::MalformedContent(format!(
                    "The content generator returned an empty question for '{keyword}'."
                )));
            }
            questions.push(GapQuestion {
                topic: format!("Gap: {keyword}"),
                question: draft.question.trim().to_string(),
                rationale: draft.rationale.trim().to_string(),
            });
        }

        info!("Generated {} gap questions for '{}'", questions.len(), analysis.title);
        Ok(InterviewQuestions {
            mode: QuestionMode::Gap,
            questions,
            gaps,
        })
    }
}

fn build_gap_request(
    keyword: &str,
    analysis: &JobAnalysis,
    resume_text: &str,
    taxonomy: &Taxonomy,
) -> Result<OracleRequest, AppError> {
    let context = GapContext {
        keyword,
        category: analysis.keywords.category_of(keyword).unwrap_or(Category::CoreTech),
        job_title: &analysis.title,
        company: analysis.company.as_deref(),
        archetype: analysis.archetype,
        related_requirements: analysis
            .requirements
            .iter()
            .filter(|r| taxonomy.mentions(r, keyword))
            .map(String::as_str)
            .collect(),
        resume_text,
    };
    let instructions = GAP_QUESTION_PROMPT_TEMPLATE.replace("{keyword}", keyword);
    Ok(OracleRequest::new(
        OraclePurpose::GapQuestion,
        GAP_QUESTION_SYSTEM,
        instructions,
        &context,
    )?)
}

// ────────────────────────────────────────────────────────────────────────────
// General question bank
// ────────────────────────────────────────────────────────────────────────────

type BankEntry = (&'static str, &'static str, &'static str);

const DBA_BANK: [BankEntry; 5] = [
    (
        "Availability",
        "Walk me through the last time a production database went down. How did you find out, and what did you change afterwards?",
        "Outage handling shows how a DBA works under pressure and whether lessons turn into changes.",
    ),
    (
        "Performance",
        "A critical query has doubled in runtime since last week. How do you investigate it?",
        "Tests a structured tuning approach rather than guesswork.",
    ),
    (
        "Backups",
        "How do you prove your backups can actually be restored?",
        "Untested backups are a common and expensive blind spot.",
    ),
    (
        "Security",
        "How do you decide who gets access to a production database, and how do you review it?",
        "Least-privilege access is a core DBA responsibility.",
    ),
    (
        "Change management",
        "How do you roll out a schema change to a busy database without downtime?",
        "Shows planning and risk control for routine but dangerous work.",
    ),
];

const CLOUD_BANK: [BankEntry; 5] = [
    (
        "Migration",
        "Describe a workload you moved to a managed cloud database. What surprised you?",
        "Cloud platform roles centre on migrations and their trade-offs.",
    ),
    (
        "Cost",
        "How do you keep the cost of a cloud data platform under control as usage grows?",
        "Spend is a first-class operating concern on managed platforms.",
    ),
    (
        "Infrastructure as code",
        "How do you manage database and network resources so environments stay consistent?",
        "Repeatable provisioning separates platform engineering from manual administration.",
    ),
    (
        "Resilience",
        "What does your recovery plan look like for a regional cloud outage?",
        "Probes understanding of managed-service failure modes.",
    ),
    (
        "Security",
        "How do you handle secrets and identities for services that reach the database?",
        "Credential handling is a frequent weak point in cloud deployments.",
    ),
];

const DATA_ENGINEER_BANK: [BankEntry; 5] = [
    (
        "Pipelines",
        "Tell me about a pipeline you built end to end. How did you make it reliable?",
        "Shows ownership from ingestion to consumption.",
    ),
    (
        "Data quality",
        "How do you detect bad data before it reaches a dashboard?",
        "Quality checks are what keep downstream users trusting the data.",
    ),
    (
        "Modelling",
        "How do you decide how to model a new source for analytics?",
        "Tests judgement about grain, history and consumers.",
    ),
    (
        "Backfills",
        "A transformation had a bug for a month. How do you repair the history?",
        "Backfills reveal whether pipelines were built to be rerun safely.",
    ),
    (
        "Orchestration",
        "How do you handle dependencies and retries between scheduled jobs?",
        "Orchestration failures are the most common source of late data.",
    ),
];

const GENERIC_BANK: [BankEntry; 4] = [
    (
        "Experience",
        "Which project on your résumé are you most proud of, and what was your part in it?",
        "Lets the candidate anchor the conversation in concrete work.",
    ),
    (
        "Problem solving",
        "Describe a hard data problem you solved recently. How did you approach it?",
        "Shows reasoning, not just tool familiarity.",
    ),
    (
        "Collaboration",
        "How do you work with people who depend on your data but do not write SQL?",
        "Data roles succeed or fail on communication with their consumers.",
    ),
    (
        "Learning",
        "What is something you learned in the last year that changed how you work?",
        "Signals growth and adaptability.",
    ),
];

/// Built-in question set for an archetype.
pub fn general_questions(archetype: RoleArchetype) -> InterviewQuestions {
    let bank: &[BankEntry] = match archetype {
        RoleArchetype::SpecialistDba => &DBA_BANK,
        RoleArchetype::CloudDataPlatformEngineer => &CLOUD_BANK,
        RoleArchetype::DataEngineer => &DATA_ENGINEER_BANK,
        RoleArchetype::GenericDataRole => &GENERIC_BANK,
    };
    InterviewQuestions {
        mode: QuestionMode::General,
        questions: bank
            .iter()
            .map(|(topic, question, rationale)| GapQuestion {
                topic: topic.to_string(),
                question: question.to_string(),
                rationale: rationale.to_string(),
            })
            .collect(),
        gaps: Vec::new(),
    }
}
