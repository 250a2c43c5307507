//! Shared fixtures for unit tests: postings, a résumé, and a scripted oracle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::analysis::job::{analyze_job, JobAnalysis, JobMetadata, JobPosting};
use crate::analysis::quality_gate::QualityThresholds;
use crate::analysis::taxonomy::Taxonomy;
use crate::config::TailoringConfig;
use crate::llm_client::{ContentOracle, OracleError, OracleRequest};
use crate::session::store::InMemorySessionStore;
use crate::state::AppState;
use crate::tailoring::ats_scorer::AtsScorer;
use crate::tailoring::coverage::report_coverage;
use crate::tailoring::models::{ResumeBody, TailoredContent, TailoringRun};
use crate::tailoring::truthfulness::assign_truth_levels;

/// On-prem SQL Server DBA résumé. Mentions no cloud or pipeline tooling.
pub const ON_PREM_RESUME: &str = include_str!("../fixtures/on_prem_resume.txt");

pub fn taxonomy() -> Taxonomy {
    Taxonomy::builtin().expect("builtin taxonomy builds")
}

/// A full (>3,000 char) senior SQL Server DBA posting.
pub fn dba_job_description() -> String {
    include_str!("../fixtures/dba_job_description.txt").to_string()
}

/// A ~4,200 char Azure data platform posting centred on Azure SQL Database,
/// dbt and Airflow. Never mentions SQL Server.
pub fn cloud_job_description() -> String {
    include_str!("../fixtures/cloud_job_description.txt").to_string()
}

/// A truthful oracle answer for [`ON_PREM_RESUME`].
pub fn resume_body() -> Value {
    json!({
        "summary": "Database administrator with nine years running SQL Server estates, \
                    focused on disaster recovery planning, performance tuning and automation.",
        "experience": [
            {
                "title": "Lead DBA",
                "company": "Contoso Retail",
                "duration": "2019 - 2024",
                "achievements": [
                    "Ran 80 SQL Server instances across two data centers",
                    "Led disaster recovery planning and quarterly failover tests for Always On Availability Groups",
                    "Cut average query time by 45% through performance tuning and index maintenance",
                    "Automated nightly maintenance jobs with PowerShell"
                ]
            },
            {
                "title": "Database Administrator",
                "company": "Fabrikam Clinics",
                "duration": "2015 - 2019",
                "achievements": [
                    "Wrote T-SQL stored procedures for the billing platform",
                    "Managed backup and recovery for 30 databases",
                    "Built monitoring dashboards for blocking and deadlocks"
                ]
            }
        ],
        "skills": [
            "SQL Server",
            "T-SQL",
            "PowerShell",
            "Always On Availability Groups",
            "Performance Tuning",
            "Backup and Recovery"
        ]
    })
}

/// `n` well-formed gap question answers.
pub fn gap_answers(n: usize) -> Vec<Result<Value, OracleError>> {
    (0..n)
        .map(|i| {
            Ok(json!({
                "question": format!("How would you close gap number {}?", i + 1),
                "rationale": "The posting lists it as a core requirement."
            }))
        })
        .collect()
}

/// The DBA posting, ingested and analyzed with default thresholds.
pub fn sample_analysis() -> (JobPosting, JobAnalysis) {
    let posting = JobPosting::ingest(dba_job_description(), None);
    let analysis = analyze_job(
        &posting,
        &JobMetadata::default(),
        &taxonomy(),
        &QualityThresholds::default(),
    );
    (posting, analysis)
}

/// A tailoring run built without an oracle, from [`resume_body`].
pub fn sample_tailored() -> TailoringRun {
    let t = taxonomy();
    let (_, analysis) = sample_analysis();
    let body: ResumeBody = serde_json::from_value(resume_body()).expect("fixture body parses");
    let score = AtsScorer::default()
        .score(&body, &analysis.keywords, &t)
        .expect("fixture body scores");
    TailoringRun {
        truth_assignments: assign_truth_levels(ON_PREM_RESUME, &analysis.keywords, &t),
        content: TailoredContent {
            applied_micro_edits: Vec::new(),
            suggested_micro_edits: Vec::new(),
            coverage: report_coverage(&body.full_text(), &analysis.keywords, &t),
            score,
            body,
            generated_at: chrono::Utc::now(),
        },
    }
}

/// App state over an in-memory store and the given oracle.
pub fn test_state(oracle: impl ContentOracle + 'static) -> AppState {
    test_state_with(oracle, TailoringConfig::default())
}

pub fn test_state_with(oracle: impl ContentOracle + 'static, tailoring: TailoringConfig) -> AppState {
    AppState::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(oracle),
        Arc::new(taxonomy()),
        tailoring,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted oracle
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<Value, OracleError>>,
    requests: Vec<OracleRequest>,
    always_fail: bool,
}

/// Deterministic oracle: replays queued responses in order and records every
/// request. Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    script: Arc<Mutex<Script>>,
}

impl ScriptedOracle {
    pub fn new(responses: Vec<Result<Value, OracleError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                responses: responses.into(),
                ..Default::default()
            })),
        }
    }

    /// Every call fails as if the API were down.
    pub fn failing() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                always_fail: true,
                ..Default::default()
            })),
        }
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl ContentOracle for ScriptedOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        if script.always_fail {
            return Err(OracleError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        script
            .responses
            .pop_front()
            .unwrap_or(Err(OracleError::EmptyContent))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gated oracle
// ────────────────────────────────────────────────────────────────────────────

/// Wraps a [`ScriptedOracle`] and holds every call until [`GatedOracle::release`],
/// so a test can act while a tailoring run is mid-flight.
#[derive(Clone, Default)]
pub struct GatedOracle {
    inner: ScriptedOracle,
    entered: Arc<Notify>,
    gate: Arc<Notify>,
}

impl GatedOracle {
    pub fn new(inner: ScriptedOracle) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// Resolves once a call is waiting at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ContentOracle for GatedOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<Value, OracleError> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.inner.generate(request).await
    }
}
