//! Tailoring sessions: one résumé, one job at a time, moving through
//! `draft → analyzing → tailored → completed`.
//!
//! Transitions are plain methods on [`Session`]. They mutate an owned copy;
//! nothing is persisted until the pipeline commits through the store.

pub mod handlers;
pub mod in_flight;
pub mod pipeline;
pub mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::job::{JobAnalysis, JobPosting};
use crate::errors::AppError;
use crate::tailoring::models::{TailoredContent, TailoringRun};
use crate::tailoring::truthfulness::TruthAssignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Draft,
    Analyzing,
    Tailored,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Draft => "draft",
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Tailored => "tailored",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(SessionStatus::Draft),
            "analyzing" => Some(SessionStatus::Analyzing),
            "tailored" => Some(SessionStatus::Tailored),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonically increasing per-session write token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: SessionStatus,
    pub resume_text: Option<String>,
    pub job: Option<JobPosting>,
    pub analysis: Option<JobAnalysis>,
    pub tailored: Option<TailoredContent>,
    /// Truth ladder the current tailored content was generated under.
    #[serde(default)]
    pub truth_assignments: Vec<TruthAssignment>,
    pub latest_token: RequestToken,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid, resume_text: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: SessionStatus::Draft,
            resume_text: resume_text.filter(|t| !t.trim().is_empty()),
            job: None,
            analysis: None,
            tailored: None,
            truth_assignments: Vec::new(),
            latest_token: RequestToken(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Résumé text, or `None` when missing or blank.
    pub fn resume(&self) -> Option<&str> {
        self.resume_text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Replacing the résumé is only allowed before tailoring has produced content.
    pub fn ensure_can_replace_resume(&self) -> Result<(), AppError> {
        self.require(&[SessionStatus::Draft, SessionStatus::Analyzing], "replace the résumé of")
    }

    pub fn replace_resume(&mut self, text: String) -> Result<(), AppError> {
        self.ensure_can_replace_resume()?;
        self.resume_text = Some(text);
        self.touch();
        Ok(())
    }

    /// Valid from every state. Any previous tailored content is dropped, not merged.
    pub fn submit_job(&mut self, posting: JobPosting, analysis: JobAnalysis) {
        self.job = Some(posting);
        self.analysis = Some(analysis);
        self.tailored = None;
        self.truth_assignments.clear();
        self.status = SessionStatus::Analyzing;
        self.touch();
    }

    /// Checks that tailoring may start. Returns the analysis to tailor against.
    pub fn ensure_can_tailor(&self) -> Result<&JobAnalysis, AppError> {
        self.require(&[SessionStatus::Analyzing], "tailor")?;
        self.analysis.as_ref().ok_or_else(|| {
            AppError::Conflict("Submit a job description before tailoring.".to_string())
        })
    }

    pub fn record_tailored(&mut self, run: TailoringRun) -> Result<(), AppError> {
        self.ensure_can_tailor()?;
        self.tailored = Some(run.content);
        self.truth_assignments = run.truth_assignments;
        self.status = SessionStatus::Tailored;
        self.touch();
        Ok(())
    }

    pub fn ensure_can_complete(&self) -> Result<(), AppError> {
        self.require(&[SessionStatus::Tailored], "complete")
    }

    pub fn complete(&mut self) -> Result<(), AppError> {
        self.ensure_can_complete()?;
        self.status = SessionStatus::Completed;
        self.touch();
        Ok(())
    }

    /// Tailored content, or a conflict explaining how to get some.
    pub fn tailored_content(&self) -> Result<&TailoredContent, AppError> {
        self.tailored.as_ref().ok_or_else(|| {
            AppError::Conflict(format!(
                "Session {} has no tailored content yet. Run tailoring first.",
                self.id
            ))
        })
    }

    fn require(&self, allowed: &[SessionStatus], action: &'static str) -> Result<(), AppError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
