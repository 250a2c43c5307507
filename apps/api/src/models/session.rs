use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::{RequestToken, Session, SessionStatus};

/// One row of `tailoring_sessions`. Nested documents travel as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub resume_text: Option<String>,
    pub job: Option<Value>,
    pub analysis: Option<Value>,
    pub tailored: Option<Value>,
    pub truth_assignments: Value,
    pub latest_token: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Session> for SessionRow {
    type Error = AppError;

    fn try_from(session: &Session) -> Result<Self, Self::Error> {
        Ok(Self {
            id: session.id,
            user_id: session.user_id,
            status: session.status.as_str().to_string(),
            resume_text: session.resume_text.clone(),
            job: to_json(&session.job, "job")?,
            analysis: to_json(&session.analysis, "analysis")?,
            tailored: to_json(&session.tailored, "tailored")?,
            truth_assignments: serde_json::to_value(&session.truth_assignments)
                .context("serializing session truth_assignments")
                .map_err(AppError::Internal)?,
            latest_token: session.latest_token.0,
            created_at: session.created_at,
            updated_at: session.updated_at,
        })
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = SessionStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "session {} has unknown status '{}'",
                row.id,
                row.status
            ))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status,
            resume_text: row.resume_text,
            job: from_json(row.job, "job")?,
            analysis: from_json(row.analysis, "analysis")?,
            tailored: from_json(row.tailored, "tailored")?,
            truth_assignments: from_json(Some(row.truth_assignments), "truth_assignments")?
                .unwrap_or_default(),
            latest_token: RequestToken(row.latest_token),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_json<T: Serialize>(value: &Option<T>, column: &str) -> Result<Option<Value>, AppError> {
    value
        .as_ref()
        .map(|v| serde_json::to_value(v).with_context(|| format!("serializing session {column}")))
        .transpose()
        .map_err(AppError::Internal)
}

fn from_json<T: DeserializeOwned>(value: Option<Value>, column: &str) -> Result<Option<T>, AppError> {
    value
        .map(|v| serde_json::from_value(v).with_context(|| format!("decoding session {column}")))
        .transpose()
        .map_err(AppError::Internal)
}
