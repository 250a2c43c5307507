//! Session persistence behind a narrow trait.
//!
//! Writers follow one protocol: `issue_token` before reading, then
//! `replace_if_current` with that token. A commit whose token is no longer the
//! latest is refused with `StaleResult`, so a slow request can never overwrite
//! the work of a newer one.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::SessionRow;
use crate::session::{RequestToken, Session};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), AppError>;

    /// Sessions are scoped to their owner; another user's id is `NotFound`.
    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Session, AppError>;

    /// Bumps and returns the session's latest token.
    async fn issue_token(&self, user_id: Uuid, id: Uuid) -> Result<RequestToken, AppError>;

    /// Writes `session` in full if `token` is still the latest. All or nothing.
    async fn replace_if_current(&self, session: &Session, token: RequestToken)
        -> Result<(), AppError>;
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(AppError::Conflict(format!("Session {} already exists", session.id)));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Session, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|s| s.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn issue_token(&self, user_id: Uuid, id: Uuid) -> Result<RequestToken, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| not_found(id))?;
        session.latest_token = RequestToken(session.latest_token.0 + 1);
        debug!("Issued token {} for session {id}", session.latest_token.0);
        Ok(session.latest_token)
    }

    async fn replace_if_current(
        &self,
        session: &Session,
        token: RequestToken,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&session.id)
            .filter(|s| s.user_id == session.user_id)
            .ok_or_else(|| not_found(session.id))?;
        if stored.latest_token != token {
            warn!(
                "Discarding stale write to session {} (token {} < {})",
                session.id, token.0, stored.latest_token.0
            );
            return Err(AppError::StaleResult);
        }
        *stored = Session {
            latest_token: token,
            ..session.clone()
        };
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

/// Stores job, analysis and tailored content as JSONB on one row per session.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &Session) -> Result<(), AppError> {
        let row = SessionRow::try_from(session)?;
        sqlx::query(
            r#"
            INSERT INTO tailoring_sessions
                (id, user_id, status, resume_text, job, analysis, tailored,
                 truth_assignments, latest_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.id)
        .bind(row.user_id)
        .bind(&row.status)
        .bind(&row.resume_text)
        .bind(&row.job)
        .bind(&row.analysis)
        .bind(&row.tailored)
        .bind(&row.truth_assignments)
        .bind(row.latest_token)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Session, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM tailoring_sessions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))?;
        Session::try_from(row)
    }

    async fn issue_token(&self, user_id: Uuid, id: Uuid) -> Result<RequestToken, AppError> {
        let token: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE tailoring_sessions
            SET latest_token = latest_token + 1
            WHERE id = $1 AND user_id = $2
            RETURNING latest_token
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        token.map(RequestToken).ok_or_else(|| not_found(id))
    }

    async fn replace_if_current(
        &self,
        session: &Session,
        token: RequestToken,
    ) -> Result<(), AppError> {
        let row = SessionRow::try_from(session)?;
        // Single conditional UPDATE; the token check and the write are one statement.
        let result = sqlx::query(
            r#"
            UPDATE tailoring_sessions
            SET status = $1, resume_text = $2, job = $3, analysis = $4,
                tailored = $5, truth_assignments = $6, updated_at = $7
            WHERE id = $8 AND user_id = $9 AND latest_token = $10
            "#,
        )
        .bind(&row.status)
        .bind(&row.resume_text)
        .bind(&row.job)
        .bind(&row.analysis)
        .bind(&row.tailored)
        .bind(&row.truth_assignments)
        .bind(row.updated_at)
        .bind(row.id)
        .bind(row.user_id)
        .bind(token.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing session from a stale token.
            self.get(session.user_id, session.id).await?;
            warn!("Discarding stale write to session {} (token {})", session.id, token.0);
            return Err(AppError::StaleResult);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_is_scoped_to_owner() {
        let store = InMemorySessionStore::new();
        let session = Session::new(Uuid::new_v4(), None);
        store.insert(&session).await.unwrap();

        assert_eq!(store.get(session.user_id, session.id).await.unwrap().id, session.id);
        assert!(matches!(
            store.get(Uuid::new_v4(), session.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tokens_increase_monotonically() {
        let store = InMemorySessionStore::new();
        let session = Session::new(Uuid::new_v4(), None);
        store.insert(&session).await.unwrap();

        let first = store.issue_token(session.user_id, session.id).await.unwrap();
        let second = store.issue_token(session.user_id, session.id).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_stale_token_cannot_overwrite_newer_write() {
        let store = InMemorySessionStore::new();
        let session = Session::new(Uuid::new_v4(), Some("old".to_string()));
        store.insert(&session).await.unwrap();

        let slow = store.issue_token(session.user_id, session.id).await.unwrap();
        let fast = store.issue_token(session.user_id, session.id).await.unwrap();

        let mut newer = store.get(session.user_id, session.id).await.unwrap();
        newer.resume_text = Some("newer".to_string());
        store.replace_if_current(&newer, fast).await.unwrap();

        let mut older = session.clone();
        older.resume_text = Some("older".to_string());
        assert!(matches!(
            store.replace_if_current(&older, slow).await,
            Err(AppError::StaleResult)
        ));

        let stored = store.get(session.user_id, session.id).await.unwrap();
        assert_eq!(stored.resume_text.as_deref(), Some("newer"));
        assert_eq!(stored.latest_token, fast);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemorySessionStore::new();
        let session = Session::new(Uuid::new_v4(), None);
        store.insert(&session).await.unwrap();
        assert!(matches!(store.insert(&session).await, Err(AppError::Conflict(_))));
    }
}
