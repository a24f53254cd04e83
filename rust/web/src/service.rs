use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::store::{Store, StoreError};
use athena_model::{ModelError, Ruleset, RulesetDraft, Session, SessionStart, SessionUpdate};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use warp::http::StatusCode;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no such ruleset id")]
    RulesetNotFound(String),
    #[error("no such session id")]
    SessionNotFound(String),
    #[error("{0}")]
    Rejected(#[from] ModelError),
    #[error("{0}")]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(model) => ServiceError::Rejected(model),
            other => ServiceError::Storage(other),
        }
    }
}

impl IntoErrorResponse for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::RulesetNotFound(_)
            | ServiceError::SessionNotFound(_)
            | ServiceError::Rejected(_) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::RulesetNotFound(_) => "ruleset_not_found",
            ServiceError::SessionNotFound(_) => "session_not_found",
            ServiceError::Rejected(_) => "invalid_stats",
            ServiceError::Storage(_) => "storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::RulesetNotFound(id) => Some(serde_json::json!({ "ruleset_id": id })),
            ServiceError::SessionNotFound(id) => Some(serde_json::json!({ "session_id": id })),
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            ServiceError::Storage(StoreError::StoragePoisoned) => ErrorSeverity::Critical,
            ServiceError::Storage(_) => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}

/// Ruleset and session operations behind the HTTP handlers.
#[derive(Debug, Clone)]
pub struct GameService {
    store: Arc<dyn Store>,
}

impl GameService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    pub async fn list_rulesets(&self) -> Result<Vec<Ruleset>, ServiceError> {
        Ok(self.store.all_rulesets().await?)
    }

    pub async fn create_ruleset(
        &self,
        draft: RulesetDraft,
        now: DateTime<Utc>,
    ) -> Result<Ruleset, ServiceError> {
        let ruleset = Ruleset::from_draft(draft, now)?;
        self.store.insert_ruleset(&ruleset).await?;

        tracing::info!(
            ruleset_id = %ruleset.id,
            game = %ruleset.game,
            stats = ruleset.stats.len(),
            "ruleset created"
        );
        Ok(ruleset)
    }

    pub async fn ruleset(&self, id: &str) -> Result<Ruleset, ServiceError> {
        self.store
            .ruleset_by_id(id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => ServiceError::RulesetNotFound(id.to_string()),
                other => other.into(),
            })
    }

    /// All sessions with `is_active` recomputed for `now`. The recomputed
    /// flag is never written back.
    pub async fn list_sessions(&self, now: DateTime<Utc>) -> Result<Vec<Session>, ServiceError> {
        let mut sessions = self.store.all_sessions().await?;
        for session in &mut sessions {
            session.refresh_activity(now);
        }
        Ok(sessions)
    }

    /// Starts a session and counts it against its ruleset.
    ///
    /// The session insert and the usage increment are two separate writes.
    /// Between them the session exists while the counter still has its old
    /// value. If the increment fails the session is deleted again.
    pub async fn start_session(
        &self,
        start: SessionStart,
        now: DateTime<Utc>,
    ) -> Result<Session, ServiceError> {
        let ruleset = self.ruleset(&start.ruleset).await?;
        let session = Session::start(&ruleset, &start.players, now);

        self.store.insert_session(&session).await?;

        if let Err(err) = self.store.increment_ruleset_usage(ruleset.id).await {
            tracing::warn!(
                session_id = %session.id,
                ruleset_id = %ruleset.id,
                error = %err,
                "usage increment failed, removing started session"
            );
            if let Err(cleanup_err) = self.store.delete_session(session.id).await {
                tracing::error!(
                    session_id = %session.id,
                    ruleset_id = %ruleset.id,
                    error = %cleanup_err,
                    "failed to roll back session after usage increment failure"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            session_id = %session.id,
            ruleset_id = %ruleset.id,
            players = session.players.len(),
            "session started"
        );
        Ok(session)
    }

    pub async fn update_session(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<Session, ServiceError> {
        let session = self
            .store
            .update_session(id, update)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => ServiceError::SessionNotFound(id.to_string()),
                other => other.into(),
            })?;

        tracing::debug!(session_id = %session.id, "session stats updated");
        Ok(session)
    }
}
