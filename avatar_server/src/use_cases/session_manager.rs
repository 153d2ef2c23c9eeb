// Session lifecycle orchestration: create, message, close and age-based sweep.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::entities::{SessionRecord, TaskType};
use crate::domain::errors::SessionError;
use crate::domain::ports::{AvatarService, Clock, SessionStore};

/// Connection details handed back to the caller after a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub session_id: String,
    pub token: String,
    pub url: String,
    pub access_token: String,
}

/// Input for delivering a text prompt to an active session.
#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub token: Option<String>,
    pub text: String,
    pub task_type: TaskType,
}

/// Input for closing a session. Every field is optional; close never fails.
#[derive(Debug, Clone, Default)]
pub struct CloseSession {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub token: Option<String>,
}

/// Result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    /// True when a registry record was removed.
    pub removed: bool,
}

/// Owns the registry and drives upstream calls for each user's session.
pub struct SessionManager {
    avatar: Arc<dyn AvatarService>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl SessionManager {
    pub fn new(
        avatar: Arc<dyn AvatarService>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        retention: Duration,
    ) -> Self {
        Self {
            avatar,
            store,
            clock,
            retention,
        }
    }

    /// Acquires a token, creates and starts an upstream session, then registers it.
    pub async fn create_session(&self, user_id: &str) -> Result<CreatedSession, SessionError> {
        let Some(user_id) = non_blank(Some(user_id)) else {
            return Err(SessionError::Validation("User ID is required"));
        };

        // Nothing is registered until all three calls succeed.
        let token = self
            .avatar
            .acquire_token()
            .await
            .map_err(SessionError::UpstreamAuth)?;
        let descriptor = self
            .avatar
            .create_session(&token, user_id)
            .await
            .map_err(SessionError::UpstreamCreate)?;
        if let Err(err) = self
            .avatar
            .start_session(&descriptor.session_id, &token)
            .await
        {
            self.stop_remote(&descriptor.session_id, &token).await;
            return Err(SessionError::UpstreamStart(err));
        }

        let record = SessionRecord {
            user_id: user_id.to_string(),
            session_id: descriptor.session_id,
            token,
            url: descriptor.url,
            access_token: descriptor.access_token,
            started_at: self.clock.now_epoch_seconds(),
        };
        let created = CreatedSession {
            session_id: record.session_id.clone(),
            token: record.token.clone(),
            url: record.url.clone(),
            access_token: record.access_token.clone(),
        };

        // Last writer wins; the replaced upstream session is stopped so it is not orphaned.
        if let Some(replaced) = self.store.insert(record).await
            && replaced.session_id != created.session_id
        {
            info!(
                user_id,
                session_id = %replaced.session_id,
                "replacing existing session"
            );
            self.stop_remote(&replaced.session_id, &replaced.token).await;
        }

        info!(user_id, session_id = %created.session_id, "session registered");
        Ok(created)
    }

    /// Forwards a prompt to the caller's registered session.
    ///
    /// The caller must present the session token issued at create time.
    pub async fn send_message(&self, request: SendMessage) -> Result<Value, SessionError> {
        if request.text.trim().is_empty() {
            return Err(SessionError::Validation("text is required"));
        }
        let Some(token) = non_blank(request.token.as_deref()) else {
            return Err(SessionError::Validation("token is required"));
        };

        let record = self
            .resolve(request.user_id.as_deref(), request.session_id.as_deref())
            .await?
            .ok_or(SessionError::NoActiveSession)?;

        // Caller-supplied identifiers must agree with the registry.
        if let Some(session_id) = non_blank(request.session_id.as_deref())
            && session_id != record.session_id
        {
            return Err(SessionError::NoActiveSession);
        }
        if token != record.token {
            return Err(SessionError::NoActiveSession);
        }

        self.avatar
            .send_task(
                &record.session_id,
                &record.token,
                &request.text,
                request.task_type,
            )
            .await
            .map_err(SessionError::UpstreamTask)
    }

    /// Stops the session upstream (best-effort) and clears the local record.
    pub async fn close_session(&self, request: CloseSession) -> CloseOutcome {
        let caller_session = non_blank(request.session_id.as_deref());
        let record = self
            .resolve(request.user_id.as_deref(), caller_session)
            .await
            .ok()
            .flatten()
            // A stale close must not remove a newer session for the same user.
            .filter(|record| caller_session.is_none_or(|id| id == record.session_id));

        match record {
            Some(record) => CloseOutcome {
                removed: self.teardown(&record).await,
            },
            None => {
                if let (Some(session_id), Some(token)) =
                    (caller_session, non_blank(request.token.as_deref()))
                {
                    self.stop_remote(session_id, token).await;
                }
                CloseOutcome { removed: false }
            }
        }
    }

    /// Closes every session older than the retention threshold.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now_epoch_seconds();
        let expired = self
            .store
            .older_than(now, self.retention.as_secs())
            .await;

        let mut closed = 0;
        for record in expired {
            info!(
                user_id = %record.user_id,
                session_id = %record.session_id,
                age_seconds = record.age_seconds(now),
                "closing expired session"
            );
            if self.teardown(&record).await {
                closed += 1;
            }
        }
        closed
    }

    pub async fn active_sessions(&self) -> usize {
        self.store.len().await
    }

    // Two phases: remote stop may fail, local removal always happens.
    async fn teardown(&self, record: &SessionRecord) -> bool {
        self.stop_remote(&record.session_id, &record.token).await;
        self.store
            .remove(&record.user_id, Some(&record.session_id))
            .await
            .is_some()
    }

    async fn stop_remote(&self, session_id: &str, token: &str) -> bool {
        match self.avatar.stop_session(session_id, token).await {
            Ok(()) => true,
            Err(err) => {
                warn!(session_id, error = %err, "failed to stop upstream session");
                false
            }
        }
    }

    async fn resolve(
        &self,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Option<SessionRecord>, SessionError> {
        match (non_blank(user_id), non_blank(session_id)) {
            (Some(user_id), _) => Ok(self.store.get(user_id).await),
            (None, Some(session_id)) => Ok(self.store.find_by_session_id(session_id).await),
            (None, None) => Err(SessionError::Validation("userId or sessionId is required")),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
